use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use funds_types::models::DepositStatus;

pub type Result<T> = std::result::Result<T, FundsError>;

#[derive(Debug, Error)]
pub enum FundsError {
    #[error("You already have an active deposit. Only one deposit is allowed at a time.")]
    ActiveDepositExists(Uuid),

    #[error("Deposit not found: {0}")]
    DepositNotFound(Uuid),

    #[error("No active deposit found")]
    NoActiveDeposit,

    #[error("Deposit {id} is {status}, not pending")]
    NotPending { id: Uuid, status: DepositStatus },

    #[error("Withdrawal not available yet. {days_left} days remaining until maturity.")]
    NotMature { days_left: i64 },

    #[error("Invalid withdrawal type '{0}'. Use 'interest' or 'full'.")]
    InvalidWithdrawKind(String),

    #[error("Deposit amount {0} is out of range")]
    InvalidAmount(Decimal),

    #[error("Amount out of range")]
    Overflow,

    #[error("Deposit {0} was modified by another request")]
    ConcurrentUpdate(Uuid),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Coarse classification callers map onto their own error surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Conflict,
    NotFound,
    InvalidState,
    NotMature,
    InvalidArgument,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::NotMature => "not_mature",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::Internal => "internal",
        }
    }
}

impl FundsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FundsError::ActiveDepositExists(_) | FundsError::ConcurrentUpdate(_) => {
                ErrorKind::Conflict
            }
            FundsError::DepositNotFound(_) | FundsError::NoActiveDeposit => ErrorKind::NotFound,
            FundsError::NotPending { .. } => ErrorKind::InvalidState,
            FundsError::NotMature { .. } => ErrorKind::NotMature,
            FundsError::InvalidWithdrawKind(_) | FundsError::InvalidAmount(_) => {
                ErrorKind::InvalidArgument
            }
            FundsError::Overflow | FundsError::Store(_) => ErrorKind::Internal,
        }
    }

    /// Days left until maturity, for errors that carry it.
    pub fn days_left(&self) -> Option<i64> {
        match self {
            FundsError::NotMature { days_left } => Some(*days_left),
            _ => None,
        }
    }
}
