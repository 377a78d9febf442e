use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
#[error("unknown {kind}: '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

// -- Users --

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => Err(ParseEnumError { kind: "role", value: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

// -- Deposits --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositStatus {
    Pending,
    Approved,
    Rejected,
    Withdrawn,
}

impl DepositStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepositStatus::Pending => "pending",
            DepositStatus::Approved => "approved",
            DepositStatus::Rejected => "rejected",
            DepositStatus::Withdrawn => "withdrawn",
        }
    }

    /// Pending and approved deposits count against the one-per-user limit.
    pub fn is_active(&self) -> bool {
        matches!(self, DepositStatus::Pending | DepositStatus::Approved)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DepositStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DepositStatus::Pending),
            "approved" => Ok(DepositStatus::Approved),
            "rejected" => Ok(DepositStatus::Rejected),
            "withdrawn" => Ok(DepositStatus::Withdrawn),
            _ => Err(ParseEnumError { kind: "deposit status", value: s.to_string() }),
        }
    }
}

/// A deposit as persisted.
///
/// `current_balance` is an audit snapshot written at submission (zero) and at
/// approval (the principal). It is never updated as interest accrues; read
/// paths recompute balances from `amount`, `interest_rate` and `approved_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deposit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub proof_url: String,
    pub status: DepositStatus,
    pub submitted_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub maturity_date: Option<DateTime<Utc>>,
    pub interest_rate: Decimal,
    pub current_balance: Decimal,
}

/// A deposit with its derived figures computed at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub proof_url: String,
    pub status: DepositStatus,
    pub submitted_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub maturity_date: Option<DateTime<Utc>>,
    pub current_balance: Decimal,
    pub days_remaining: Option<i64>,
    pub is_mature: bool,
    pub accrued_interest: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub principal: Decimal,
    pub accrued_interest: Decimal,
    pub total_balance: Decimal,
    pub has_active_deposit: bool,
}

impl Balance {
    pub fn empty() -> Self {
        Self {
            principal: Decimal::ZERO,
            accrued_interest: Decimal::ZERO,
            total_balance: Decimal::ZERO,
            has_active_deposit: false,
        }
    }
}

// -- Ledger --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    /// Reserved. No current flow produces it: interest is derived on read.
    InterestAccrual,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::InterestAccrual => "interest_accrual",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionKind::Deposit),
            "withdrawal" => Ok(TransactionKind::Withdrawal),
            "interest_accrual" => Ok(TransactionKind::InterestAccrual),
            _ => Err(ParseEnumError { kind: "transaction type", value: s.to_string() }),
        }
    }
}

/// A ledger entry. Written once, never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub deposit_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}
