use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use funds_types::models::{Deposit, DepositStatus, Transaction};

use crate::error::{FundsError, Result};
use crate::{Amount, interest, ledger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawKind {
    /// Take the accrued interest and restart the accrual clock.
    Interest,
    /// Take principal plus interest and close the deposit.
    Full,
}

impl WithdrawKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawKind::Interest => "interest",
            WithdrawKind::Full => "full",
        }
    }
}

impl fmt::Display for WithdrawKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WithdrawKind {
    type Err = FundsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "interest" => Ok(WithdrawKind::Interest),
            "full" => Ok(WithdrawKind::Full),
            other => Err(FundsError::InvalidWithdrawKind(other.to_string())),
        }
    }
}

/// Outcome of a withdrawal: what is paid out, the deposit's next state and
/// the ledger entry recording it. Nothing is persisted yet.
#[derive(Debug, Clone)]
pub struct Withdrawal {
    pub kind: WithdrawKind,
    pub amount: Amount,
    pub interest: Amount,
    pub description: String,
    pub deposit: Deposit,
    pub entry: Transaction,
}

/// Work out a withdrawal against an approved deposit.
///
/// Fails with `NotMature` before the maturity date, leaving the deposit
/// untouched.
pub fn process(
    deposit: &Deposit,
    kind: WithdrawKind,
    maturity_days: i64,
    now: DateTime<Utc>,
) -> Result<Withdrawal> {
    let approved_at = deposit
        .approved_at
        .filter(|_| deposit.status == DepositStatus::Approved)
        .ok_or(FundsError::NoActiveDeposit)?;

    if !interest::is_mature(Some(approved_at), maturity_days, now) {
        let days_left = interest::days_until_maturity(Some(approved_at), maturity_days, now)
            .unwrap_or(maturity_days);
        return Err(FundsError::NotMature { days_left });
    }

    let accrued =
        interest::accrued_interest(deposit.amount, deposit.interest_rate, approved_at, now)?;

    let (amount, balance_after, description, next) = match kind {
        WithdrawKind::Interest => (
            accrued,
            deposit.amount,
            format!("Interest withdrawal: ${:.2}", accrued),
            Deposit {
                approved_at: Some(now),
                maturity_date: Some(interest::maturity_date(now, maturity_days)),
                ..deposit.clone()
            },
        ),
        WithdrawKind::Full => (
            interest::checked_total(deposit.amount, accrued)?,
            Decimal::ZERO,
            format!(
                "Full withdrawal: Principal ${:.2} + Interest ${:.2}",
                deposit.amount, accrued
            ),
            Deposit {
                status: DepositStatus::Withdrawn,
                ..deposit.clone()
            },
        ),
    };

    let entry = ledger::withdrawal_entry(deposit, amount, balance_after, &description, now);

    Ok(Withdrawal {
        kind,
        amount,
        interest: accrued,
        description,
        deposit: next,
        entry,
    })
}
