//! Deposit state machine.
//!
//! ```text
//! submit -> pending --approve--> approved --withdraw(full)--> withdrawn
//!              |                    ^  |
//!              +--reject--> rejected   +--withdraw(interest)--+
//! ```
//!
//! Each transition is a pure function from the current record to the next
//! one. Persisting the result (and racing other writers) is the store's job.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use funds_types::models::{Deposit, DepositStatus, Transaction};

use crate::error::{FundsError, Result};
use crate::{Amount, interest, ledger};

/// Build a new pending deposit. The one-active-deposit rule is enforced by
/// the store when the record is inserted.
pub fn submit(
    user_id: Uuid,
    amount: Amount,
    proof_url: &str,
    monthly_rate: Decimal,
    now: DateTime<Utc>,
) -> Result<Deposit> {
    if amount <= Decimal::ZERO || amount > interest::MAX_PRINCIPAL {
        return Err(FundsError::InvalidAmount(amount));
    }

    Ok(Deposit {
        id: Uuid::new_v4(),
        user_id,
        amount,
        proof_url: proof_url.to_string(),
        status: DepositStatus::Pending,
        submitted_at: now,
        approved_at: None,
        approved_by: None,
        maturity_date: None,
        interest_rate: monthly_rate,
        current_balance: Decimal::ZERO,
    })
}

/// Approve a pending deposit, starting its accrual clock and maturity window.
pub fn approve(
    deposit: &Deposit,
    admin_id: Uuid,
    maturity_days: i64,
    now: DateTime<Utc>,
) -> Result<(Deposit, Transaction)> {
    ensure_pending(deposit)?;

    let next = Deposit {
        status: DepositStatus::Approved,
        approved_at: Some(now),
        approved_by: Some(admin_id),
        maturity_date: Some(interest::maturity_date(now, maturity_days)),
        current_balance: deposit.amount,
        ..deposit.clone()
    };
    let entry = ledger::approval_entry(&next, now);

    Ok((next, entry))
}

pub fn reject(deposit: &Deposit, admin_id: Uuid) -> Result<Deposit> {
    ensure_pending(deposit)?;

    Ok(Deposit {
        status: DepositStatus::Rejected,
        approved_by: Some(admin_id),
        ..deposit.clone()
    })
}

fn ensure_pending(deposit: &Deposit) -> Result<()> {
    if deposit.status != DepositStatus::Pending {
        return Err(FundsError::NotPending {
            id: deposit.id,
            status: deposit.status,
        });
    }
    Ok(())
}
