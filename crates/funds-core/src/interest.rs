//! Simple monthly interest and maturity arithmetic.
//!
//! A "month" is a fixed 30 days and elapsed time is counted in whole days.
//! Every currency result is rounded to cents with ties going to the even
//! neighbour (banker's rounding).

use chrono::{DateTime, Duration, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use funds_types::models::{Balance, Deposit, DepositStatus, DepositView};

use crate::Amount;
use crate::error::{FundsError, Result};

pub const MATURITY_DAYS: i64 = 90;
pub const DAYS_PER_MONTH: i64 = 30;
pub const DEFAULT_MONTHLY_RATE: Decimal = dec!(0.04);
pub const CURRENCY_DP: u32 = 2;
/// Largest principal a deposit may be submitted with.
pub const MAX_PRINCIPAL: Decimal = dec!(1000000000000);

pub fn round_currency(amount: Amount) -> Amount {
    amount.round_dp_with_strategy(CURRENCY_DP, RoundingStrategy::MidpointNearestEven)
}

/// Whole days from `start` to `now`, floored. A clock reading earlier than
/// `start` counts as zero days, so interest never goes negative.
pub fn elapsed_days(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - start).num_days().max(0)
}

/// Fails with `Overflow` instead of panicking when the product does not fit.
pub fn accrued_interest(
    principal: Amount,
    monthly_rate: Decimal,
    start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Amount> {
    let days = Decimal::from(elapsed_days(start, now));
    // Divide last so that whole-month spans stay exact.
    let interest = principal
        .checked_mul(monthly_rate)
        .and_then(|v| v.checked_mul(days))
        .and_then(|v| v.checked_div(Decimal::from(DAYS_PER_MONTH)))
        .ok_or(FundsError::Overflow)?;
    Ok(round_currency(interest))
}

pub fn current_balance(
    principal: Amount,
    monthly_rate: Decimal,
    start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Amount> {
    let accrued = accrued_interest(principal, monthly_rate, start, now)?;
    checked_total(principal, accrued)
}

/// Principal plus interest, rounded to cents.
pub fn checked_total(principal: Amount, accrued: Amount) -> Result<Amount> {
    principal
        .checked_add(accrued)
        .map(round_currency)
        .ok_or(FundsError::Overflow)
}

pub fn maturity_date(approved_at: DateTime<Utc>, maturity_days: i64) -> DateTime<Utc> {
    approved_at + Duration::days(maturity_days)
}

/// False for a deposit that was never approved.
pub fn is_mature(
    approved_at: Option<DateTime<Utc>>,
    maturity_days: i64,
    now: DateTime<Utc>,
) -> bool {
    approved_at.is_some_and(|at| now >= maturity_date(at, maturity_days))
}

/// Whole days left before maturity, floored and never negative.
/// `None` for a deposit that was never approved.
pub fn days_until_maturity(
    approved_at: Option<DateTime<Utc>>,
    maturity_days: i64,
    now: DateTime<Utc>,
) -> Option<i64> {
    approved_at.map(|at| (maturity_date(at, maturity_days) - now).num_days().max(0))
}

/// Recompute a deposit's derived figures as of `now`.
///
/// Only approved deposits accrue. Anything else reports its principal as the
/// balance, no interest and no maturity countdown.
pub fn view(deposit: &Deposit, maturity_days: i64, now: DateTime<Utc>) -> Result<DepositView> {
    let (accrued, balance, mature, days_remaining) = match (deposit.status, deposit.approved_at) {
        (DepositStatus::Approved, Some(approved_at)) => {
            let accrued =
                accrued_interest(deposit.amount, deposit.interest_rate, approved_at, now)?;
            (
                accrued,
                checked_total(deposit.amount, accrued)?,
                is_mature(Some(approved_at), maturity_days, now),
                days_until_maturity(Some(approved_at), maturity_days, now),
            )
        }
        _ => (Decimal::ZERO, deposit.amount, false, None),
    };

    Ok(DepositView {
        id: deposit.id,
        user_id: deposit.user_id,
        amount: deposit.amount,
        proof_url: deposit.proof_url.clone(),
        status: deposit.status,
        submitted_at: deposit.submitted_at,
        approved_at: deposit.approved_at,
        maturity_date: deposit.maturity_date,
        current_balance: balance,
        days_remaining,
        is_mature: mature,
        accrued_interest: accrued,
    })
}

/// Balance summary over a user's approved deposit, if any.
pub fn balance(deposit: Option<&Deposit>, now: DateTime<Utc>) -> Result<Balance> {
    let Some((deposit, approved_at)) = deposit
        .filter(|d| d.status == DepositStatus::Approved)
        .and_then(|d| d.approved_at.map(|at| (d, at)))
    else {
        return Ok(Balance::empty());
    };

    let accrued = accrued_interest(deposit.amount, deposit.interest_rate, approved_at, now)?;
    Ok(Balance {
        principal: deposit.amount,
        accrued_interest: accrued,
        total_balance: checked_total(deposit.amount, accrued)?,
        has_active_deposit: true,
    })
}
