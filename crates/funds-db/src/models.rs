//! Database row types, mapped directly from SQLite rows.
//! Distinct from funds-types models to keep the DB layer independent.
//!
//! Amounts are stored as decimal strings and timestamps as RFC 3339 with a
//! fixed nanosecond width, so string order is time order.

use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use funds_types::models::{Deposit, Transaction, User};

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub created_at: String,
    pub is_active: bool,
}

pub struct DepositRow {
    pub id: String,
    pub user_id: String,
    pub amount: String,
    pub proof_url: String,
    pub status: String,
    pub submitted_at: String,
    pub approved_at: Option<String>,
    pub approved_by: Option<String>,
    pub maturity_date: Option<String>,
    pub interest_rate: String,
    pub current_balance: String,
}

pub struct TransactionRow {
    pub id: String,
    pub user_id: String,
    pub deposit_id: Option<String>,
    pub kind: String,
    pub amount: String,
    pub balance_after: String,
    pub timestamp: String,
    pub description: String,
}

pub fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Corrupt timestamp '{}'", s))?
        .with_timezone(&Utc))
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    s.parse().with_context(|| format!("Corrupt id '{}'", s))
}

fn parse_amount(s: &str) -> Result<Decimal> {
    Decimal::from_str(s).with_context(|| format!("Corrupt amount '{}'", s))
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: parse_uuid(&row.id)?,
            username: row.username,
            email: row.email,
            role: row.role.parse()?,
            created_at: parse_ts(&row.created_at)?,
            is_active: row.is_active,
        })
    }
}

impl TryFrom<DepositRow> for Deposit {
    type Error = anyhow::Error;

    fn try_from(row: DepositRow) -> Result<Self> {
        Ok(Deposit {
            id: parse_uuid(&row.id)?,
            user_id: parse_uuid(&row.user_id)?,
            amount: parse_amount(&row.amount)?,
            proof_url: row.proof_url,
            status: row.status.parse()?,
            submitted_at: parse_ts(&row.submitted_at)?,
            approved_at: row.approved_at.as_deref().map(parse_ts).transpose()?,
            approved_by: row.approved_by.as_deref().map(parse_uuid).transpose()?,
            maturity_date: row.maturity_date.as_deref().map(parse_ts).transpose()?,
            interest_rate: parse_amount(&row.interest_rate)?,
            current_balance: parse_amount(&row.current_balance)?,
        })
    }
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = anyhow::Error;

    fn try_from(row: TransactionRow) -> Result<Self> {
        Ok(Transaction {
            id: parse_uuid(&row.id)?,
            user_id: parse_uuid(&row.user_id)?,
            deposit_id: row.deposit_id.as_deref().map(parse_uuid).transpose()?,
            kind: row.kind.parse()?,
            amount: parse_amount(&row.amount)?,
            balance_after: parse_amount(&row.balance_after)?,
            timestamp: parse_ts(&row.timestamp)?,
            description: row.description,
        })
    }
}
