use crate::Database;
use crate::models::{DepositRow, TransactionRow, UserRow, fmt_ts};
use anyhow::Result;
use funds_types::models::{Deposit, Role, Transaction, User};
use rusqlite::{Connection, Row};

const USER_COLUMNS: &str = "id, username, email, password, role, created_at, is_active";

pub(crate) const DEPOSIT_COLUMNS: &str = "id, user_id, amount, proof_url, status, submitted_at, \
     approved_at, approved_by, maturity_date, interest_rate, current_balance";

const TRANSACTION_COLUMNS: &str =
    "id, user_id, deposit_id, kind, amount, balance_after, timestamp, description";

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &User, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, role, created_at, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    user.id.to_string(),
                    user.username,
                    user.email,
                    password_hash,
                    user.role.as_str(),
                    fmt_ts(&user.created_at),
                    user.is_active,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn list_users(&self, role: Role) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM users WHERE role = ?1 ORDER BY created_at",
                USER_COLUMNS
            ))?;

            let rows = stmt
                .query_map([role.as_str()], user_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter().map(User::try_from).collect()
        })
    }
}

// -- Row mapping --

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users WHERE {} = ?1",
        USER_COLUMNS, column
    ))?;

    let row = stmt.query_row([value], user_row).optional()?;
    Ok(row)
}

fn user_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        role: row.get(4)?,
        created_at: row.get(5)?,
        is_active: row.get(6)?,
    })
}

fn deposit_row(row: &Row<'_>) -> rusqlite::Result<DepositRow> {
    Ok(DepositRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        amount: row.get(2)?,
        proof_url: row.get(3)?,
        status: row.get(4)?,
        submitted_at: row.get(5)?,
        approved_at: row.get(6)?,
        approved_by: row.get(7)?,
        maturity_date: row.get(8)?,
        interest_rate: row.get(9)?,
        current_balance: row.get(10)?,
    })
}

fn transaction_row(row: &Row<'_>) -> rusqlite::Result<TransactionRow> {
    Ok(TransactionRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        deposit_id: row.get(2)?,
        kind: row.get(3)?,
        amount: row.get(4)?,
        balance_after: row.get(5)?,
        timestamp: row.get(6)?,
        description: row.get(7)?,
    })
}

// -- Deposits --

/// Fetch at most one deposit matching `clause` (a WHERE fragment using ?1).
pub(crate) fn query_deposit(
    conn: &Connection,
    clause: &str,
    param: &str,
) -> Result<Option<Deposit>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM deposits WHERE {}",
        DEPOSIT_COLUMNS, clause
    ))?;

    stmt.query_row([param], deposit_row)
        .optional()?
        .map(Deposit::try_from)
        .transpose()
}

pub(crate) fn query_deposits(conn: &Connection, status: Option<&str>) -> Result<Vec<Deposit>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM deposits
         WHERE ?1 IS NULL OR status = ?1
         ORDER BY submitted_at DESC",
        DEPOSIT_COLUMNS
    ))?;

    let rows = stmt
        .query_map([status], deposit_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(Deposit::try_from).collect()
}

// -- Ledger --

pub(crate) fn insert_transaction(conn: &Connection, tx: &Transaction) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO transactions ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            TRANSACTION_COLUMNS
        ),
        rusqlite::params![
            tx.id.to_string(),
            tx.user_id.to_string(),
            tx.deposit_id.map(|id| id.to_string()),
            tx.kind.as_str(),
            tx.amount.to_string(),
            tx.balance_after.to_string(),
            fmt_ts(&tx.timestamp),
            tx.description,
        ],
    )?;
    Ok(())
}

pub(crate) fn query_transactions(conn: &Connection, user_id: &str) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM transactions
         WHERE user_id = ?1
         ORDER BY timestamp DESC, rowid DESC",
        TRANSACTION_COLUMNS
    ))?;

    let rows = stmt
        .query_map([user_id], transaction_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(Transaction::try_from).collect()
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
