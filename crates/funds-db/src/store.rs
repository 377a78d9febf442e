use anyhow::Result;
use uuid::Uuid;

use funds_core::Store;
use funds_types::models::{Deposit, DepositStatus, Transaction};

use crate::Database;
use crate::models::fmt_ts;
use crate::queries::{
    DEPOSIT_COLUMNS, insert_transaction, query_deposit, query_deposits, query_transactions,
};

impl Store for Database {
    fn insert_deposit(&self, deposit: &Deposit) -> Result<bool> {
        self.with_conn(|conn| {
            // Guard and insert in one statement so the check cannot go stale.
            // idx_deposits_one_active backs this up at the schema level.
            let inserted = conn.execute(
                &format!(
                    "INSERT INTO deposits ({})
                     SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11
                     WHERE NOT EXISTS (
                         SELECT 1 FROM deposits
                         WHERE user_id = ?2 AND status IN ('pending', 'approved')
                     )",
                    DEPOSIT_COLUMNS
                ),
                rusqlite::params![
                    deposit.id.to_string(),
                    deposit.user_id.to_string(),
                    deposit.amount.to_string(),
                    deposit.proof_url,
                    deposit.status.as_str(),
                    fmt_ts(&deposit.submitted_at),
                    deposit.approved_at.as_ref().map(fmt_ts),
                    deposit.approved_by.map(|id| id.to_string()),
                    deposit.maturity_date.as_ref().map(fmt_ts),
                    deposit.interest_rate.to_string(),
                    deposit.current_balance.to_string(),
                ],
            )?;
            Ok(inserted == 1)
        })
    }

    fn find_deposit(&self, id: Uuid) -> Result<Option<Deposit>> {
        self.with_conn(|conn| query_deposit(conn, "id = ?1", &id.to_string()))
    }

    fn find_active_deposit(&self, user_id: Uuid) -> Result<Option<Deposit>> {
        self.with_conn(|conn| {
            query_deposit(
                conn,
                "user_id = ?1 AND status IN ('pending', 'approved')",
                &user_id.to_string(),
            )
        })
    }

    fn find_approved_deposit(&self, user_id: Uuid) -> Result<Option<Deposit>> {
        self.with_conn(|conn| {
            query_deposit(conn, "user_id = ?1 AND status = 'approved'", &user_id.to_string())
        })
    }

    fn list_deposits(&self, status: Option<DepositStatus>) -> Result<Vec<Deposit>> {
        self.with_conn(|conn| query_deposits(conn, status.as_ref().map(DepositStatus::as_str)))
    }

    fn commit_transition(
        &self,
        expected: &Deposit,
        next: &Deposit,
        entry: Option<&Transaction>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let updated = tx.execute(
                "UPDATE deposits
                 SET status = ?1, approved_at = ?2, approved_by = ?3,
                     maturity_date = ?4, current_balance = ?5
                 WHERE id = ?6 AND status = ?7 AND approved_at IS ?8",
                rusqlite::params![
                    next.status.as_str(),
                    next.approved_at.as_ref().map(fmt_ts),
                    next.approved_by.map(|id| id.to_string()),
                    next.maturity_date.as_ref().map(fmt_ts),
                    next.current_balance.to_string(),
                    expected.id.to_string(),
                    expected.status.as_str(),
                    expected.approved_at.as_ref().map(fmt_ts),
                ],
            )?;

            // Dropping `tx` without committing rolls back.
            if updated == 0 {
                return Ok(false);
            }

            if let Some(entry) = entry {
                insert_transaction(&tx, entry)?;
            }

            tx.commit()?;
            Ok(true)
        })
    }

    fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>> {
        self.with_conn(|conn| query_transactions(conn, &user_id.to_string()))
    }
}
