use anyhow::Result;
use uuid::Uuid;

use funds_types::models::{Deposit, DepositStatus, Transaction};

/// Persistence seam for deposits and the ledger.
///
/// Every write is conditional so that two requests racing on the same
/// deposit cannot both succeed. A `false` return means the condition did not
/// hold and nothing was written.
pub trait Store: Send + Sync {
    /// Insert `deposit` unless its user already has a pending or approved one.
    fn insert_deposit(&self, deposit: &Deposit) -> Result<bool>;

    fn find_deposit(&self, id: Uuid) -> Result<Option<Deposit>>;

    /// The user's pending or approved deposit, if any.
    fn find_active_deposit(&self, user_id: Uuid) -> Result<Option<Deposit>>;

    fn find_approved_deposit(&self, user_id: Uuid) -> Result<Option<Deposit>>;

    /// Deposits newest submission first, optionally restricted to one status.
    fn list_deposits(&self, status: Option<DepositStatus>) -> Result<Vec<Deposit>>;

    /// Replace `expected` with `next` and append `entry`, as one atomic unit.
    ///
    /// The write only happens if the stored record still has `expected`'s
    /// status and approval time.
    fn commit_transition(
        &self,
        expected: &Deposit,
        next: &Deposit,
        entry: Option<&Transaction>,
    ) -> Result<bool>;

    /// The user's ledger, newest first.
    fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>>;
}
