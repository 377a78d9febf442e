use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::Result;
use uuid::Uuid;

use funds_types::models::{Deposit, DepositStatus, Transaction};

use crate::ledger;
use crate::store::Store;

/// A `Store` kept in process memory. A single lock makes every method atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    deposits: HashMap<Uuid, Deposit>,
    transactions: Vec<Transaction>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|e| anyhow::anyhow!("Store lock poisoned: {}", e))
    }

    fn find_user_deposit<F>(&self, user_id: Uuid, pred: F) -> Result<Option<Deposit>>
    where
        F: Fn(DepositStatus) -> bool,
    {
        let inner = self.lock()?;
        Ok(inner
            .deposits
            .values()
            .find(|d| d.user_id == user_id && pred(d.status))
            .cloned())
    }
}

impl Store for MemoryStore {
    fn insert_deposit(&self, deposit: &Deposit) -> Result<bool> {
        let mut inner = self.lock()?;
        let blocked = inner
            .deposits
            .values()
            .any(|d| d.user_id == deposit.user_id && d.status.is_active());
        if blocked {
            return Ok(false);
        }
        inner.deposits.insert(deposit.id, deposit.clone());
        Ok(true)
    }

    fn find_deposit(&self, id: Uuid) -> Result<Option<Deposit>> {
        Ok(self.lock()?.deposits.get(&id).cloned())
    }

    fn find_active_deposit(&self, user_id: Uuid) -> Result<Option<Deposit>> {
        self.find_user_deposit(user_id, |s| s.is_active())
    }

    fn find_approved_deposit(&self, user_id: Uuid) -> Result<Option<Deposit>> {
        self.find_user_deposit(user_id, |s| s == DepositStatus::Approved)
    }

    fn list_deposits(&self, status: Option<DepositStatus>) -> Result<Vec<Deposit>> {
        let inner = self.lock()?;
        let mut deposits: Vec<Deposit> = inner
            .deposits
            .values()
            .filter(|d| status.is_none_or(|s| d.status == s))
            .cloned()
            .collect();
        deposits.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(deposits)
    }

    fn commit_transition(
        &self,
        expected: &Deposit,
        next: &Deposit,
        entry: Option<&Transaction>,
    ) -> Result<bool> {
        let mut inner = self.lock()?;
        let Some(stored) = inner.deposits.get_mut(&expected.id) else {
            return Ok(false);
        };
        if stored.status != expected.status || stored.approved_at != expected.approved_at {
            return Ok(false);
        }
        *stored = next.clone();
        if let Some(entry) = entry {
            inner.transactions.push(entry.clone());
        }
        Ok(true)
    }

    fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>> {
        let inner = self.lock()?;
        let mut entries: Vec<Transaction> = inner
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        ledger::newest_first(&mut entries);
        Ok(entries)
    }
}
