use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use funds_types::models::{Balance, Deposit, DepositStatus, DepositView, Transaction};

use crate::clock::Clock;
use crate::error::{FundsError, Result};
use crate::store::Store;
use crate::withdrawal::{self, WithdrawKind, Withdrawal};
use crate::{Amount, interest, lifecycle};

/// Terms applied to new deposits and to maturity checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Terms {
    pub monthly_rate: Decimal,
    pub maturity_days: i64,
}

impl Default for Terms {
    fn default() -> Self {
        Self {
            monthly_rate: interest::DEFAULT_MONTHLY_RATE,
            maturity_days: interest::MATURITY_DAYS,
        }
    }
}

/// The operations exposed to the HTTP layer.
///
/// Reads recompute interest and maturity from the clock; writes go through
/// the store's conditional updates.
#[derive(Clone)]
pub struct FundsService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    terms: Terms,
}

impl FundsService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            terms: Terms::default(),
        }
    }

    pub fn with_terms(mut self, terms: Terms) -> Self {
        self.terms = terms;
        self
    }

    pub fn terms(&self) -> Terms {
        self.terms
    }

    /// Derived read model for a deposit as of now.
    pub fn view(&self, deposit: &Deposit) -> Result<DepositView> {
        interest::view(deposit, self.terms.maturity_days, self.clock.now())
    }

    // -- User operations --

    pub fn submit_deposit(
        &self,
        user_id: Uuid,
        amount: Amount,
        proof_url: &str,
    ) -> Result<Deposit> {
        let deposit = lifecycle::submit(
            user_id,
            amount,
            proof_url,
            self.terms.monthly_rate,
            self.clock.now(),
        )?;

        if !self.store.insert_deposit(&deposit)? {
            warn!("User {} already has an active deposit", user_id);
            return Err(FundsError::ActiveDepositExists(user_id));
        }

        info!("Deposit {} submitted by {} for {}", deposit.id, user_id, deposit.amount);
        Ok(deposit)
    }

    pub fn current_deposit(&self, user_id: Uuid) -> Result<Option<DepositView>> {
        let now = self.clock.now();
        self.store
            .find_active_deposit(user_id)?
            .map(|d| interest::view(&d, self.terms.maturity_days, now))
            .transpose()
    }

    pub fn balance(&self, user_id: Uuid) -> Result<Balance> {
        let deposit = self.store.find_approved_deposit(user_id)?;
        interest::balance(deposit.as_ref(), self.clock.now())
    }

    pub fn withdraw(&self, user_id: Uuid, kind: WithdrawKind) -> Result<Withdrawal> {
        let deposit = self
            .store
            .find_approved_deposit(user_id)?
            .ok_or(FundsError::NoActiveDeposit)?;

        let withdrawal =
            withdrawal::process(&deposit, kind, self.terms.maturity_days, self.clock.now())?;

        if !self
            .store
            .commit_transition(&deposit, &withdrawal.deposit, Some(&withdrawal.entry))?
        {
            warn!("Lost race withdrawing from deposit {}", deposit.id);
            return Err(FundsError::ConcurrentUpdate(deposit.id));
        }

        info!(
            "Deposit {}: {} withdrawal of {} by {}",
            deposit.id, kind, withdrawal.amount, user_id
        );
        Ok(withdrawal)
    }

    pub fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>> {
        Ok(self.store.list_transactions(user_id)?)
    }

    // -- Admin operations --

    pub fn approve_deposit(
        &self,
        deposit_id: Uuid,
        admin_id: Uuid,
    ) -> Result<(Deposit, DateTime<Utc>)> {
        let current = self.load(deposit_id)?;
        let now = self.clock.now();
        let (next, entry) = lifecycle::approve(&current, admin_id, self.terms.maturity_days, now)?;

        self.commit_review(&current, &next, Some(&entry))?;

        let maturity = interest::maturity_date(now, self.terms.maturity_days);
        info!("Deposit {} approved by {}, matures {}", deposit_id, admin_id, maturity);
        Ok((next, maturity))
    }

    pub fn reject_deposit(&self, deposit_id: Uuid, admin_id: Uuid) -> Result<Deposit> {
        let current = self.load(deposit_id)?;
        let next = lifecycle::reject(&current, admin_id)?;

        self.commit_review(&current, &next, None)?;

        info!("Deposit {} rejected by {}", deposit_id, admin_id);
        Ok(next)
    }

    pub fn list_pending_deposits(&self) -> Result<Vec<DepositView>> {
        self.list_views(Some(DepositStatus::Pending))
    }

    pub fn list_all_deposits(&self) -> Result<Vec<DepositView>> {
        self.list_views(None)
    }

    // -- Helpers --

    fn load(&self, deposit_id: Uuid) -> Result<Deposit> {
        self.store
            .find_deposit(deposit_id)?
            .ok_or(FundsError::DepositNotFound(deposit_id))
    }

    fn list_views(&self, status: Option<DepositStatus>) -> Result<Vec<DepositView>> {
        let now = self.clock.now();
        self.store
            .list_deposits(status)?
            .iter()
            .map(|d| interest::view(d, self.terms.maturity_days, now))
            .collect()
    }

    /// Commit an approve/reject. When another reviewer got there first the
    /// caller sees the same error a serial run would have produced.
    fn commit_review(
        &self,
        current: &Deposit,
        next: &Deposit,
        entry: Option<&Transaction>,
    ) -> Result<()> {
        if self.store.commit_transition(current, next, entry)? {
            return Ok(());
        }

        let latest = self.load(current.id)?;
        warn!("Deposit {} changed to {} during review", latest.id, latest.status);
        if latest.status == DepositStatus::Pending {
            return Err(FundsError::ConcurrentUpdate(latest.id));
        }
        Err(FundsError::NotPending {
            id: latest.id,
            status: latest.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use funds_types::models::TransactionKind;
    use rust_decimal_macros::dec;

    use crate::clock::FixedClock;
    use crate::memory::MemoryStore;

    fn service() -> (FundsService, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let svc = FundsService::new(Arc::new(MemoryStore::new()), clock.clone());
        (svc, clock)
    }

    #[test]
    fn terms_override_rate_of_new_deposits() {
        let (svc, _) = service();
        let svc = svc.with_terms(Terms {
            monthly_rate: dec!(0.05),
            maturity_days: 30,
        });
        let d = svc.submit_deposit(Uuid::new_v4(), dec!(100), "p").unwrap();
        assert_eq!(d.interest_rate, dec!(0.05));
        assert_eq!(svc.terms().maturity_days, 30);
    }

    #[test]
    fn approve_appends_deposit_entry() {
        let (svc, clock) = service();
        let user = Uuid::new_v4();
        let d = svc.submit_deposit(user, dec!(1000), "proof").unwrap();

        let (approved, maturity) = svc.approve_deposit(d.id, Uuid::new_v4()).unwrap();
        assert_eq!(approved.status, DepositStatus::Approved);
        assert_eq!(maturity, clock.now() + Duration::days(90));

        let ledger = svc.list_transactions(user).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].kind, TransactionKind::Deposit);
        assert_eq!(ledger[0].amount, dec!(1000));
    }

    #[test]
    fn unknown_deposit_is_not_found() {
        let (svc, _) = service();
        let id = Uuid::new_v4();
        assert!(matches!(
            svc.approve_deposit(id, Uuid::new_v4()),
            Err(FundsError::DepositNotFound(missing)) if missing == id
        ));
        assert!(matches!(
            svc.reject_deposit(id, Uuid::new_v4()),
            Err(FundsError::DepositNotFound(_))
        ));
    }

    #[test]
    fn balance_is_empty_until_approval() {
        let (svc, clock) = service();
        let user = Uuid::new_v4();
        let d = svc.submit_deposit(user, dec!(600), "p").unwrap();
        assert_eq!(svc.balance(user).unwrap(), Balance::empty());

        svc.approve_deposit(d.id, Uuid::new_v4()).unwrap();
        clock.advance(Duration::days(15));
        let b = svc.balance(user).unwrap();
        assert_eq!(b.principal, dec!(600));
        assert_eq!(b.accrued_interest, dec!(12));
        assert_eq!(b.total_balance, dec!(612));
        assert!(b.has_active_deposit);
    }
}
