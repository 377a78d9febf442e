//! Ledger entries for balance-affecting events.
//!
//! Entries are only ever built here, by approval and by withdrawal, and are
//! persisted together with the deposit transition that produced them.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use funds_types::models::{Deposit, Transaction, TransactionKind};

use crate::Amount;

pub fn approval_entry(deposit: &Deposit, at: DateTime<Utc>) -> Transaction {
    Transaction {
        id: Uuid::new_v4(),
        user_id: deposit.user_id,
        deposit_id: Some(deposit.id),
        kind: TransactionKind::Deposit,
        amount: deposit.amount,
        balance_after: deposit.amount,
        timestamp: at,
        description: format!("Deposit approved - Principal: ${:.2}", deposit.amount),
    }
}

pub fn withdrawal_entry(
    deposit: &Deposit,
    amount: Amount,
    balance_after: Amount,
    description: &str,
    at: DateTime<Utc>,
) -> Transaction {
    Transaction {
        id: Uuid::new_v4(),
        user_id: deposit.user_id,
        deposit_id: Some(deposit.id),
        kind: TransactionKind::Withdrawal,
        amount,
        balance_after,
        timestamp: at,
        description: description.to_string(),
    }
}

/// Sort entries so the most recent comes first. `entries` must be in
/// insertion order; entries sharing a timestamp come out last-inserted first.
pub fn newest_first(entries: &mut [Transaction]) {
    entries.reverse();
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use funds_types::models::DepositStatus;
    use rust_decimal_macros::dec;

    fn deposit() -> Deposit {
        let now = Utc::now();
        Deposit {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            amount: dec!(1500),
            proof_url: "proof.png".into(),
            status: DepositStatus::Approved,
            submitted_at: now,
            approved_at: Some(now),
            approved_by: None,
            maturity_date: None,
            interest_rate: dec!(0.04),
            current_balance: dec!(1500),
        }
    }

    #[test]
    fn approval_entry_records_principal() {
        let d = deposit();
        let at = Utc::now();
        let entry = approval_entry(&d, at);
        assert_eq!(entry.kind, TransactionKind::Deposit);
        assert_eq!(entry.amount, dec!(1500));
        assert_eq!(entry.balance_after, dec!(1500));
        assert_eq!(entry.deposit_id, Some(d.id));
        assert_eq!(entry.user_id, d.user_id);
        assert_eq!(entry.timestamp, at);
        assert_eq!(entry.description, "Deposit approved - Principal: $1500.00");
    }

    #[test]
    fn newest_first_orders_by_timestamp() {
        let d = deposit();
        let base = Utc::now();
        let mut entries = vec![
            withdrawal_entry(&d, dec!(1), dec!(0), "a", base),
            withdrawal_entry(&d, dec!(2), dec!(0), "b", base + Duration::days(2)),
            withdrawal_entry(&d, dec!(3), dec!(0), "c", base + Duration::days(1)),
        ];
        newest_first(&mut entries);
        let order: Vec<_> = entries.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(order, ["b", "c", "a"]);
    }

    #[test]
    fn newest_first_breaks_ties_by_insertion() {
        let d = deposit();
        let at = Utc::now();
        let mut entries = vec![
            approval_entry(&d, at),
            withdrawal_entry(&d, dec!(1500), dec!(0), "full", at),
            withdrawal_entry(&d, dec!(1), dec!(0), "older", at - Duration::hours(1)),
        ];
        newest_first(&mut entries);
        let kinds: Vec<_> = entries.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            [TransactionKind::Withdrawal, TransactionKind::Deposit, TransactionKind::Withdrawal]
        );
        assert_eq!(entries[0].description, "full");
        assert_eq!(entries[2].description, "older");
    }
}
