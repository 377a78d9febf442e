//! Interest accrual and deposit lifecycle engine.
//!
//! Everything here is synchronous. Balances, interest and maturity are
//! derived from the stored principal, rate and approval time on every read;
//! nothing accrues in the background.

pub mod clock;
pub mod error;
pub mod interest;
pub mod ledger;
pub mod lifecycle;
pub mod memory;
pub mod service;
pub mod store;
pub mod withdrawal;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ErrorKind, FundsError, Result};
pub use memory::MemoryStore;
pub use service::{FundsService, Terms};
pub use store::Store;
pub use withdrawal::{WithdrawKind, Withdrawal};

/// Currency amounts. Decimal rather than float so cents stay exact.
pub type Amount = rust_decimal::Decimal;
