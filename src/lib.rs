//! # Debt Ledger
//!
//! Record keeping for customers, the debts they owe and the installments
//! they pay, persisted as a JSON snapshot.
//!
//! ## Design Principles
//!
//! - **Fixed-point arithmetic**: amounts use 2 decimal places via `rust_decimal`
//! - **Derived state**: a debt's paid amount and status are recomputed from its
//!   append-only installment trail after every payment
//! - **Whole-snapshot persistence**: every successful mutation saves the full
//!   ledger through a [`SnapshotStore`]
//! - **Explicit wiring**: a [`Ledger`] is constructed once and passed by
//!   reference; there is no global state
//!
//! ## Example
//!
//! ```
//! use debt_ledger::{CustomerMetadata, DebtStatus, Ledger, Money};
//! use std::str::FromStr;
//!
//! let mut ledger = Ledger::new();
//! let jane = ledger.add_customer("Jane", CustomerMetadata::default()).unwrap();
//! let debt = ledger
//!     .add_debt(jane.id(), "Invoice #1", Money::from_str("1000").unwrap())
//!     .unwrap();
//!
//! let debt = ledger
//!     .record_installment(jane.id(), debt.id(), Money::from_str("1000").unwrap())
//!     .unwrap();
//! assert_eq!(debt.status(), DebtStatus::Paid);
//! ```

pub mod customer;
pub mod debt;
pub mod error;
pub mod ledger;
pub mod money;
pub mod report;
pub mod storage;

pub use customer::{Customer, CustomerId, CustomerMetadata, CustomerPatch};
pub use debt::{Debt, DebtId, DebtStatus, Installment, NewDebt};
pub use error::{LedgerError, ParseMoneyError, Result, StorageError, StorageResult};
pub use ledger::{Durability, Ledger, Totals};
pub use money::Money;
pub use storage::{JsonFileStore, MemoryStore, Snapshot, SnapshotStore};
