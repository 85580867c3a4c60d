//! Error types for the ledger and its storage adapters.

use crate::customer::CustomerId;
use crate::debt::DebtId;
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Result type alias for storage adapter operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during ledger operation.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Malformed or out-of-range input. Nothing was changed.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Reference to an unknown customer
    #[error("Customer {0} not found")]
    CustomerNotFound(CustomerId),

    /// Reference to a debt the customer does not own
    #[error("Debt {debt} not found for customer {customer}")]
    DebtNotFound { customer: CustomerId, debt: DebtId },

    /// Loading or saving the snapshot failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Failed to write output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV report error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A destructive command was issued without confirmation
    #[error("Refusing to delete {0} without confirmation. Re-run with --yes")]
    Unconfirmed(String),
}

impl LedgerError {
    /// Returns `true` for references to unknown customers or debts.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LedgerError::CustomerNotFound(_) | LedgerError::DebtNotFound { .. }
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, LedgerError::Validation(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, LedgerError::Storage(_))
    }
}

/// Errors from parsing a monetary amount.
#[derive(Error, Debug)]
pub enum ParseMoneyError {
    /// Not a decimal number
    #[error("invalid amount: {0}")]
    Invalid(#[from] rust_decimal::Error),

    /// More decimal places than the currency's minor unit
    #[error("amount {0} has more than 2 decimal places")]
    TooPrecise(String),
}

/// Errors raised by snapshot stores.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading or writing the backing file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot document could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The store refused the write
    #[error("save rejected: {0}")]
    Rejected(String),

    /// The snapshot decodes but breaks a ledger invariant
    #[error("invalid snapshot: {0}")]
    Invalid(String),

    /// No identifiers are left to hand out
    #[error("identifier space exhausted")]
    IdsExhausted,
}
