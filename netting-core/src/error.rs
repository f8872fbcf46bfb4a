//! Error types for the netting engine

use crate::types::{AgreementStatus, Currency, LedgerRole};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Result type for netting operations
pub type Result<T> = std::result::Result<T, Error>;

/// Netting engine errors
#[derive(Error, Debug)]
pub enum Error {
    /// Agreement does not exist
    #[error("Agreement not found: {0}")]
    AgreementNotFound(Uuid),

    /// Agreement exists but is not in Active status
    #[error("Agreement {id} is not active (status: {status})")]
    AgreementNotActive {
        /// Agreement ID
        id: Uuid,
        /// Current status
        status: AgreementStatus,
    },

    /// Line currency differs from the agreement's netting currency
    #[error("Currency mismatch: agreement nets in {expected}, invoice {invoice} is in {found}")]
    CurrencyMismatch {
        /// Netting currency of the agreement
        expected: Currency,
        /// Currency found on the line
        found: Currency,
        /// Offending invoice
        invoice: String,
    },

    /// Negative open balance on a subledger line
    #[error("Invalid line amount on invoice {invoice}: {amount}")]
    InvalidLineAmount {
        /// Offending invoice
        invoice: String,
        /// Rejected amount
        amount: Decimal,
    },

    /// Requested amount exceeds the freshly recomputed ceiling
    #[error("Stale proposal: requested {requested} exceeds recomputed ceiling {ceiling}")]
    StaleProposal {
        /// Amount the client asked to settle
        requested: Decimal,
        /// Maximum the live subledger state allows
        ceiling: Decimal,
    },

    /// Another settlement for the same agreement is in flight
    #[error("Concurrent settlement in progress for agreement {0}")]
    ConcurrentSettlementConflict(Uuid),

    /// A subledger rejected or failed a posting
    #[error("{side} subledger posting failed: {reason}")]
    SubledgerPosting {
        /// Which subledger failed
        side: LedgerRole,
        /// Underlying adapter error
        reason: String,
    },

    /// The compensating AR reversal itself failed; the receipt needs
    /// manual reconciliation
    #[error("Compensation failed: receipt {receipt} could not be reversed: {reason}")]
    CompensationFailed {
        /// Orphaned AR receipt reference
        receipt: String,
        /// Underlying adapter error
        reason: String,
    },

    /// Settlement record not found
    #[error("Settlement not found: {0}")]
    SettlementNotFound(Uuid),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Malformed or semantically invalid request
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the caller can retry after re-fetching a fresh proposal
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::StaleProposal { .. }
                | Error::ConcurrentSettlementConflict(_)
                | Error::SubledgerPosting { .. }
        )
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
