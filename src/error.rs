//! Ledger error taxonomy. None of these are fatal: the console reports them and carries on.

use crate::types::TradeId;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Malformed or out-of-range user input.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// The trade exists but cannot make the requested transition.
    #[error("trade {id} {reason}")]
    InvalidState { id: TradeId, reason: String },

    #[error("no trade {0}")]
    NotFound(TradeId),

    #[error("ledger file {path}: {reason}")]
    Persistence { path: String, reason: String },
}

impl LedgerError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        LedgerError::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn invalid_state(id: TradeId, reason: impl Into<String>) -> Self {
        LedgerError::InvalidState {
            id,
            reason: reason.into(),
        }
    }

    pub fn persistence(path: impl AsRef<std::path::Path>, reason: impl ToString) -> Self {
        LedgerError::Persistence {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
