use splitledger_domain::{Money, ParticipantId};

/// Failure kinds reported to callers of the engine.
///
/// All of these are local, recoverable conditions; the engine performs no
/// retries of its own. An unbalanced contribution is deliberately *not* an
/// error: it is a recorded state surfaced through the balance report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("ledger is closed and no longer accepts changes")]
    LedgerClosed,
    #[error("contribution amount must be positive, got {0}")]
    InvalidAmount(Money),
    #[error("payer {0} is not a participant of this ledger")]
    UnknownPayer(ParticipantId),
    #[error("participant is already present in this ledger")]
    DuplicateParticipant,
    #[error("only the ledger creator may perform this action")]
    Forbidden,
    #[error("ledger is already closed")]
    AlreadyClosed,
    #[error("not found")]
    NotFound,
    #[error("failed to materialize settlement entries: {0}")]
    MaterializationFailed(String),
    #[error("storage request failed: {0}")]
    Storage(String),
}

/// Error type for storage collaborator operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unavailable(reason) => EngineError::Storage(reason),
        }
    }
}
