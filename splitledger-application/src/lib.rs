#![warn(clippy::uninlined_format_args)]

pub mod engine;
pub mod error;
pub mod model;
pub mod ports;

pub use engine::SettlementEngine;
pub use error::{EngineError, StorageError};
pub use model::{
    ClosedLedger, LedgerInfo, LedgerState, NewContribution, PersonalLedgerEntry,
    SETTLEMENT_CATEGORY,
};
pub use ports::{
    ContributionStore, LedgerRepository, ParticipantSource, PersonalLedgerSink, Storage,
};
