#![warn(clippy::uninlined_format_args)]

pub mod model;
pub mod services;

pub use model::{
    AccountId, Contribution, ContributionId, ContributionKind, Identity, Money, Participant,
    ParticipantId, PayerShare, SettlementSuggestion, SharedLedgerId,
};
pub use services::{
    split_evenly, BalanceCalculator, BalanceReport, ContributionDetail, LedgerSummary,
    ParticipantBalance, SettlementOptimizer,
};
