pub mod balance_calculator;
pub mod settlement_optimizer;
pub mod share_split;

pub use balance_calculator::{
    BalanceCalculator, BalanceReport, ContributionDetail, LedgerSummary, ParticipantBalance,
};
pub use settlement_optimizer::SettlementOptimizer;
pub use share_split::split_evenly;
