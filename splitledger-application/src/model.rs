use chrono::{DateTime, Utc};
use splitledger_domain::{AccountId, ContributionKind, Money, PayerShare, SharedLedgerId};

/// Category tag applied to every materialized personal-ledger entry.
pub const SETTLEMENT_CATEGORY: &str = "Shared ledger settlement";

/// Lifecycle state of a shared ledger. `Closed` is terminal; there is no
/// reopening.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerState {
    Open,
    Closed,
}

/// Metadata record of one shared ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerInfo {
    pub id: SharedLedgerId,
    pub name: String,
    pub creator: AccountId,
    pub state: LedgerState,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl LedgerInfo {
    pub fn is_open(&self) -> bool {
        self.state == LedgerState::Open
    }
}

/// Caller-supplied fields of a contribution to record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewContribution {
    pub kind: ContributionKind,
    pub amount: Money,
    pub category: String,
    pub description: Option<String>,
    pub payers: Vec<PayerShare>,
}

/// One entry appended to a platform account's personal ledger when a shared
/// ledger is closed. Always an expense for the debtor's total outstanding
/// obligation, carrying a back-reference to the shared ledger it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersonalLedgerEntry {
    pub account_id: AccountId,
    pub kind: ContributionKind,
    pub amount: Money,
    pub category: String,
    pub description: String,
    pub shared_ledger_id: SharedLedgerId,
}

/// Result of closing a shared ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClosedLedger {
    pub entries: Vec<PersonalLedgerEntry>,
    pub closed_at: DateTime<Utc>,
}
