use crate::{
    error::StorageError,
    model::{LedgerInfo, NewContribution, PersonalLedgerEntry},
};
use chrono::{DateTime, Utc};
use splitledger_domain::{
    AccountId, Contribution, ContributionId, Identity, Participant, SharedLedgerId,
};

/// Resolves the participant set of a ledger.
///
/// Identity resolution (platform usernames) is the collaborator's job; the
/// engine only consumes fully resolved [`Participant`] values. Participants
/// must be returned in creation order — remainder distribution in the equal
/// split depends on it.
pub trait ParticipantSource: Send + Sync {
    fn participants(&self, ledger: SharedLedgerId) -> Result<Vec<Participant>, StorageError>;

    fn add_participant(
        &self,
        ledger: SharedLedgerId,
        identity: Identity,
    ) -> Result<Participant, StorageError>;
}

/// Append/list/delete store for shared contributions.
pub trait ContributionStore: Send + Sync {
    /// All contributions of a ledger in creation order.
    fn contributions(&self, ledger: SharedLedgerId) -> Result<Vec<Contribution>, StorageError>;

    fn append_contribution(
        &self,
        ledger: SharedLedgerId,
        recorded_by: AccountId,
        recorded_at: DateTime<Utc>,
        contribution: NewContribution,
    ) -> Result<Contribution, StorageError>;

    /// Returns `false` when no contribution with that id exists.
    fn remove_contribution(
        &self,
        ledger: SharedLedgerId,
        id: ContributionId,
    ) -> Result<bool, StorageError>;
}

/// Sink for materialized settlement entries.
///
/// `append_entries` must apply all entries as one atomic unit: either every
/// entry is persisted or none is. The engine relies on this to keep a failed
/// close free of observable side effects.
pub trait PersonalLedgerSink: Send + Sync {
    fn append_entries(&self, entries: &[PersonalLedgerEntry]) -> Result<(), StorageError>;
}

/// Store for ledger metadata and lifecycle state.
pub trait LedgerRepository: Send + Sync {
    fn create_ledger(
        &self,
        name: &str,
        creator: AccountId,
        created_at: DateTime<Utc>,
    ) -> Result<LedgerInfo, StorageError>;

    fn fetch_ledger(&self, id: SharedLedgerId) -> Result<Option<LedgerInfo>, StorageError>;

    fn mark_closed(
        &self,
        id: SharedLedgerId,
        closed_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Deletes the ledger and, by cascade, its participants and
    /// contributions.
    fn delete_ledger(&self, id: SharedLedgerId) -> Result<(), StorageError>;
}

/// Everything the engine needs from its storage collaborator.
pub trait Storage:
    ParticipantSource + ContributionStore + PersonalLedgerSink + LedgerRepository
{
}

impl<T> Storage for T where
    T: ParticipantSource + ContributionStore + PersonalLedgerSink + LedgerRepository
{
}
