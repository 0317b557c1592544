use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use splitledger_application::{
    ContributionStore, LedgerInfo, LedgerRepository, LedgerState, NewContribution,
    ParticipantSource, PersonalLedgerEntry, PersonalLedgerSink, StorageError,
};
use splitledger_domain::{
    AccountId, Contribution, ContributionId, Identity, Participant, ParticipantId, SharedLedgerId,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// In-memory storage collaborator.
///
/// Backs the engine in tests and embedded use. `append_entries` honors the
/// all-or-nothing contract by holding the personal-ledger mutex across the
/// whole batch, and `fail_materialization` lets tests exercise the
/// failed-close path.
#[derive(Default)]
pub struct InMemoryStorage {
    ledgers: DashMap<SharedLedgerId, LedgerInfo>,
    participants: DashMap<SharedLedgerId, Vec<Participant>>,
    contributions: DashMap<SharedLedgerId, Vec<Contribution>>,
    personal_entries: Mutex<Vec<PersonalLedgerEntry>>,
    next_ledger_id: AtomicU64,
    next_participant_id: AtomicU64,
    next_contribution_id: AtomicU64,
    fail_materialization: AtomicBool,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// All personal-ledger entries materialized so far.
    pub fn personal_entries(&self) -> Vec<PersonalLedgerEntry> {
        self.personal_entries.lock().clone()
    }

    /// Makes subsequent `append_entries` calls fail until reset.
    pub fn fail_materialization(&self, fail: bool) {
        self.fail_materialization.store(fail, Ordering::SeqCst);
    }
}

impl LedgerRepository for InMemoryStorage {
    fn create_ledger(
        &self,
        name: &str,
        creator: AccountId,
        created_at: DateTime<Utc>,
    ) -> Result<LedgerInfo, StorageError> {
        let id = SharedLedgerId(self.next_ledger_id.fetch_add(1, Ordering::SeqCst) + 1);
        let info = LedgerInfo {
            id,
            name: name.to_string(),
            creator,
            state: LedgerState::Open,
            created_at,
            closed_at: None,
        };
        self.ledgers.insert(id, info.clone());
        self.participants.insert(id, Vec::new());
        self.contributions.insert(id, Vec::new());
        Ok(info)
    }

    fn fetch_ledger(&self, id: SharedLedgerId) -> Result<Option<LedgerInfo>, StorageError> {
        Ok(self.ledgers.get(&id).map(|entry| entry.value().clone()))
    }

    fn mark_closed(
        &self,
        id: SharedLedgerId,
        closed_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut info = self
            .ledgers
            .get_mut(&id)
            .ok_or_else(|| StorageError::Unavailable(format!("unknown ledger {id}")))?;
        info.state = LedgerState::Closed;
        info.closed_at = Some(closed_at);
        Ok(())
    }

    fn delete_ledger(&self, id: SharedLedgerId) -> Result<(), StorageError> {
        self.ledgers.remove(&id);
        self.participants.remove(&id);
        self.contributions.remove(&id);
        Ok(())
    }
}

impl ParticipantSource for InMemoryStorage {
    fn participants(&self, ledger: SharedLedgerId) -> Result<Vec<Participant>, StorageError> {
        Ok(self
            .participants
            .get(&ledger)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    fn add_participant(
        &self,
        ledger: SharedLedgerId,
        identity: Identity,
    ) -> Result<Participant, StorageError> {
        let id = ParticipantId(self.next_participant_id.fetch_add(1, Ordering::SeqCst) + 1);
        let participant = Participant::new(id, identity);
        self.participants
            .entry(ledger)
            .or_default()
            .push(participant.clone());
        Ok(participant)
    }
}

impl ContributionStore for InMemoryStorage {
    fn contributions(&self, ledger: SharedLedgerId) -> Result<Vec<Contribution>, StorageError> {
        Ok(self
            .contributions
            .get(&ledger)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    fn append_contribution(
        &self,
        ledger: SharedLedgerId,
        recorded_by: AccountId,
        recorded_at: DateTime<Utc>,
        contribution: NewContribution,
    ) -> Result<Contribution, StorageError> {
        let id = ContributionId(self.next_contribution_id.fetch_add(1, Ordering::SeqCst) + 1);
        let contribution = Contribution {
            id,
            kind: contribution.kind,
            amount: contribution.amount,
            category: contribution.category,
            description: contribution.description,
            created_at: recorded_at,
            recorded_by,
            payers: contribution.payers,
        };
        self.contributions
            .entry(ledger)
            .or_default()
            .push(contribution.clone());
        Ok(contribution)
    }

    fn remove_contribution(
        &self,
        ledger: SharedLedgerId,
        id: ContributionId,
    ) -> Result<bool, StorageError> {
        let Some(mut entries) = self.contributions.get_mut(&ledger) else {
            return Ok(false);
        };
        let before = entries.len();
        entries.retain(|contribution| contribution.id != id);
        Ok(entries.len() != before)
    }
}

impl PersonalLedgerSink for InMemoryStorage {
    fn append_entries(&self, entries: &[PersonalLedgerEntry]) -> Result<(), StorageError> {
        if self.fail_materialization.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "personal ledger rejected the batch".to_string(),
            ));
        }
        self.personal_entries.lock().extend_from_slice(entries);
        Ok(())
    }
}
