use crate::{
    error::EngineError,
    model::{ClosedLedger, LedgerInfo, NewContribution, PersonalLedgerEntry, SETTLEMENT_CATEGORY},
    ports::Storage,
};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use splitledger_domain::{
    AccountId, BalanceCalculator, BalanceReport, Contribution, ContributionId, ContributionKind,
    Identity, Money, Participant, SettlementOptimizer, SettlementSuggestion, SharedLedgerId,
};
use std::sync::Arc;

/// The shared-expense settlement engine.
///
/// Reads (`balances`, `settlement_suggestions`) are pure folds over the
/// storage collaborator and may run concurrently without coordination.
/// Mutations are serialized per ledger id through an internal lock table so
/// that a contribution can never be recorded concurrently with a close, and
/// two concurrent closes can never both materialize entries.
pub struct SettlementEngine<S> {
    storage: S,
    locks: DashMap<SharedLedgerId, Arc<Mutex<()>>>,
    calculator: BalanceCalculator,
    optimizer: SettlementOptimizer,
}

impl<S: Storage> SettlementEngine<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            locks: DashMap::new(),
            calculator: BalanceCalculator,
            optimizer: SettlementOptimizer,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn ledger_lock(&self, ledger: SharedLedgerId) -> Arc<Mutex<()>> {
        self.locks.entry(ledger).or_default().clone()
    }

    fn fetch_ledger(&self, ledger: SharedLedgerId) -> Result<LedgerInfo, EngineError> {
        self.storage
            .fetch_ledger(ledger)?
            .ok_or(EngineError::NotFound)
    }

    fn require_open(&self, ledger: SharedLedgerId) -> Result<LedgerInfo, EngineError> {
        let info = self.fetch_ledger(ledger)?;
        if !info.is_open() {
            return Err(EngineError::LedgerClosed);
        }
        Ok(info)
    }

    /// Creates a ledger with the creator seeded as its first participant.
    ///
    /// Additional identities are added in order with the same duplicate
    /// checks as [`Self::add_participant`].
    pub fn create_ledger(
        &self,
        name: &str,
        creator: AccountId,
        creator_username: &str,
        others: Vec<Identity>,
    ) -> Result<LedgerInfo, EngineError> {
        let info = self.storage.create_ledger(name, creator, Utc::now())?;
        self.storage.add_participant(
            info.id,
            Identity::Account {
                id: creator,
                username: creator_username.to_string(),
            },
        )?;
        for identity in others {
            self.add_participant(info.id, identity)?;
        }

        tracing::info!("Created shared ledger {} ({name})", info.id);
        Ok(info)
    }

    /// Deletes a ledger and everything under it. Creator-only.
    pub fn delete_ledger(
        &self,
        ledger: SharedLedgerId,
        actor: AccountId,
    ) -> Result<(), EngineError> {
        let lock = self.ledger_lock(ledger);
        let _guard = lock.lock();

        let info = self.fetch_ledger(ledger)?;
        if info.creator != actor {
            return Err(EngineError::Forbidden);
        }
        self.storage.delete_ledger(ledger)?;
        self.locks.remove(&ledger);

        tracing::info!("Deleted shared ledger {ledger}");
        Ok(())
    }

    /// Adds a participant to an open ledger.
    ///
    /// Fails with `DuplicateParticipant` when the account is already a
    /// participant, or when a guest name collides (case-sensitively) with an
    /// existing guest.
    pub fn add_participant(
        &self,
        ledger: SharedLedgerId,
        identity: Identity,
    ) -> Result<Participant, EngineError> {
        let lock = self.ledger_lock(ledger);
        let _guard = lock.lock();

        self.require_open(ledger)?;

        let existing = self.storage.participants(ledger)?;
        let duplicate = existing.iter().any(|participant| {
            match (&participant.identity, &identity) {
                (Identity::Account { id: a, .. }, Identity::Account { id: b, .. }) => a == b,
                (Identity::Guest { name: a }, Identity::Guest { name: b }) => a == b,
                _ => false,
            }
        });
        if duplicate {
            return Err(EngineError::DuplicateParticipant);
        }

        Ok(self.storage.add_participant(ledger, identity)?)
    }

    /// Participants in creation order.
    pub fn participants(&self, ledger: SharedLedgerId) -> Result<Vec<Participant>, EngineError> {
        self.fetch_ledger(ledger)?;
        Ok(self.storage.participants(ledger)?)
    }

    /// Records a shared transaction on an open ledger.
    ///
    /// Payer amounts need not sum to the contribution amount; a shortfall is
    /// accepted and surfaced later through the balance report.
    pub fn record_contribution(
        &self,
        ledger: SharedLedgerId,
        recorded_by: AccountId,
        contribution: NewContribution,
    ) -> Result<Contribution, EngineError> {
        let lock = self.ledger_lock(ledger);
        let _guard = lock.lock();

        self.require_open(ledger)?;

        if !contribution.amount.is_positive() {
            return Err(EngineError::InvalidAmount(contribution.amount));
        }
        for payer in &contribution.payers {
            if payer.amount_paid < Money::ZERO {
                return Err(EngineError::InvalidAmount(payer.amount_paid));
            }
        }

        let participants = self.storage.participants(ledger)?;
        for payer in &contribution.payers {
            let known = participants
                .iter()
                .any(|participant| participant.id == payer.participant_id);
            if !known {
                return Err(EngineError::UnknownPayer(payer.participant_id));
            }
        }

        let recorded = self
            .storage
            .append_contribution(ledger, recorded_by, Utc::now(), contribution)?;
        tracing::debug!(
            "Recorded contribution {} of {} on ledger {ledger}",
            recorded.id,
            recorded.amount
        );
        Ok(recorded)
    }

    /// Removes a contribution from an open ledger.
    pub fn remove_contribution(
        &self,
        ledger: SharedLedgerId,
        id: ContributionId,
    ) -> Result<(), EngineError> {
        let lock = self.ledger_lock(ledger);
        let _guard = lock.lock();

        self.require_open(ledger)?;
        if !self.storage.remove_contribution(ledger, id)? {
            return Err(EngineError::NotFound);
        }
        Ok(())
    }

    /// All contributions of a ledger in creation order. Safe on open or
    /// closed ledgers.
    pub fn contributions(
        &self,
        ledger: SharedLedgerId,
    ) -> Result<Vec<Contribution>, EngineError> {
        self.fetch_ledger(ledger)?;
        Ok(self.storage.contributions(ledger)?)
    }

    /// Per-participant balances with audit detail and ledger totals. Safe on
    /// open or closed ledgers; repeated calls without intervening mutation
    /// return identical reports.
    pub fn balances(&self, ledger: SharedLedgerId) -> Result<BalanceReport, EngineError> {
        self.fetch_ledger(ledger)?;
        let participants = self.storage.participants(ledger)?;
        let contributions = self.storage.contributions(ledger)?;
        Ok(self.calculator.compute(&participants, &contributions))
    }

    /// Suggested peer-to-peer transfers that settle the current balances.
    pub fn settlement_suggestions(
        &self,
        ledger: SharedLedgerId,
    ) -> Result<Vec<SettlementSuggestion>, EngineError> {
        let report = self.balances(ledger)?;
        Ok(self.optimizer.settle(report.balances.values()))
    }

    /// Closes the ledger and materializes the settlement.
    ///
    /// For every platform-account participant who still owes money, exactly
    /// one expense entry for their total obligation is appended to their
    /// personal ledger; guests have no personal ledger and are skipped. The
    /// sink applies entries atomically, so a failed materialization leaves
    /// the ledger open with no partial state. Closing is one-way: a second
    /// attempt fails with `AlreadyClosed`.
    pub fn close_ledger(
        &self,
        ledger: SharedLedgerId,
        actor: AccountId,
    ) -> Result<ClosedLedger, EngineError> {
        let lock = self.ledger_lock(ledger);
        let _guard = lock.lock();

        let info = self.fetch_ledger(ledger)?;
        if !info.is_open() {
            return Err(EngineError::AlreadyClosed);
        }
        if info.creator != actor {
            return Err(EngineError::Forbidden);
        }

        let participants = self.storage.participants(ledger)?;
        let contributions = self.storage.contributions(ledger)?;
        let report = self.calculator.compute(&participants, &contributions);
        if !report.is_fully_accounted() {
            tracing::warn!(
                "Closing ledger {ledger} with {} unaccounted",
                report.summary.unaccounted
            );
        }

        let entries: Vec<PersonalLedgerEntry> = participants
            .iter()
            .filter_map(|participant| {
                let account_id = participant.account_id()?;
                let balance = report.balance(participant.id)?;
                if !balance.amount_to_pay.is_positive() {
                    return None;
                }
                Some(PersonalLedgerEntry {
                    account_id,
                    kind: ContributionKind::Expense,
                    amount: balance.amount_to_pay,
                    category: SETTLEMENT_CATEGORY.to_string(),
                    description: info.name.clone(),
                    shared_ledger_id: ledger,
                })
            })
            .collect();

        self.storage
            .append_entries(&entries)
            .map_err(|err| EngineError::MaterializationFailed(err.to_string()))?;

        let closed_at = Utc::now();
        self.storage.mark_closed(ledger, closed_at)?;

        tracing::info!(
            "Closed shared ledger {ledger}, materialized {} entries",
            entries.len()
        );
        Ok(ClosedLedger { entries, closed_at })
    }
}
