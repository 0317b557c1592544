use crate::{
    model::{Contribution, ContributionId, ContributionKind, Money, Participant, ParticipantId},
    services::share_split::split_evenly,
};
use fxhash::FxHashMap;
use indexmap::IndexMap;

/// Per-contribution audit detail for one participant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContributionDetail {
    pub contribution_id: ContributionId,
    /// Contribution description, falling back to the category when absent.
    pub description: String,
    pub category: String,
    pub kind: ContributionKind,
    pub amount: Money,
    pub amount_paid: Money,
    /// Signed fair share of this contribution: positive for expenses,
    /// negative for income.
    pub share: Money,
}

/// Derived balance of one participant over the whole ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParticipantBalance {
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub total_paid: Money,
    pub fair_share: Money,
    /// `total_paid − fair_share`; positive means the group owes this
    /// participant money, negative means they owe the group.
    pub net_balance: Money,
    pub amount_to_receive: Money,
    pub amount_to_pay: Money,
    pub details: Vec<ContributionDetail>,
}

/// Ledger-wide totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedgerSummary {
    pub total_expenses: Money,
    pub total_income: Money,
    /// `total_income − total_expenses`.
    pub net_amount: Money,
    /// Truncated equal share of `net_amount`.
    pub per_person: Money,
    pub participant_count: usize,
    /// Σ over contributions of `amount − Σ amount_paid`. Nonzero means some
    /// contribution's payer records do not cover its amount; callers can
    /// find which one through the per-participant details.
    pub unaccounted: Money,
}

/// Balances for every participant, in creation order, plus ledger totals.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BalanceReport {
    pub balances: IndexMap<ParticipantId, ParticipantBalance>,
    pub summary: LedgerSummary,
}

impl BalanceReport {
    pub fn balance(&self, participant: ParticipantId) -> Option<&ParticipantBalance> {
        self.balances.get(&participant)
    }

    /// True when every contribution's payer records sum to its amount.
    pub fn is_fully_accounted(&self) -> bool {
        self.summary.unaccounted.is_zero()
    }
}

/// Folds participants and contributions into one balance per participant.
///
/// Pure and deterministic: the same inputs always produce the same report,
/// so concurrent readers need no coordination.
pub struct BalanceCalculator;

impl BalanceCalculator {
    pub fn compute(
        &self,
        participants: &[Participant],
        contributions: &[Contribution],
    ) -> BalanceReport {
        let mut balances: IndexMap<ParticipantId, ParticipantBalance> = participants
            .iter()
            .map(|participant| {
                (
                    participant.id,
                    ParticipantBalance {
                        participant_id: participant.id,
                        display_name: participant.display_name().into_owned(),
                        total_paid: Money::ZERO,
                        fair_share: Money::ZERO,
                        net_balance: Money::ZERO,
                        amount_to_receive: Money::ZERO,
                        amount_to_pay: Money::ZERO,
                        details: Vec::with_capacity(contributions.len()),
                    },
                )
            })
            .collect();

        let mut summary = LedgerSummary {
            participant_count: participants.len(),
            ..LedgerSummary::default()
        };

        for contribution in contributions {
            match contribution.kind {
                ContributionKind::Expense => summary.total_expenses += contribution.amount,
                ContributionKind::Income => summary.total_income += contribution.amount,
            }
            summary.unaccounted += contribution.shortfall();

            // Shares line up with creation order, which is the iteration
            // order of the IndexMap built above.
            let shares = split_evenly(contribution.amount, participants.len());
            let sign = contribution.kind.sign();
            let paid_by: FxHashMap<ParticipantId, Money> = contribution
                .payers
                .iter()
                .fold(FxHashMap::default(), |mut acc, payer| {
                    *acc.entry(payer.participant_id).or_insert(Money::ZERO) += payer.amount_paid;
                    acc
                });

            for (balance, share) in balances.values_mut().zip(shares) {
                let amount_paid = paid_by
                    .get(&balance.participant_id)
                    .copied()
                    .unwrap_or(Money::ZERO);
                let signed_share = Money::from_i64(share.amount() * sign);

                balance.total_paid += amount_paid;
                balance.fair_share += signed_share;
                balance.details.push(ContributionDetail {
                    contribution_id: contribution.id,
                    description: contribution
                        .description
                        .clone()
                        .unwrap_or_else(|| contribution.category.clone()),
                    category: contribution.category.clone(),
                    kind: contribution.kind,
                    amount: contribution.amount,
                    amount_paid,
                    share: signed_share,
                });
            }
        }

        for balance in balances.values_mut() {
            balance.net_balance = balance.total_paid - balance.fair_share;
            if balance.net_balance.is_positive() {
                balance.amount_to_receive = balance.net_balance;
                balance.amount_to_pay = Money::ZERO;
            } else {
                balance.amount_to_receive = Money::ZERO;
                balance.amount_to_pay = balance.net_balance.abs();
            }
        }

        summary.net_amount = summary.total_income - summary.total_expenses;
        summary.per_person = if participants.is_empty() {
            Money::ZERO
        } else {
            Money::from_i64(summary.net_amount.amount() / participants.len() as i64)
        };

        BalanceReport { balances, summary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccountId, Identity, PayerShare};
    use chrono::Utc;
    use rstest::{fixture, rstest};

    fn account(id: u64, username: &str) -> Participant {
        Participant::new(
            ParticipantId(id),
            Identity::Account {
                id: AccountId(id),
                username: username.to_string(),
            },
        )
    }

    fn contribution(
        id: u64,
        kind: ContributionKind,
        amount: i64,
        payers: Vec<(u64, i64)>,
    ) -> Contribution {
        Contribution {
            id: ContributionId(id),
            kind,
            amount: Money::from_i64(amount),
            category: "groceries".to_string(),
            description: None,
            created_at: Utc::now(),
            recorded_by: AccountId(1),
            payers: payers
                .into_iter()
                .map(|(participant, paid)| PayerShare {
                    participant_id: ParticipantId(participant),
                    amount_paid: Money::from_i64(paid),
                })
                .collect(),
        }
    }

    #[fixture]
    fn calculator() -> BalanceCalculator {
        BalanceCalculator
    }

    #[rstest]
    fn expense_paid_by_one_of_two(calculator: BalanceCalculator) {
        let participants = [account(1, "ana"), account(2, "ben")];
        let contributions = [contribution(
            1,
            ContributionKind::Expense,
            100,
            vec![(1, 100)],
        )];

        let report = calculator.compute(&participants, &contributions);

        let ana = report.balance(ParticipantId(1)).unwrap();
        assert_eq!(ana.total_paid, Money::from_i64(100));
        assert_eq!(ana.fair_share, Money::from_i64(50));
        assert_eq!(ana.net_balance, Money::from_i64(50));
        assert_eq!(ana.amount_to_receive, Money::from_i64(50));

        let ben = report.balance(ParticipantId(2)).unwrap();
        assert_eq!(ben.net_balance, Money::from_i64(-50));
        assert_eq!(ben.amount_to_pay, Money::from_i64(50));

        assert!(report.is_fully_accounted());
        assert_eq!(report.summary.total_expenses, Money::from_i64(100));
    }

    #[rstest]
    fn uneven_split_gives_extra_unit_to_first_participant(calculator: BalanceCalculator) {
        let participants = [account(1, "ana"), account(2, "ben"), account(3, "cas")];
        let contributions = [contribution(
            1,
            ContributionKind::Expense,
            100,
            vec![(1, 100)],
        )];

        let report = calculator.compute(&participants, &contributions);

        let shares: Vec<Money> = report
            .balances
            .values()
            .map(|balance| balance.fair_share)
            .collect();
        assert_eq!(
            shares,
            vec![
                Money::from_i64(34),
                Money::from_i64(33),
                Money::from_i64(33)
            ]
        );

        let nets: Vec<Money> = report
            .balances
            .values()
            .map(|balance| balance.net_balance)
            .collect();
        assert_eq!(
            nets,
            vec![
                Money::from_i64(66),
                Money::from_i64(-33),
                Money::from_i64(-33)
            ]
        );
    }

    #[rstest]
    fn income_without_payers_is_computed_and_flagged(calculator: BalanceCalculator) {
        let participants = [account(1, "ana"), account(2, "ben")];
        let contributions = [contribution(1, ContributionKind::Income, 200, vec![])];

        let report = calculator.compute(&participants, &contributions);

        for balance in report.balances.values() {
            assert_eq!(balance.total_paid, Money::ZERO);
            assert_eq!(balance.fair_share, Money::from_i64(-100));
        }

        // The missing 200 surfaces through the summary, not as an error.
        assert!(!report.is_fully_accounted());
        assert_eq!(report.summary.unaccounted, Money::from_i64(200));
        assert_eq!(report.summary.total_income, Money::from_i64(200));
    }

    #[rstest]
    fn empty_ledger_has_zero_balances(calculator: BalanceCalculator) {
        let participants = [account(1, "ana")];
        let report = calculator.compute(&participants, &[]);

        let ana = report.balance(ParticipantId(1)).unwrap();
        assert_eq!(ana.net_balance, Money::ZERO);
        assert!(ana.details.is_empty());
        assert_eq!(report.summary.net_amount, Money::ZERO);
    }

    #[rstest]
    fn details_carry_audit_rows_per_contribution(calculator: BalanceCalculator) {
        let participants = [account(1, "ana"), account(2, "ben")];
        let contributions = [
            contribution(1, ContributionKind::Expense, 60, vec![(1, 60)]),
            contribution(2, ContributionKind::Income, 20, vec![(2, 20)]),
        ];

        let report = calculator.compute(&participants, &contributions);
        let ana = report.balance(ParticipantId(1)).unwrap();

        assert_eq!(ana.details.len(), 2);
        assert_eq!(ana.details[0].contribution_id, ContributionId(1));
        assert_eq!(ana.details[0].share, Money::from_i64(30));
        assert_eq!(ana.details[1].share, Money::from_i64(-10));
        assert_eq!(ana.details[1].amount_paid, Money::ZERO);
        assert_eq!(ana.details[0].description, "groceries");
    }
}
