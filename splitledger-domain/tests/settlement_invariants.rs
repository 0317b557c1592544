use chrono::Utc;
use proptest::prelude::*;
use splitledger_domain::{
    model::{
        AccountId, Contribution, ContributionId, ContributionKind, Identity, Money, Participant,
        ParticipantId, PayerShare,
    },
    split_evenly, BalanceCalculator, SettlementOptimizer,
};

fn participants(count: usize) -> Vec<Participant> {
    (0..count)
        .map(|idx| {
            Participant::new(
                ParticipantId(idx as u64 + 1),
                Identity::Account {
                    id: AccountId(idx as u64 + 1),
                    username: format!("user{idx}"),
                },
            )
        })
        .collect()
}

/// Builds expense contributions whose payer records always cover the full
/// amount, so the ledger is balanced by construction.
fn balanced_expenses(
    member_count: usize,
    amounts: &[i64],
    payer_indexes: &[usize],
) -> Vec<Contribution> {
    amounts
        .iter()
        .enumerate()
        .map(|(idx, &amount)| {
            let payer = payer_indexes.get(idx).copied().unwrap_or(0) % member_count;
            Contribution {
                id: ContributionId(idx as u64 + 1),
                kind: ContributionKind::Expense,
                amount: Money::from_i64(amount),
                category: "misc".to_string(),
                description: None,
                created_at: Utc::now(),
                recorded_by: AccountId(1),
                payers: vec![PayerShare {
                    participant_id: ParticipantId(payer as u64 + 1),
                    amount_paid: Money::from_i64(amount),
                }],
            }
        })
        .collect()
}

proptest! {
    #[test]
    fn shares_always_sum_to_the_amount(amount in 0i64..=1_000_000, count in 1usize..=50) {
        let shares = split_evenly(Money::from_i64(amount), count);
        prop_assert_eq!(shares.len(), count);

        let total: i64 = shares.iter().map(|share| share.amount()).sum();
        prop_assert_eq!(total, amount);

        // Adjacent shares differ by at most one unit.
        for share in &shares {
            prop_assert!((share.amount() - amount / count as i64).abs() <= 1);
        }
    }

    #[test]
    fn balanced_ledgers_are_zero_sum(
        member_count in 1usize..=6,
        amounts in prop::collection::vec(1i64..=10_000, 0..=30),
        payer_indexes in prop::collection::vec(0usize..=5, 0..=30),
    ) {
        let members = participants(member_count);
        let contributions = balanced_expenses(member_count, &amounts, &payer_indexes);

        let report = BalanceCalculator.compute(&members, &contributions);

        let total: i64 = report
            .balances
            .values()
            .map(|balance| balance.net_balance.amount())
            .sum();
        prop_assert_eq!(total, 0);
        prop_assert!(report.is_fully_accounted());
    }

    #[test]
    fn settlement_zeroes_balanced_ledgers(
        member_count in 2usize..=6,
        amounts in prop::collection::vec(1i64..=10_000, 0..=30),
        payer_indexes in prop::collection::vec(0usize..=5, 0..=30),
    ) {
        let members = participants(member_count);
        let contributions = balanced_expenses(member_count, &amounts, &payer_indexes);

        let report = BalanceCalculator.compute(&members, &contributions);
        let suggestions = SettlementOptimizer.settle(report.balances.values());

        let mut nets: Vec<i64> = report
            .balances
            .values()
            .map(|balance| balance.net_balance.amount())
            .collect();
        for suggestion in &suggestions {
            nets[(suggestion.from.0 - 1) as usize] += suggestion.amount.amount();
            nets[(suggestion.to.0 - 1) as usize] -= suggestion.amount.amount();
        }
        for net in nets {
            prop_assert!(net.abs() <= Money::TOLERANCE.amount());
        }
    }

    #[test]
    fn settlement_transfer_count_is_bounded(
        member_count in 2usize..=6,
        amounts in prop::collection::vec(1i64..=10_000, 0..=30),
        payer_indexes in prop::collection::vec(0usize..=5, 0..=30),
    ) {
        let members = participants(member_count);
        let contributions = balanced_expenses(member_count, &amounts, &payer_indexes);

        let report = BalanceCalculator.compute(&members, &contributions);

        let creditors = report
            .balances
            .values()
            .filter(|balance| balance.net_balance > Money::TOLERANCE)
            .count();
        let debtors = report
            .balances
            .values()
            .filter(|balance| -balance.net_balance > Money::TOLERANCE)
            .count();

        let suggestions = SettlementOptimizer.settle(report.balances.values());
        let bound = (creditors + debtors).saturating_sub(1);
        prop_assert!(suggestions.len() <= bound);
    }

    #[test]
    fn reports_are_deterministic(
        member_count in 1usize..=6,
        amounts in prop::collection::vec(1i64..=10_000, 0..=20),
        payer_indexes in prop::collection::vec(0usize..=5, 0..=20),
    ) {
        let members = participants(member_count);
        let contributions = balanced_expenses(member_count, &amounts, &payer_indexes);

        let first = BalanceCalculator.compute(&members, &contributions);
        let second = BalanceCalculator.compute(&members, &contributions);
        prop_assert_eq!(&first, &second);

        let transfers_first = SettlementOptimizer.settle(first.balances.values());
        let transfers_second = SettlementOptimizer.settle(second.balances.values());
        prop_assert_eq!(transfers_first, transfers_second);
    }
}
