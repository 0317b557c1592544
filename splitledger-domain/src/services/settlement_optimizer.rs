use crate::{
    model::{Money, ParticipantId, SettlementSuggestion},
    services::balance_calculator::ParticipantBalance,
};
use std::{cmp::Ordering, collections::BinaryHeap};

/// One side of the matching: a participant and how much they still owe or
/// are owed. Ordered so the heap pops the largest remaining amount first,
/// with ties broken by the smallest participant id for determinism.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenPosition {
    remaining: Money,
    participant: ParticipantId,
}

impl Ord for OpenPosition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.remaining
            .cmp(&other.remaining)
            .then_with(|| other.participant.cmp(&self.participant))
    }
}

impl PartialOrd for OpenPosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Greedy largest-first matching of debtors against creditors.
///
/// Produces at most `creditors + debtors − 1` transfers that drive every
/// balance within [`Money::TOLERANCE`] of zero. This is a heuristic, not the
/// provably minimal transfer count; minimizing exactly is a harder
/// combinatorial problem and the bound here is the accepted trade-off.
pub struct SettlementOptimizer;

impl SettlementOptimizer {
    pub fn settle<'a, I>(&self, balances: I) -> Vec<SettlementSuggestion>
    where
        I: IntoIterator<Item = &'a ParticipantBalance>,
    {
        let mut creditors = BinaryHeap::new();
        let mut debtors = BinaryHeap::new();

        for balance in balances {
            if balance.net_balance > Money::TOLERANCE {
                creditors.push(OpenPosition {
                    remaining: balance.net_balance,
                    participant: balance.participant_id,
                });
            } else if -balance.net_balance > Money::TOLERANCE {
                debtors.push(OpenPosition {
                    remaining: balance.net_balance.abs(),
                    participant: balance.participant_id,
                });
            }
        }

        let mut suggestions = Vec::with_capacity(creditors.len() + debtors.len());

        // Every iteration pops both heaps and pushes back at most one side
        // (the transfer zeroes at least one of the two), so the loop runs at
        // most `creditors + debtors` times. If the balances do not sum to
        // zero, one heap drains first and the residue on the other side is
        // left unmatched.
        while let (Some(mut debtor), Some(mut creditor)) = (debtors.pop(), creditors.pop()) {
            let amount = debtor.remaining.min(creditor.remaining);
            if amount > Money::TOLERANCE {
                suggestions.push(SettlementSuggestion {
                    from: debtor.participant,
                    to: creditor.participant,
                    amount,
                });
            }

            debtor.remaining -= amount;
            creditor.remaining -= amount;
            if debtor.remaining > Money::TOLERANCE {
                debtors.push(debtor);
            }
            if creditor.remaining > Money::TOLERANCE {
                creditors.push(creditor);
            }
        }

        suggestions
    }
}
