use crate::model::Money;

/// Splits `amount` evenly across `count` participants with no drift.
///
/// The base share is truncating integer division; the remainder
/// (`amount % count`) is handed out one unit at a time to the first
/// participants in creation order, so the returned shares always sum to
/// `amount` exactly.
pub fn split_evenly(amount: Money, count: usize) -> Vec<Money> {
    if count == 0 {
        return Vec::new();
    }

    let count_i64 = count as i64;
    let total = amount.amount();
    let base = total / count_i64;
    let remainder = (total % count_i64).unsigned_abs() as usize;
    let step = total.signum();

    (0..count)
        .map(|idx| {
            let mut share = base;
            if idx < remainder {
                share += step;
            }
            Money::from_i64(share)
        })
        .collect()
}
