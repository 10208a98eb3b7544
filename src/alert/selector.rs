use rust_decimal::Decimal;

use super::types::{Premium, PremiumResult, SelectedFund};

/// Keep funds at or above the threshold, ranked for notification: premium
/// descending, ties by code ascending, so identical input always produces
/// the same message ordering. Unavailable results are dropped here and
/// counted by the caller; they are not failures.
pub fn select(results: &[PremiumResult], threshold: Decimal) -> Vec<SelectedFund> {
    let mut selected: Vec<SelectedFund> = results
        .iter()
        .filter_map(|result| match result.premium {
            Premium::Available(rate) if rate >= threshold => Some(SelectedFund {
                code: result.code.clone(),
                name: result.name.clone(),
                premium_rate: rate,
            }),
            _ => None,
        })
        .collect();

    selected.sort_by(|a, b| b.premium_rate.cmp(&a.premium_rate).then_with(|| a.code.cmp(&b.code)));
    selected
}
