use rust_decimal::{Decimal, RoundingStrategy};

use super::types::{Premium, PremiumResult, QuoteRecord, UnavailableReason};

/// Premium rates are reported as percentages with two decimal places
const PREMIUM_SCALE: u32 = 2;

/// Premium of market price over NAV, as a percentage. Records without a
/// usable price/NAV pair come back tagged with the reason instead of a
/// rate; this function is total and never fails.
pub fn compute(record: &QuoteRecord) -> PremiumResult {
    let premium = match (record.market_price, record.nav) {
        (None, _) => Premium::Unavailable(UnavailableReason::MissingPrice),
        (Some(_), None) => Premium::Unavailable(UnavailableReason::MissingNav),
        (Some(_), Some(nav)) if nav.is_zero() => Premium::Unavailable(UnavailableReason::ZeroNav),
        (Some(price), Some(nav)) => {
            let rate = (price - nav) / nav * Decimal::ONE_HUNDRED;
            Premium::Available(rate.round_dp_with_strategy(PREMIUM_SCALE, RoundingStrategy::MidpointAwayFromZero))
        }
    };

    PremiumResult {
        code: record.code.clone(),
        name: record.name.clone(),
        premium,
    }
}
