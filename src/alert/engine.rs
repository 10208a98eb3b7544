use std::collections::HashMap;
use std::future::Future;

use chrono::{FixedOffset, Utc};
use futures::future::join_all;
use tracing::{debug, info};

use super::types::{
    AlertCandidate, AlertReport, Premium, QuoteRecord, QuotaStatus, UnavailableReason,
    CN_MARKET_UTC_OFFSET_SECS,
};
use super::{classifier, formatter, premium, selector};
use crate::config::Config;

/// Purchase-quota lookup collaborator. Implementations must absorb their own
/// failures: a fund whose lookup does not resolve is reported as `Unknown`,
/// never as an error that aborts the batch.
pub trait QuotaLookup {
    fn purchase_limit(&self, code: &str) -> impl Future<Output = QuotaStatus>;
}

/// One full alert-decision run over a quote snapshot: premiums, selection,
/// quota enrichment, classification, message. Returns `None` when no fund
/// crosses the threshold, in which case nothing may be delivered.
pub async fn run_alert_engine<Q: QuotaLookup>(
    cfg: &Config,
    quotes: &[QuoteRecord],
    quota: &Q,
) -> Option<AlertReport> {
    info!(fund_count = quotes.len(), "Starting alert engine");

    let results: Vec<_> = quotes.iter().map(premium::compute).collect();

    // Records without a computable premium are excluded from alerting,
    // not treated as failures
    let mut unavailable: HashMap<UnavailableReason, usize> = HashMap::new();
    for result in &results {
        if let Premium::Unavailable(reason) = result.premium {
            *unavailable.entry(reason).or_insert(0) += 1;
        }
    }
    if !unavailable.is_empty() {
        debug!(
            missing_price = unavailable.get(&UnavailableReason::MissingPrice).copied().unwrap_or(0),
            missing_nav = unavailable.get(&UnavailableReason::MissingNav).copied().unwrap_or(0),
            zero_nav = unavailable.get(&UnavailableReason::ZeroNav).copied().unwrap_or(0),
            "Records excluded from alerting"
        );
    }

    let selected = selector::select(&results, cfg.premium_threshold);
    if selected.is_empty() {
        info!(threshold = %cfg.premium_threshold, "No funds at or above threshold");
        return None;
    }
    info!(
        selected_count = selected.len(),
        threshold = %cfg.premium_threshold,
        "Funds selected for notification"
    );

    // Lookups run concurrently and independently; join_all hands the results
    // back in selector order, which the formatter relies on
    let limits = join_all(selected.iter().map(|fund| quota.purchase_limit(&fund.code))).await;

    let candidates: Vec<AlertCandidate> = selected
        .into_iter()
        .zip(limits)
        .map(|(fund, purchase_limit)| {
            let category = classifier::classify(&fund.code, &cfg.prefix_rules);
            AlertCandidate {
                code: fund.code,
                name: fund.name,
                premium_rate: fund.premium_rate,
                category,
                purchase_limit,
            }
        })
        .collect();

    let generated_at = Utc::now()
        .with_timezone(&FixedOffset::east_opt(CN_MARKET_UTC_OFFSET_SECS).expect("static offset"));
    let message = formatter::format_alert_message(&candidates, cfg.premium_threshold, generated_at);

    Some(AlertReport { candidates, message })
}
