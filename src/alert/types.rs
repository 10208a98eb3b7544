use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The upstream listing and fund pages report mainland-market local time (UTC+8)
pub const CN_MARKET_UTC_OFFSET_SECS: i32 = 8 * 3600;

/// One scraped observation for one fund
#[derive(Debug, Clone)]
pub struct QuoteRecord {
    pub code: String,
    pub name: String, // display name from the listing page, may be empty
    pub market_price: Option<Decimal>,
    pub nav: Option<Decimal>,
    pub observed_at: DateTime<Utc>,
}

/// Why a premium rate could not be computed for a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnavailableReason {
    MissingPrice,
    MissingNav,
    ZeroNav,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::MissingPrice => write!(f, "missing price"),
            UnavailableReason::MissingNav => write!(f, "missing NAV"),
            UnavailableReason::ZeroNav => write!(f, "zero NAV"),
        }
    }
}

/// A computed premium rate, or the reason there is none. A record is never
/// silently treated as a zero premium.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Premium {
    Available(Decimal),
    Unavailable(UnavailableReason),
}

/// Outcome of evaluating one QuoteRecord
#[derive(Debug, Clone)]
pub struct PremiumResult {
    pub code: String,
    pub name: String,
    pub premium: Premium,
}

/// A fund kept by the alert selector, in notification order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFund {
    pub code: String,
    pub name: String,
    pub premium_rate: Decimal,
}

/// Whether the fund's structure permits same-day price/NAV arbitrage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryLabel {
    Draggable,
    NonDraggable,
}

impl fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryLabel::Draggable => write!(f, "draggable"),
            CategoryLabel::NonDraggable => write!(f, "non-draggable"),
        }
    }
}

/// One ordered prefix-match rule for the code classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefixRule {
    pub prefix: String,
    pub label: CategoryLabel,
}

/// Purchase quota state reported by the fund detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaStatus {
    /// Per-account daily purchase cap, in yuan
    DailyLimit(Decimal),
    /// New purchases are halted entirely
    Suspended,
    /// Large orders are rejected but no cap amount is published
    LargeOrdersRestricted,
    Unrestricted,
    /// Lookup failed or was not attempted
    Unknown,
}

impl fmt::Display for QuotaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaStatus::DailyLimit(amount) => write!(f, "limit: {} yuan/day", amount),
            QuotaStatus::Suspended => write!(f, "limit: purchase suspended"),
            QuotaStatus::LargeOrdersRestricted => write!(f, "limit: large orders restricted"),
            QuotaStatus::Unrestricted => write!(f, "limit: unrestricted"),
            QuotaStatus::Unknown => write!(f, "limit: unknown"),
        }
    }
}

/// A fund selected for notification, enriched with classifier and quota data
#[derive(Debug, Clone)]
pub struct AlertCandidate {
    pub code: String,
    pub name: String,
    pub premium_rate: Decimal,
    pub category: CategoryLabel,
    pub purchase_limit: QuotaStatus,
}

/// Result of one engine run with at least one fund over threshold
#[derive(Debug, Clone)]
pub struct AlertReport {
    pub candidates: Vec<AlertCandidate>,
    pub message: String,
}
