use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use eyre::Result;
use governor::{DefaultDirectRateLimiter, Quota};
use nonzero_ext::*;
use regex::Regex;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use tracing::{instrument, warn};

use crate::alert::engine::QuotaLookup;
use crate::alert::types::QuotaStatus;

const FUND_PAGE_BASE_URL: &str = "https://fund.eastmoney.com";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

struct EastmoneyRateLimiter {
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl reqwest_ratelimit::RateLimiter for EastmoneyRateLimiter {
    async fn acquire_permit(&self) {
        self.rate_limiter.until_ready().await;
    }
}

/// Looks up per-fund purchase quotas on the fund detail pages
#[derive(Debug, Clone)]
pub struct QuotaClient {
    http_client: ClientWithMiddleware,
    base_url: String,
}

impl QuotaClient {
    pub fn new() -> Self {
        let reqwest_client = reqwest_middleware::reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        // One request per second; the fund pages throttle faster clients
        let rate_limiter = EastmoneyRateLimiter {
            rate_limiter: Arc::new(DefaultDirectRateLimiter::direct(Quota::per_second(nonzero!(1u32)))),
        };

        let http_client = ClientBuilder::new(reqwest_client)
            .with(reqwest_ratelimit::all(rate_limiter))
            .build();

        Self {
            http_client,
            base_url: FUND_PAGE_BASE_URL.to_string(),
        }
    }

    /// Fetch one fund's detail page and extract its purchase quota.
    /// Single attempt; callers decide how a failure degrades.
    #[instrument(skip(self))]
    pub async fn fetch_limit(&self, code: &str) -> Result<QuotaStatus> {
        let url = format!("{}/{}.html", self.base_url, bare_code(code));
        let response = self.http_client.get(&url).send().await?.error_for_status()?;
        let html = response.text().await?;
        Ok(extract_quota_status(&html))
    }
}

impl Default for QuotaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl QuotaLookup for QuotaClient {
    async fn purchase_limit(&self, code: &str) -> QuotaStatus {
        match self.fetch_limit(code).await {
            Ok(status) => status,
            Err(error) => {
                warn!(code, error = %error, "Purchase limit lookup failed");
                QuotaStatus::Unknown
            }
        }
    }
}

/// The fund pages key on the bare numeric code, without the exchange prefix
fn bare_code(code: &str) -> &str {
    code.strip_prefix("SH")
        .or_else(|| code.strip_prefix("SZ"))
        .unwrap_or(code)
}

/// Extract the purchase quota from a fund detail page. The trade-status
/// cells are checked first; some page variants inline the status elsewhere,
/// so the whole page text is the fallback. No recognizable restriction
/// phrase means purchases are unrestricted.
pub fn extract_quota_status(html: &str) -> QuotaStatus {
    let document = Html::parse_document(html);
    let cell_selector = Selector::parse("span.staticCell").expect("static selector");

    for cell in document.select(&cell_selector) {
        let text: String = cell.text().collect();
        if let Some(status) = quota_status_from_text(&text) {
            return status;
        }
    }

    let page_text = document.root_element().text().collect::<Vec<_>>().join(" ");
    quota_status_from_text(&page_text).unwrap_or(QuotaStatus::Unrestricted)
}

/// Recognize one trade-status phrase. An explicit daily cap is checked
/// before the generic large-order restriction, which may carry its own cap
/// in parentheses.
fn quota_status_from_text(text: &str) -> Option<QuotaStatus> {
    static DAILY_CAP_RE: OnceLock<Regex> = OnceLock::new();
    static PAREN_RE: OnceLock<Regex> = OnceLock::new();
    static AMOUNT_RE: OnceLock<Regex> = OnceLock::new();

    let daily_cap_re = DAILY_CAP_RE
        .get_or_init(|| Regex::new(r"单日累计购买上限([0-9][0-9.,]*[万亿]?)元").expect("static regex"));
    if let Some(captures) = daily_cap_re.captures(text) {
        return Some(match parse_yuan_amount(&captures[1]) {
            Some(amount) => QuotaStatus::DailyLimit(amount),
            None => QuotaStatus::Unknown,
        });
    }

    if text.contains("暂停申购") {
        return Some(QuotaStatus::Suspended);
    }

    if text.contains("限大额") {
        let paren_re = PAREN_RE.get_or_init(|| Regex::new(r"[（(]([^)）]*)[)）]").expect("static regex"));
        let amount_re =
            AMOUNT_RE.get_or_init(|| Regex::new(r"([0-9][0-9.,]*[万亿]?)元").expect("static regex"));
        if let Some(inner) = paren_re.captures(text) {
            if let Some(amount) = amount_re.captures(&inner[1]).and_then(|c| parse_yuan_amount(&c[1])) {
                return Some(QuotaStatus::DailyLimit(amount));
            }
        }
        return Some(QuotaStatus::LargeOrdersRestricted);
    }

    None
}

/// "10.00" → 10, "500万" → 5,000,000, "1.2亿" → 120,000,000
fn parse_yuan_amount(raw: &str) -> Option<Decimal> {
    let cleaned = raw.replace(',', "");
    let (digits, scale) = if let Some(prefix) = cleaned.strip_suffix('万') {
        (prefix, Decimal::from(10_000))
    } else if let Some(prefix) = cleaned.strip_suffix('亿') {
        (prefix, Decimal::from(100_000_000))
    } else {
        (cleaned.as_str(), Decimal::ONE)
    };
    Decimal::from_str(digits.trim()).ok().map(|amount| amount * scale)
}
