use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::alert::types::{QuoteRecord, CN_MARKET_UTC_OFFSET_SECS};

const QUOTE_SOURCE_URL: &str = "https://www.palmmicro.com/woody/res/lofcn.php";

// The listing page serves a stripped-down variant to non-browser agents
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("quote page request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("quote page is missing table #{0}")]
    MissingTable(&'static str),
}

/// Fetches the LOF listing page, one snapshot per run
pub struct QuoteSourceClient {
    http_client: reqwest::Client,
    url: String,
}

impl QuoteSourceClient {
    pub fn new() -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            url: QUOTE_SOURCE_URL.to_string(),
        }
    }

    /// One best-effort fetch of the listing page for this run
    #[instrument(skip(self))]
    pub async fn fetch_quotes(&self) -> Result<Vec<QuoteRecord>, ScrapeError> {
        let response = self.http_client.get(&self.url).send().await?.error_for_status()?;
        let html = response.text().await?;
        let quotes = parse_quote_page(&html, Utc::now())?;
        debug!(fund_count = quotes.len(), "Parsed quote snapshot");
        Ok(quotes)
    }
}

impl Default for QuoteSourceClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the listing page into quote records. The reference table carries
/// traded prices, the estimation table carries official NAV estimates; rows
/// join on the exchange-prefixed fund code. Unparsable price/NAV cells
/// become `None`, never a silent zero.
pub fn parse_quote_page(html: &str, scraped_at: DateTime<Utc>) -> Result<Vec<QuoteRecord>, ScrapeError> {
    let document = Html::parse_document(html);

    let reference_table = Selector::parse("table#referencetable").expect("static selector");
    let estimation_table = Selector::parse("table#estimationtable").expect("static selector");
    let row_selector = Selector::parse("tr").expect("static selector");
    let cell_selector = Selector::parse("td").expect("static selector");

    let reference = document
        .select(&reference_table)
        .next()
        .ok_or(ScrapeError::MissingTable("referencetable"))?;
    let estimation = document
        .select(&estimation_table)
        .next()
        .ok_or(ScrapeError::MissingTable("estimationtable"))?;

    // NAV estimates keyed by code; an estimation row with a blank NAV cell
    // still claims its code
    let mut navs: HashMap<String, Option<Decimal>> = HashMap::new();
    for row in estimation.select(&row_selector) {
        let cells = cell_texts(&row, &cell_selector);
        if cells.len() < 4 || !is_fund_code(&cells[0]) {
            continue;
        }
        navs.insert(cells[0].clone(), parse_decimal(&cells[1]));
    }

    let mut records: Vec<QuoteRecord> = Vec::new();
    let mut priced_codes: HashSet<String> = HashSet::new();
    for row in reference.select(&row_selector) {
        let cells = cell_texts(&row, &cell_selector);
        if cells.len() < 6 || !is_fund_code(&cells[0]) {
            continue;
        }
        let code = cells[0].clone();
        priced_codes.insert(code.clone());
        records.push(QuoteRecord {
            market_price: parse_decimal(&cells[1]),
            nav: navs.get(&code).copied().flatten(),
            observed_at: parse_observed_at(&cells[3], &cells[4]).unwrap_or(scraped_at),
            name: cells[5].clone(),
            code,
        });
    }

    // Funds present only in the estimation table still flow through the
    // pipeline; they surface downstream as missing-price exclusions
    for (code, nav) in navs {
        if !priced_codes.contains(&code) {
            records.push(QuoteRecord {
                code,
                name: String::new(),
                market_price: None,
                nav,
                observed_at: scraped_at,
            });
        }
    }

    Ok(dedupe_by_latest(records))
}

/// Duplicate codes keep the most recently observed row; on equal timestamps
/// the later row wins. Output is sorted by code for a reproducible run.
pub fn dedupe_by_latest(records: Vec<QuoteRecord>) -> Vec<QuoteRecord> {
    let mut latest: BTreeMap<String, QuoteRecord> = BTreeMap::new();
    for record in records {
        match latest.get(&record.code) {
            Some(existing) if existing.observed_at > record.observed_at => {}
            _ => {
                latest.insert(record.code.clone(), record);
            }
        }
    }
    latest.into_values().collect()
}

/// Rows with codes that do not look like exchange-listed funds are page
/// furniture (headers, section breaks), not data
fn is_fund_code(code: &str) -> bool {
    code.len() >= 6 && (code.starts_with("SH") || code.starts_with("SZ"))
}

fn cell_texts(row: &ElementRef<'_>, cell_selector: &Selector) -> Vec<String> {
    row.select(cell_selector)
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .collect()
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let cleaned = raw.trim().trim_end_matches('%');
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    Decimal::from_str(cleaned).ok()
}

/// The feed reports mainland-market local time
fn parse_observed_at(date: &str, time: &str) -> Option<DateTime<Utc>> {
    let raw = format!("{} {}", date.trim(), time.trim());
    let naive = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&raw, format).ok())?;
    FixedOffset::east_opt(CN_MARKET_UTC_OFFSET_SECS)?
        .from_local_datetime(&naive)
        .single()
        .map(|observed| observed.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE_PAGE: &str = r#"
<html><body>
<table id="referencetable">
<tr><th>Code</th><th>Price</th><th>Change</th><th>Date</th><th>Time</th><th>Name</th></tr>
<tr><td>SH501300</td><td>1.05</td><td>1.20%</td><td>2025-01-15</td><td>14:55:00</td><td>Hwabao Oil Gas LOF</td></tr>
<tr><td>SZ161128</td><td></td><td>-</td><td>2025-01-15</td><td>14:50:00</td><td>SP Info Tech LOF</td></tr>
<tr><td>SZ159901</td><td>2.10</td><td>0.00%</td><td>2025-01-15</td><td>09:30:00</td><td>Shenzhen 100</td></tr>
<tr><td>SZ159901</td><td>2.20</td><td>0.48%</td><td>2025-01-15</td><td>14:59:00</td><td>Shenzhen 100</td></tr>
<tr><td>Section</td><td colspan="5">Money market funds</td></tr>
</table>
<table id="estimationtable">
<tr><th>Code</th><th>NAV</th><th>Date</th><th>Premium</th></tr>
<tr><td>SH501300</td><td>1.00</td><td>2025-01-14</td><td>5.00%</td></tr>
<tr><td>SZ161128</td><td>1.234</td><td>2025-01-14</td><td></td></tr>
<tr><td>SZ159901</td><td>0</td><td>2025-01-14</td><td></td></tr>
<tr><td>SH513500</td><td>1.50</td><td>2025-01-14</td><td></td></tr>
</table>
</body></html>
"#;

    fn find<'a>(records: &'a [QuoteRecord], code: &str) -> &'a QuoteRecord {
        records.iter().find(|record| record.code == code).unwrap()
    }

    #[test]
    fn joins_price_and_nav_tables_on_code() {
        let records = parse_quote_page(SAMPLE_PAGE, Utc::now()).unwrap();
        assert_eq!(records.len(), 4);

        let fund = find(&records, "SH501300");
        assert_eq!(fund.market_price, Some(dec!(1.05)));
        assert_eq!(fund.nav, Some(dec!(1.00)));
        assert_eq!(fund.name, "Hwabao Oil Gas LOF");
    }

    #[test]
    fn blank_price_cells_stay_absent() {
        let records = parse_quote_page(SAMPLE_PAGE, Utc::now()).unwrap();
        let fund = find(&records, "SZ161128");
        assert_eq!(fund.market_price, None);
        assert_eq!(fund.nav, Some(dec!(1.234)));
    }

    #[test]
    fn duplicate_codes_keep_the_most_recent_row() {
        let records = parse_quote_page(SAMPLE_PAGE, Utc::now()).unwrap();
        let fund = find(&records, "SZ159901");
        assert_eq!(fund.market_price, Some(dec!(2.20)));
        // 14:59 Beijing is 06:59 UTC
        assert_eq!(fund.observed_at, Utc.with_ymd_and_hms(2025, 1, 15, 6, 59, 0).unwrap());
    }

    #[test]
    fn estimation_only_funds_are_kept_without_a_price() {
        let records = parse_quote_page(SAMPLE_PAGE, Utc::now()).unwrap();
        let fund = find(&records, "SH513500");
        assert_eq!(fund.market_price, None);
        assert_eq!(fund.nav, Some(dec!(1.50)));
        assert!(fund.name.is_empty());
    }

    #[test]
    fn output_is_sorted_by_code() {
        let records = parse_quote_page(SAMPLE_PAGE, Utc::now()).unwrap();
        let codes: Vec<&str> = records.iter().map(|record| record.code.as_str()).collect();
        assert_eq!(codes, ["SH501300", "SH513500", "SZ159901", "SZ161128"]);
    }

    #[test]
    fn missing_tables_are_reported() {
        assert!(matches!(
            parse_quote_page("<html><body></body></html>", Utc::now()),
            Err(ScrapeError::MissingTable("referencetable"))
        ));
        assert!(matches!(
            parse_quote_page(r#"<table id="referencetable"></table>"#, Utc::now()),
            Err(ScrapeError::MissingTable("estimationtable"))
        ));
    }

    #[test]
    fn equal_timestamps_let_the_later_row_win() {
        let observed_at = Utc.with_ymd_and_hms(2025, 1, 15, 7, 0, 0).unwrap();
        let record = |price: Decimal| QuoteRecord {
            code: "SZ159901".to_string(),
            name: String::new(),
            market_price: Some(price),
            nav: None,
            observed_at,
        };
        let deduped = dedupe_by_latest(vec![record(dec!(2.10)), record(dec!(2.20))]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].market_price, Some(dec!(2.20)));
    }

    #[test]
    fn decimal_cells_parse_defensively() {
        assert_eq!(parse_decimal(" 1.05 "), Some(dec!(1.05)));
        assert_eq!(parse_decimal("5.00%"), Some(dec!(5.00)));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("-"), None);
        assert_eq!(parse_decimal("n/a"), None);
    }
}
