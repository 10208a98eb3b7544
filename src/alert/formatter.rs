use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;

use super::types::AlertCandidate;

/// At most this many funds are itemized per message; the rest fold into a
/// single overflow line.
const MAX_LISTED_FUNDS: usize = 10;

const DIVIDER_WIDTH: usize = 30;

/// Render the alert message. Candidates must already be in notification
/// order; this function never re-sorts and performs no I/O, and identical
/// input produces the identical string. Callers must not invoke it with an
/// empty candidate list: a quiet day sends nothing at all.
pub fn format_alert_message(
    candidates: &[AlertCandidate],
    threshold: Decimal,
    generated_at: DateTime<FixedOffset>,
) -> String {
    let divider = "─".repeat(DIVIDER_WIDTH);

    let mut message = String::new();
    message.push_str("📈 LOF premium alert\n");
    message.push_str(&divider);
    message.push('\n');
    message.push_str(&format!("threshold: {:.2}%\n", threshold));
    message.push_str(&format!("funds above threshold: {}\n", candidates.len()));
    message.push_str(&divider);
    message.push_str("\n\n");

    for (index, fund) in candidates.iter().take(MAX_LISTED_FUNDS).enumerate() {
        let title = if fund.name.is_empty() {
            fund.code.clone()
        } else {
            format!("{} ({})", fund.name, fund.code)
        };
        message.push_str(&format!("{}. {}\n", index + 1, title));
        message.push_str(&format!("   premium: {}\n", format_signed_rate(fund.premium_rate)));
        message.push_str(&format!("   {} ({})\n", fund.purchase_limit, fund.category));
        message.push('\n');
    }

    if candidates.len() > MAX_LISTED_FUNDS {
        message.push_str(&format!(
            "… and {} more funds above threshold\n\n",
            candidates.len() - MAX_LISTED_FUNDS
        ));
    }

    message.push_str(&divider);
    message.push('\n');
    message.push_str(&format!("🕒 {}\n", generated_at.format("%Y-%m-%d %H:%M")));
    message
}

/// "+5.00%" / "-1.20%": the sign is always explicit
fn format_signed_rate(rate: Decimal) -> String {
    let sign = if rate < Decimal::ZERO { "-" } else { "+" };
    format!("{}{:.2}%", sign, rate.abs())
}
