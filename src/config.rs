use std::env;
use std::fs;
use std::str::FromStr;

use eyre::{Result, WrapErr, eyre};
use rust_decimal::Decimal;

use crate::alert::classifier;
use crate::alert::types::PrefixRule;

const DEFAULT_WEBHOOK_URL: &str = "https://qyapi.weixin.qq.com/cgi-bin/webhook/send";
const DEFAULT_PREMIUM_THRESHOLD: &str = "5.0";

/// Read-only configuration snapshot for one monitoring run. Built once at
/// startup, never mutated; malformed values fail the run before the
/// pipeline sees any data.
pub struct Config {
    pub premium_threshold: Decimal,
    pub webhook_url: String,
    pub webhook_key: String,
    pub prefix_rules: Vec<PrefixRule>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let raw_threshold =
            env::var("PREMIUM_THRESHOLD").unwrap_or_else(|_| DEFAULT_PREMIUM_THRESHOLD.to_string());
        let premium_threshold = Decimal::from_str(raw_threshold.trim())
            .wrap_err_with(|| format!("PREMIUM_THRESHOLD is not a decimal: {raw_threshold:?}"))?;
        if premium_threshold < Decimal::ZERO {
            return Err(eyre!(
                "PREMIUM_THRESHOLD must be non-negative, got {premium_threshold}"
            ));
        }

        let webhook_url =
            env::var("WECHAT_WEBHOOK_URL").unwrap_or_else(|_| DEFAULT_WEBHOOK_URL.to_string());
        let webhook_key = env::var("WECHAT_WEBHOOK_KEY").wrap_err("Missing WECHAT_WEBHOOK_KEY")?;

        let prefix_rules = match env::var("PREFIX_RULES_PATH") {
            Ok(path) => load_prefix_rules(&path)?,
            Err(_) => classifier::default_rules(),
        };

        Ok(Config {
            premium_threshold,
            webhook_url,
            webhook_key,
            prefix_rules,
        })
    }
}

/// The classification table is data, not code: an ordered JSON array of
/// `{"prefix": ..., "label": "draggable" | "non-draggable"}` entries.
fn load_prefix_rules(path: &str) -> Result<Vec<PrefixRule>> {
    let raw = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read prefix rules file {path}"))?;
    let rules: Vec<PrefixRule> = serde_json::from_str(&raw)
        .wrap_err_with(|| format!("Malformed prefix rules file {path}"))?;
    if rules.is_empty() {
        return Err(eyre!("Prefix rules file {path} contains no rules"));
    }
    Ok(rules)
}
