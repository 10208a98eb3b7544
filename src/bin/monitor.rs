use dotenvy::dotenv;
use tracing::{error, info};

use lof_premium_alert_bot::alert::engine;
use lof_premium_alert_bot::config;
use lof_premium_alert_bot::data_ingestion::quota::QuotaClient;
use lof_premium_alert_bot::data_ingestion::quote_source::QuoteSourceClient;
use lof_premium_alert_bot::logging;
use lof_premium_alert_bot::notify::wechat::WeChatClient;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logging
    if let Err(e) = logging::init_logging(env!("CARGO_BIN_NAME")) {
        eprintln!("Failed to initialize logging: {}", e);
        return Err(e);
    }

    // Load configuration
    let cfg = config::Config::load()?;
    info!(threshold = %cfg.premium_threshold, "Configuration loaded and logging initialized");

    // Fetch the quote snapshot for this run
    let quote_client = QuoteSourceClient::new();
    let quotes = quote_client.fetch_quotes().await?;
    info!(fund_count = quotes.len(), "Quote snapshot fetched");

    // Run the alert pipeline; quota lookups go through the rate-limited client
    let quota_client = QuotaClient::new();
    match engine::run_alert_engine(&cfg, &quotes, &quota_client).await {
        Some(report) => {
            info!(alert_count = report.candidates.len(), "Premium alerts raised, delivering notification");

            // Delivery is fire-and-forget: a failed send never fails the run
            let wechat = WeChatClient::new(&cfg);
            if let Err(e) = wechat.send_text(&report.message).await {
                error!(error = %e, "Failed to deliver alert notification");
            }
        }
        None => {
            info!("No premium alerts today, notification suppressed");
        }
    }

    Ok(())
}
