use dotenvy::dotenv;

use lof_premium_alert_bot::data_ingestion::quota::QuotaClient;
use lof_premium_alert_bot::logging;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logging
    if let Err(e) = logging::init_logging(env!("CARGO_BIN_NAME")) {
        eprintln!("Failed to initialize logging: {}", e);
        return Err(e);
    }

    let code = std::env::args()
        .nth(1)
        .ok_or_else(|| eyre::eyre!("Usage: fund_limit <fund code>"))?;

    let client = QuotaClient::new();
    let status = client.fetch_limit(&code).await?;
    println!("{}: {}", code, status);

    Ok(())
}
