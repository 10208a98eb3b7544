use std::cmp::Ordering;

use dotenvy::dotenv;

use lof_premium_alert_bot::alert::premium;
use lof_premium_alert_bot::alert::types::Premium;
use lof_premium_alert_bot::data_ingestion::quote_source::QuoteSourceClient;
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

    let quotes = QuoteSourceClient::new().fetch_quotes().await?;

    // Same ranking as the alert message: premium descending, code ascending;
    // funds without a computable premium sink to the bottom
    let mut results: Vec<_> = quotes.iter().map(premium::compute).collect();
    results.sort_by(|a, b| match (&a.premium, &b.premium) {
        (Premium::Available(x), Premium::Available(y)) => y.cmp(x).then_with(|| a.code.cmp(&b.code)),
        (Premium::Available(_), Premium::Unavailable(_)) => Ordering::Less,
        (Premium::Unavailable(_), Premium::Available(_)) => Ordering::Greater,
        (Premium::Unavailable(_), Premium::Unavailable(_)) => a.code.cmp(&b.code),
    });

    println!("{:<10} {:>10}  {}", "code", "premium", "name");
    for result in &results {
        match &result.premium {
            Premium::Available(rate) => {
                println!("{:<10} {:>9.2}%  {}", result.code, rate, result.name)
            }
            Premium::Unavailable(reason) => {
                println!("{:<10} {:>10}  {} ({})", result.code, "-", result.name, reason)
            }
        }
    }

    Ok(())
}
