use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use marquee_common::Config;
use marquee_scout::Scout;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("marquee=info".parse()?))
        .init();

    info!("Marquee scout starting...");

    let config = Config::from_env();
    let scout = Scout::new(&config);
    let report = scout.run().await;

    for screening in &report.screenings {
        let date = screening
            .show_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "TBA".to_string());
        let note = screening
            .special_note
            .as_deref()
            .map(|n| format!(" [{n}]"))
            .unwrap_or_default();
        println!("{date}: {} at {}{note}", screening.title, screening.theater);
    }

    info!("Run complete. {}", report.stats);
    Ok(())
}
