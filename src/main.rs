use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use feedreel::api::FeedApi;
use feedreel::config::Config;
use feedreel::player::select_transport;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("feedreel=debug")),
        )
        .init();

    info!("Starting feedreel");

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load_from(&PathBuf::from(path))?,
        None => Config::load()?,
    };

    let api = FeedApi::new(&config.feed).context("Failed to create feed client")?;
    let page = api
        .fetch_page()
        .await
        .with_context(|| format!("Failed to fetch videos from {}", api.endpoint()))?;

    println!("{} videos ({} available)", page.data.len(), page.total);
    for record in &page.data {
        let with_engine = select_transport(record, true, false);
        let native_only = select_transport(record, false, true);
        println!(
            "{:>8}  engine: {:<16} native: {:<16} {}",
            record.id.get(),
            with_engine,
            native_only,
            record.display_text()
        );
    }

    Ok(())
}
