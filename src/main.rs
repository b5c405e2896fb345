mod archiver;
mod config;
mod errors;
mod fetcher;
mod models;
mod parser;
mod scrape;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::{Args, Settings};
use crate::fetcher::HttpFetcher;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::try_from(Args::parse()).context("Invalid configuration")?;
    let fetcher = HttpFetcher::new(settings.timeout, settings.retries)
        .context("Failed to build HTTP client")?
        .with_retry_delay(settings.retry_delay);

    let path = scrape::run(&fetcher, &settings).context("Scrape failed")?;
    println!("Stock exported to {}", path.display());
    Ok(())
}
