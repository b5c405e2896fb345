use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::archiver::ExportFormat;
use crate::errors::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://vinilo.co.uk";
pub const DEFAULT_PAGES: u32 = 129;

#[derive(Parser, Debug)]
#[command(name = "vinilo_stock_scraper")]
#[command(version, about = "Scrape the Vinilo record store catalog to CSV or JSON", long_about = None)]
pub struct Args {
    /// Number of listing pages to walk, starting at page 1
    #[arg(long, default_value_t = DEFAULT_PAGES)]
    pub pages: u32,

    /// Export format: csv or json
    #[arg(long, default_value = "csv")]
    pub format: ExportFormat,

    /// Root directory; files land in its csv/ or json/ subdirectory
    #[arg(long, default_value = "vinilo")]
    pub output_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Extra attempts for a failed request
    #[arg(long, default_value_t = 2)]
    pub retries: u32,

    /// Seconds to wait before retrying
    #[arg(long, default_value_t = 1)]
    pub retry_delay: u64,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: Url,
    pub pages: u32,
    pub format: ExportFormat,
    pub output_dir: PathBuf,
    pub timeout: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
}

impl TryFrom<Args> for Settings {
    type Error = Error;

    fn try_from(args: Args) -> Result<Self> {
        let base_url = Url::parse(&args.base_url).map_err(|source| Error::InvalidUrl {
            url: args.base_url.clone(),
            source,
        })?;

        Ok(Settings {
            base_url,
            pages: args.pages,
            format: args.format,
            output_dir: args.output_dir,
            timeout: Duration::from_secs(args.timeout),
            retries: args.retries,
            retry_delay: Duration::from_secs(args.retry_delay),
        })
    }
}
