use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Local, NaiveDateTime};
use log::info;
use serde::Serialize;

use crate::errors::{Error, Result};
use crate::models::ProductRecord;

pub const FILE_PREFIX: &str = "vinilo_stock";

const CSV_HEADER: [&str; 8] = [
    "album",
    "artist",
    "vendor",
    "tags",
    "price",
    "price_created",
    "price_updated",
    "image",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    /// File extension, also used as the subdirectory name under the output root.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(Error::Config("Only csv or json are valid arguments".into())),
        }
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    album: &'a str,
    artist: &'a str,
    vendor: &'a str,
    tags: String,
    price: f64,
    price_created: &'a str,
    price_updated: &'a str,
    image: &'a str,
}

impl<'a> From<&'a ProductRecord> for CsvRow<'a> {
    fn from(record: &'a ProductRecord) -> Self {
        CsvRow {
            album: &record.album,
            artist: &record.artist,
            vendor: &record.vendor,
            tags: list_notation(&record.tags),
            price: record.price,
            price_created: &record.price_created,
            price_updated: &record.price_updated,
            image: &record.image,
        }
    }
}

/// Renders tags as `['a', 'b']`, the notation existing CSV exports use.
fn list_notation(tags: &[String]) -> String {
    let quoted: Vec<String> = tags
        .iter()
        .map(|tag| {
            if tag.contains('\'') && !tag.contains('"') {
                format!("\"{tag}\"")
            } else {
                format!("'{}'", tag.replace('\'', "\\'"))
            }
        })
        .collect();
    format!("[{}]", quoted.join(", "))
}

/// `vinilo_stock_<date>_<time>.<ext>`, with the time's `:` separators replaced by `.`.
pub fn export_file_name(now: NaiveDateTime, format: ExportFormat) -> String {
    let time = now.format("%H:%M:%S").to_string().replace(':', ".");
    format!("{FILE_PREFIX}_{}_{time}.{}", now.format("%Y-%m-%d"), format.extension())
}

/// Writes `stack` to a file named after the current local time, under `root/<ext>/`.
pub fn export(stack: &[ProductRecord], format: ExportFormat, root: &Path) -> Result<PathBuf> {
    export_at(stack, format, root, Local::now().naive_local())
}

pub fn export_at(
    stack: &[ProductRecord],
    format: ExportFormat,
    root: &Path,
    now: NaiveDateTime,
) -> Result<PathBuf> {
    let dir = root.join(format.extension());
    fs::create_dir_all(&dir)?;
    let path = dir.join(export_file_name(now, format));

    match format {
        ExportFormat::Csv => write_csv(stack, &path)?,
        ExportFormat::Json => write_json(stack, &path)?,
    }

    info!("{} exported: {}", format.extension(), path.display());
    Ok(path)
}

fn write_csv(stack: &[ProductRecord], path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(CSV_HEADER)?;
    for record in stack {
        writer.serialize(CsvRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(stack: &[ProductRecord], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(stack)?;
    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}
