use std::path::PathBuf;

use log::{debug, info};
use url::Url;

use crate::archiver;
use crate::config::Settings;
use crate::errors::{Error, Result};
use crate::fetcher::{Fetch, fetch_document};
use crate::models::{ProductRecord, ProductStack, ProductUrls};
use crate::parser;

/// Listing pages `1..=pages` of the catalog's "all products" view.
pub fn listing_page_urls(base: &Url, pages: u32) -> Result<Vec<String>> {
    (1..=pages)
        .map(|page| {
            let path = format!("/collections/all?page={page}");
            base.join(&path)
                .map(String::from)
                .map_err(|source| Error::InvalidUrl { url: path, source })
        })
        .collect()
}

/// Walks every listing page in order and gathers the product links found on each.
///
/// There is no end-of-catalog detection: pages past the last one just contribute nothing.
pub fn collect_product_urls(
    fetcher: &dyn Fetch,
    page_urls: &[String],
    base: &Url,
) -> Result<Vec<ProductUrls>> {
    let mut product_urls = Vec::new();

    for page_url in page_urls {
        let doc = fetch_document(fetcher, page_url)?;
        let links = parser::parse_product_links(&doc, base)?;
        debug!("{} products on {page_url}", links.len());

        for link in links {
            info!("Saving: {}", link.page_url);
            product_urls.push(link);
        }
    }

    Ok(product_urls)
}

pub fn fetch_product(fetcher: &dyn Fetch, urls: &ProductUrls) -> Result<ProductRecord> {
    let body = fetcher.fetch_text(&urls.data_url)?;
    let product = parser::parse_product(&body)?;
    info!("Saving: ({}, {})", product.artist, product.album);
    Ok(product)
}

/// Runs the whole pipeline once and returns the path of the exported file.
pub fn run(fetcher: &dyn Fetch, settings: &Settings) -> Result<PathBuf> {
    let page_urls = listing_page_urls(&settings.base_url, settings.pages)?;
    let product_urls = collect_product_urls(fetcher, &page_urls, &settings.base_url)?;

    let mut stack = ProductStack::with_capacity(product_urls.len());
    for urls in &product_urls {
        stack.push(fetch_product(fetcher, urls)?);
    }

    archiver::export(&stack, settings.format, &settings.output_dir)
}
