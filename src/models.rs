use serde::{Deserialize, Serialize};

pub const NO_IMAGE_URL: &str = "No Image Url";

/// A product's human-facing page and its `.json` structured-data endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductUrls {
    pub page_url: String,
    pub data_url: String,
}

/// One flattened catalog item. Field order is the export column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub album: String,
    pub artist: String,
    pub vendor: String,
    pub tags: Vec<String>,
    pub price: f64,
    pub price_created: String,
    pub price_updated: String,
    pub image: String,
}

pub type ProductStack = Vec<ProductRecord>;
