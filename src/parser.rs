use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::Deserialize;
use url::Url;

use crate::errors::{Error, Result};
use crate::models::{NO_IMAGE_URL, ProductRecord, ProductUrls};

static PRODUCT_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        r#"a[class="grid-view-item__link grid-view-item__image-container full-width-link"]"#,
    )
    .expect("product link selector is valid")
});

#[derive(Deserialize)]
struct ProductEnvelope {
    product: ProductData,
}

#[derive(Deserialize)]
struct ProductData {
    title: String,
    vendor: String,
    tags: Tags,
    #[serde(default)]
    variants: Vec<Variant>,
    #[serde(default)]
    images: Vec<Image>,
}

// Shopify serves tags either as an array or as one comma-joined string.
#[derive(Deserialize)]
#[serde(untagged)]
enum Tags {
    List(Vec<String>),
    Joined(String),
}

impl Tags {
    fn into_vec(self) -> Vec<String> {
        match self {
            Tags::List(tags) => tags,
            Tags::Joined(joined) => joined
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Price {
    Text(String),
    Number(f64),
}

impl Price {
    fn to_f64(&self) -> Result<f64> {
        match self {
            Price::Number(n) => Ok(*n),
            Price::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| Error::InvalidPrice(text.clone())),
        }
    }
}

#[derive(Deserialize)]
struct Variant {
    price: Price,
    created_at: String,
    updated_at: String,
}

#[derive(Deserialize)]
struct Image {
    src: String,
}

/// Collects the page/data URL pair of every product link on a listing page, in document order.
pub fn parse_product_links(doc: &Html, base: &Url) -> Result<Vec<ProductUrls>> {
    doc.select(&PRODUCT_LINK)
        .filter_map(|link| link.value().attr("href"))
        .map(|href| product_urls(base, href))
        .collect()
}

/// Resolves `href` against `base` and maps the product page onto its `.json` endpoint.
pub fn product_urls(base: &Url, href: &str) -> Result<ProductUrls> {
    let page_url = base.join(href).map_err(|source| Error::InvalidUrl {
        url: href.to_string(),
        source,
    })?;

    let mut data_url = page_url.clone();
    data_url.set_query(None);
    data_url.set_fragment(None);
    let data_path = format!("{}.json", page_url.path().trim_end_matches('/'));
    data_url.set_path(&data_path);

    Ok(ProductUrls {
        page_url: page_url.to_string(),
        data_url: data_url.to_string(),
    })
}

/// Best-effort artist from an album title: "/" is treated as "-", and the text before the first "-" wins.
pub fn derive_artist(title: &str) -> String {
    title
        .replace('/', "-")
        .split('-')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Flattens a product's structured-data body into a record.
pub fn parse_product(body: &str) -> Result<ProductRecord> {
    let ProductEnvelope { product } = serde_json::from_str(body)?;
    let variant = product.variants.first().ok_or(Error::MissingField("variants"))?;

    let image = product
        .images
        .first()
        .map(|image| image.src.clone())
        .unwrap_or_else(|| NO_IMAGE_URL.to_string());

    Ok(ProductRecord {
        artist: derive_artist(&product.title),
        price: variant.price.to_f64()?,
        price_created: variant.created_at.clone(),
        price_updated: variant.updated_at.clone(),
        album: product.title,
        vendor: product.vendor,
        tags: product.tags.into_vec(),
        image,
    })
}
