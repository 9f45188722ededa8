use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::models::ScrapedProduct;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0 Safari/537.36";
const MAX_IMAGES: usize = 10;
const UNTITLED: &str = "Untitled Product";
const NO_DESCRIPTION: &str = "No description found for this product yet.";

lazy_static! {
    static ref PRICE_NUMBER: Regex = Regex::new(r"\d+(?:\.\d+)?").unwrap();
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Please provide a valid http(s) URL.")]
    InvalidUrl,
    #[error("Failed to retrieve the provided product page.")]
    Fetch(String),
    #[error("{message}")]
    Upstream { status: u16, message: String },
}

/// Accepts only absolute http(s) URLs.
pub fn validate_url(candidate: &str) -> Result<Url, ScrapeError> {
    let url = Url::parse(candidate.trim()).map_err(|_| ScrapeError::InvalidUrl)?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(ScrapeError::InvalidUrl),
    }
}

#[async_trait]
pub trait ProductScraper: Send + Sync {
    async fn scrape(&self, url: &Url) -> Result<ScrapedProduct, ScrapeError>;
}

pub struct HttpScraper {
    client: Client,
}

impl HttpScraper {
    pub fn new(timeout: Duration) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ScrapeError::Fetch(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ProductScraper for HttpScraper {
    async fn scrape(&self, url: &Url) -> Result<ScrapedProduct, ScrapeError> {
        info!(%url, "🔎 Scraping product page");
        let response = self.client.get(url.clone()).send().await.map_err(|e| ScrapeError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = status.canonical_reason().unwrap_or("Failed to retrieve the provided product page.").to_string();
            return Err(ScrapeError::Upstream { status: status.as_u16(), message });
        }

        let html = response.text().await.map_err(|e| ScrapeError::Fetch(e.to_string()))?;
        let product = extract_product_details(&html, url);
        info!(title = %product.title, images = product.images.len(), price = product.price, "✅ Scraped product page");
        Ok(product)
    }
}

/// Pulls title, description, price and images out of a product page.
pub fn extract_product_details(html: &str, page_url: &Url) -> ScrapedProduct {
    let document = Html::parse_document(html);

    let title = first_non_empty([
        meta_content(&document, r#"meta[property="og:title"]"#),
        meta_content(&document, r#"meta[name="twitter:title"]"#),
        element_text(&document, "title"),
    ])
    .unwrap_or_else(|| UNTITLED.to_string());

    let description = first_non_empty([
        meta_content(&document, r#"meta[property="og:description"]"#),
        meta_content(&document, r#"meta[name="description"]"#),
        element_text(&document, r#"[itemprop="description"]"#),
    ])
    .unwrap_or_else(|| NO_DESCRIPTION.to_string());

    let price_text = first_non_empty([
        attribute(&document, r#"[itemprop="price"]"#, "content"),
        attribute(&document, "[data-price]", "data-price"),
        element_text(&document, r#"[class*="price"]"#),
        element_text(&document, r#"[id*="price"]"#),
    ])
    .unwrap_or_default();

    ScrapedProduct {
        title,
        description,
        price: parse_price(&price_text),
        images: collect_image_urls(&document, page_url),
        url: page_url.to_string(),
    }
}

/// First unsigned decimal number in the text after dropping commas and
/// whitespace. Never negative.
pub fn parse_price(value: &str) -> f64 {
    let normalized: String = value.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    PRICE_NUMBER
        .find(&normalized)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn collect_image_urls(document: &Html, page_url: &Url) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    candidates.extend(meta_content(document, r#"meta[property="og:image"]"#));
    candidates.extend(meta_content(document, r#"meta[name="twitter:image"]"#));

    if let Ok(selector) = Selector::parse("img") {
        for element in document.select(&selector) {
            for name in ["src", "data-src", "data-lazy-src"] {
                if let Some(src) = element.value().attr(name) {
                    candidates.push(src.to_string());
                }
            }
        }
    }

    let mut seen = HashSet::new();
    candidates
        .iter()
        .map(|src| src.trim())
        .filter(|src| !src.is_empty())
        .filter_map(|src| page_url.join(src).ok())
        .map(|url| url.to_string())
        .filter(|url| seen.insert(url.clone()))
        .take(MAX_IMAGES)
        .collect()
}

fn first_non_empty<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates.into_iter().flatten().map(|c| c.trim().to_string()).find(|c| !c.is_empty())
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    attribute(document, selector, "content")
}

fn attribute(document: &Html, selector: &str, name: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let value = document.select(&selector).next()?.value().attr(name)?;
    debug!(name, value, "matched attribute");
    Some(value.to_string())
}

fn element_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let element = document.select(&selector).next()?;
    Some(element.text().collect::<String>())
}
