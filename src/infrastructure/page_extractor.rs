//! Generic product-page extraction.
//!
//! Storefront markup varies wildly, so extraction works through a cascade:
//! schema.org JSON-LD first, Open Graph and product meta tags next,
//! configurable CSS selector heuristics last. The first layer that answers
//! wins per field, and missing optional fields degrade to neutral defaults
//! instead of failing the page.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::errors::ExtractionError;
use crate::domain::product::{Price, Rating, RawExtraction};
use crate::domain::services::ContentExtractor;
use crate::domain::value_objects::ProductUrl;
use crate::infrastructure::http_client::{FetchError, HttpClient};

/// CSS selector sets for the heuristic fallback layer.
///
/// Selector lists are comma-joined alternatives tried in order; vendor
/// variants can swap these without touching the extractor itself.
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    pub title: String,
    pub price: String,
    pub description: String,
    pub images: String,
    pub rating_value: String,
    pub rating_count: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            title: "h1, .product-title, .product-name, [itemprop='name']".to_string(),
            price: "[itemprop='price'], .price, .product-price, .price-current, [class*='price']"
                .to_string(),
            description:
                "[itemprop='description'], .product-description, .description, #description"
                    .to_string(),
            images: ".product-image img, .gallery img, [itemprop='image'], .product-gallery img"
                .to_string(),
            rating_value: "[itemprop='ratingValue'], .rating-value, .stars-rating".to_string(),
            rating_count: "[itemprop='reviewCount'], .rating-count, .review-count".to_string(),
        }
    }
}

/// Vendor-agnostic [`ContentExtractor`] over heterogeneous product markup.
pub struct PageExtractor {
    http: Arc<HttpClient>,
    selectors: SelectorConfig,
}

impl PageExtractor {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self::with_selectors(http, SelectorConfig::default())
    }

    pub fn with_selectors(http: Arc<HttpClient>, selectors: SelectorConfig) -> Self {
        Self { http, selectors }
    }
}

#[async_trait]
impl ContentExtractor for PageExtractor {
    async fn extract(
        &self,
        url: &ProductUrl,
        cancel: &CancellationToken,
    ) -> Result<RawExtraction, ExtractionError> {
        let body = self
            .http
            .get_text(url.as_str(), cancel)
            .await
            .map_err(map_fetch_error)?;

        let extraction = parse_product_page(&body, url, &self.selectors);
        if !extraction.has_product_fields() {
            return Err(ExtractionError::NoProductData {
                url: url.to_string(),
            });
        }

        debug!(
            url = %url,
            title = extraction.title.as_deref().unwrap_or("-"),
            has_price = extraction.price.is_some(),
            images = extraction.images.len(),
            "extracted product fields"
        );
        Ok(extraction)
    }
}

fn map_fetch_error(err: FetchError) -> ExtractionError {
    match err {
        FetchError::Blocked { status } => ExtractionError::Blocked { status },
        FetchError::Timeout { timeout_secs } => ExtractionError::Timeout { timeout_secs },
        FetchError::Cancelled => ExtractionError::Cancelled,
        FetchError::Status { status } => ExtractionError::Fetch {
            message: format!("unexpected status {status}"),
        },
        FetchError::Transport { message } => ExtractionError::Fetch { message },
    }
}

/// Parses product fields out of fetched HTML.
///
/// Synchronous on purpose: the parsed DOM never crosses an await point.
fn parse_product_page(body: &str, url: &ProductUrl, selectors: &SelectorConfig) -> RawExtraction {
    let document = Html::parse_document(body);
    let json_ld = find_json_ld_product(&document);

    let title = json_ld
        .as_ref()
        .and_then(jsonld_name)
        .or_else(|| meta_content(&document, "meta[property='og:title']"))
        .or_else(|| select_text(&document, &selectors.title));

    let price = json_ld
        .as_ref()
        .and_then(jsonld_price)
        .or_else(|| meta_price(&document))
        .or_else(|| {
            select_text(&document, &selectors.price).and_then(|text| parse_display_price(&text))
        });

    let description = json_ld
        .as_ref()
        .and_then(|node| string_field(node, "description"))
        .or_else(|| meta_content(&document, "meta[property='og:description']"))
        .or_else(|| meta_content(&document, "meta[name='description']"))
        .or_else(|| select_text(&document, &selectors.description));

    let rating = json_ld
        .as_ref()
        .and_then(jsonld_rating)
        .or_else(|| heuristic_rating(&document, selectors));

    let images = collect_images(&document, json_ld.as_ref(), url, selectors);

    RawExtraction {
        source_url: url.to_string(),
        title,
        price,
        images,
        description,
        rating,
    }
}

/// Finds the first schema.org Product node across all JSON-LD scripts,
/// descending into arrays and `@graph` containers.
fn find_json_ld_product(document: &Html) -> Option<serde_json::Value> {
    let selector = Selector::parse("script[type='application/ld+json']").ok()?;
    for script in document.select(&selector) {
        let text: String = script.text().collect();
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) else {
            continue;
        };
        if let Some(product) = locate_product_node(&value) {
            return Some(product.clone());
        }
    }
    None
}

fn locate_product_node(value: &serde_json::Value) -> Option<&serde_json::Value> {
    match value {
        serde_json::Value::Array(items) => items.iter().find_map(locate_product_node),
        serde_json::Value::Object(map) => {
            if map.get("@type").is_some_and(is_product_type) {
                return Some(value);
            }
            map.get("@graph").and_then(locate_product_node)
        }
        _ => None,
    }
}

fn is_product_type(type_field: &serde_json::Value) -> bool {
    match type_field {
        serde_json::Value::String(s) => s.eq_ignore_ascii_case("product"),
        serde_json::Value::Array(items) => items.iter().any(is_product_type),
        _ => false,
    }
}

fn jsonld_name(node: &serde_json::Value) -> Option<String> {
    string_field(node, "name")
}

fn jsonld_price(node: &serde_json::Value) -> Option<Price> {
    let offers = node.get("offers")?;
    let offer = match offers {
        serde_json::Value::Array(items) => items.first()?,
        other => other,
    };

    let amount = offer
        .get("price")
        .or_else(|| offer.get("lowPrice"))
        .and_then(numeric_value)?;
    let currency = offer
        .get("priceCurrency")
        .and_then(serde_json::Value::as_str)
        .map_or_else(|| "USD".to_string(), ToString::to_string);

    Some(Price { amount, currency })
}

fn jsonld_rating(node: &serde_json::Value) -> Option<Rating> {
    let aggregate = node.get("aggregateRating")?;
    let value = aggregate.get("ratingValue").and_then(numeric_value)?;
    let count = aggregate
        .get("reviewCount")
        .or_else(|| aggregate.get("ratingCount"))
        .and_then(numeric_value)
        .map(|n| n as u32);
    Some(Rating { value, count })
}

fn jsonld_images(node: &serde_json::Value) -> Vec<String> {
    match node.get("image") {
        Some(serde_json::Value::String(s)) => vec![s.clone()],
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Object(map) => map
                    .get("url")
                    .and_then(serde_json::Value::as_str)
                    .map(ToString::to_string),
                _ => None,
            })
            .collect(),
        Some(serde_json::Value::Object(map)) => map
            .get("url")
            .and_then(serde_json::Value::as_str)
            .map(|s| vec![s.to_string()])
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn string_field(node: &serde_json::Value, field: &str) -> Option<String> {
    node.get(field)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Accepts both JSON numbers and numeric strings ("19.99").
fn numeric_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => normalize_amount(s),
        _ => None,
    }
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let parsed = Selector::parse(selector).ok()?;
    document
        .select(&parsed)
        .next()?
        .value()
        .attr("content")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn meta_price(document: &Html) -> Option<Price> {
    let amount = meta_content(document, "meta[property='product:price:amount']")
        .or_else(|| meta_content(document, "meta[itemprop='price']"))
        .and_then(|text| normalize_amount(&text))?;
    let currency = meta_content(document, "meta[property='product:price:currency']")
        .or_else(|| meta_content(document, "meta[itemprop='priceCurrency']"))
        .unwrap_or_else(|| "USD".to_string());
    Some(Price { amount, currency })
}

/// Extracts trimmed text for the first element matching the selector list.
fn select_text(document: &Html, selector: &str) -> Option<String> {
    let parsed = Selector::parse(selector).ok()?;
    document
        .select(&parsed)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

fn heuristic_rating(document: &Html, selectors: &SelectorConfig) -> Option<Rating> {
    let value = select_text(document, &selectors.rating_value)
        .and_then(|text| normalize_amount(&text))?;
    let count = select_text(document, &selectors.rating_count)
        .and_then(|text| normalize_amount(&text))
        .map(|n| n as u32);
    Some(Rating { value, count })
}

fn collect_images(
    document: &Html,
    json_ld: Option<&serde_json::Value>,
    url: &ProductUrl,
    selectors: &SelectorConfig,
) -> Vec<String> {
    let mut candidates: Vec<String> = json_ld.map(jsonld_images).unwrap_or_default();

    if candidates.is_empty() {
        if let Ok(selector) = Selector::parse("meta[property='og:image']") {
            candidates.extend(
                document
                    .select(&selector)
                    .filter_map(|element| element.value().attr("content"))
                    .map(ToString::to_string),
            );
        }
    }

    if candidates.is_empty() {
        if let Ok(selector) = Selector::parse(&selectors.images) {
            candidates.extend(
                document
                    .select(&selector)
                    .filter_map(|element| {
                        element
                            .value()
                            .attr("src")
                            .or_else(|| element.value().attr("data-src"))
                    })
                    .map(ToString::to_string),
            );
        }
    }

    // Resolve relative references and drop duplicates, keeping page order.
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter_map(|href| url.resolve(&href))
        .filter(|resolved| seen.insert(resolved.clone()))
        .collect()
}

lazy_static! {
    static ref AMOUNT_RE: Regex =
        Regex::new(r"\d{1,3}(?:[,.\s]\d{3})*(?:[.,]\d{1,2})?|\d+").expect("valid amount regex");
    static ref CURRENCY_CODE_RE: Regex =
        Regex::new(r"\b(USD|EUR|GBP|JPY|CAD|AUD|INR|PLN|SEK|CHF)\b").expect("valid code regex");
}

/// Parses a displayed price ("$1,199.00", "1.199,00 EUR") into a tagged
/// amount. Returns `None` when no digits are present.
fn parse_display_price(text: &str) -> Option<Price> {
    let amount = AMOUNT_RE.find(text).and_then(|m| normalize_amount(m.as_str()))?;
    let currency = detect_currency(text).unwrap_or_else(|| "USD".to_string());
    Some(Price { amount, currency })
}

fn detect_currency(text: &str) -> Option<String> {
    const SYMBOLS: &[(&str, &str)] = &[
        ("$", "USD"),
        ("€", "EUR"),
        ("£", "GBP"),
        ("¥", "JPY"),
        ("₹", "INR"),
    ];
    for (symbol, code) in SYMBOLS {
        if text.contains(symbol) {
            return Some((*code).to_string());
        }
    }
    CURRENCY_CODE_RE
        .find(text)
        .map(|m| m.as_str().to_string())
}

/// Normalizes separator conventions: the last '.' or ',' followed by one or
/// two digits is the decimal point, every other separator is grouping.
fn normalize_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }

    let separators: Vec<usize> = cleaned
        .char_indices()
        .filter(|&(_, c)| c == '.' || c == ',')
        .map(|(i, _)| i)
        .collect();

    let normalized = match separators.last() {
        None => cleaned,
        Some(&last) => {
            let decimals = cleaned.len() - last - 1;
            let decimal_sep = (1..=2).contains(&decimals);
            cleaned
                .char_indices()
                .filter_map(|(i, c)| match c {
                    '.' | ',' if i == last && decimal_sep => Some('.'),
                    '.' | ',' => None,
                    _ => Some(c),
                })
                .collect()
        }
    };

    normalized.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> ProductUrl {
        ProductUrl::parse("https://shop.example/item/42").unwrap()
    }

    #[test]
    fn extracts_from_json_ld() {
        let html = r#"
            <html><head>
            <script type="application/ld+json">
            {
                "@context": "https://schema.org",
                "@type": "Product",
                "name": "Smart Kettle",
                "description": "Boils water on a schedule",
                "image": ["https://cdn.example/kettle-front.jpg", "/img/kettle-side.jpg"],
                "offers": { "@type": "Offer", "price": "59.90", "priceCurrency": "EUR" },
                "aggregateRating": { "ratingValue": 4.4, "reviewCount": 210 }
            }
            </script>
            </head><body><h1>ignored</h1></body></html>
        "#;

        let extraction = parse_product_page(html, &page_url(), &SelectorConfig::default());
        assert_eq!(extraction.title.as_deref(), Some("Smart Kettle"));

        let price = extraction.price.unwrap();
        assert_eq!(price.amount, 59.90);
        assert_eq!(price.currency, "EUR");

        let rating = extraction.rating.unwrap();
        assert_eq!(rating.value, 4.4);
        assert_eq!(rating.count, Some(210));

        assert_eq!(
            extraction.images,
            vec![
                "https://cdn.example/kettle-front.jpg".to_string(),
                "https://shop.example/img/kettle-side.jpg".to_string(),
            ]
        );
    }

    #[test]
    fn extracts_product_inside_graph_container() {
        let html = r#"
            <script type="application/ld+json">
            { "@graph": [
                { "@type": "BreadcrumbList" },
                { "@type": "Product", "name": "Desk Lamp",
                  "offers": { "price": 24, "priceCurrency": "USD" } }
            ] }
            </script>
        "#;

        let extraction = parse_product_page(html, &page_url(), &SelectorConfig::default());
        assert_eq!(extraction.title.as_deref(), Some("Desk Lamp"));
        assert_eq!(extraction.price.unwrap().amount, 24.0);
    }

    #[test]
    fn falls_back_to_open_graph_meta() {
        let html = r#"
            <html><head>
            <meta property="og:title" content="Trail Backpack 40L" />
            <meta property="og:image" content="https://cdn.example/pack.jpg" />
            <meta property="product:price:amount" content="129.95" />
            <meta property="product:price:currency" content="USD" />
            </head><body></body></html>
        "#;

        let extraction = parse_product_page(html, &page_url(), &SelectorConfig::default());
        assert_eq!(extraction.title.as_deref(), Some("Trail Backpack 40L"));
        assert_eq!(extraction.price.unwrap().amount, 129.95);
        assert_eq!(extraction.images, vec!["https://cdn.example/pack.jpg"]);
        assert_eq!(extraction.rating, None);
    }

    #[test]
    fn falls_back_to_css_heuristics() {
        let html = r#"
            <html><body>
                <h1>Mechanical Keyboard</h1>
                <span class="product-price">$89.00</span>
                <div class="product-description">Clicky switches.</div>
            </body></html>
        "#;

        let extraction = parse_product_page(html, &page_url(), &SelectorConfig::default());
        assert_eq!(extraction.title.as_deref(), Some("Mechanical Keyboard"));

        let price = extraction.price.unwrap();
        assert_eq!(price.amount, 89.0);
        assert_eq!(price.currency, "USD");
        assert_eq!(extraction.description.as_deref(), Some("Clicky switches."));
    }

    #[test]
    fn page_without_title_or_price_has_no_product_fields() {
        let html = "<html><body><p>404 - nothing here</p></body></html>";
        let extraction = parse_product_page(html, &page_url(), &SelectorConfig::default());
        assert!(!extraction.has_product_fields());
    }

    #[test]
    fn display_price_parsing_handles_separator_conventions() {
        assert_eq!(parse_display_price("$1,199.00").unwrap().amount, 1199.0);
        assert_eq!(parse_display_price("1.199,00 EUR").unwrap().amount, 1199.0);
        assert_eq!(parse_display_price("£49").unwrap().currency, "GBP");
        assert_eq!(parse_display_price("49,90 zł").unwrap().amount, 49.90);
        assert!(parse_display_price("call for price").is_none());
    }

    #[test]
    fn fetch_errors_map_to_extraction_errors() {
        assert!(matches!(
            map_fetch_error(FetchError::Blocked { status: 429 }),
            ExtractionError::Blocked { status: 429 }
        ));
        assert!(matches!(
            map_fetch_error(FetchError::Timeout { timeout_secs: 30 }),
            ExtractionError::Timeout { timeout_secs: 30 }
        ));
        assert!(matches!(
            map_fetch_error(FetchError::Status { status: 500 }),
            ExtractionError::Fetch { .. }
        ));
    }
}
