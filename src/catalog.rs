use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("no products found in search results")]
    NoResults,
    #[error("product {0} missing from presentation response")]
    MissingProduct(String),
}

/// Normalized product record from the presentation API.
#[derive(Debug, Clone, Default)]
pub struct ProductInfo {
    pub product_id: String,
    pub title: String,
    pub brand: String,
    pub price: Option<f64>,
    pub original_price: Option<f64>,
    pub features: Vec<String>,
    pub images: Vec<String>,
    pub canonical_url: String,
}

/// Client for the QVC UK catalog: keyword search over the storefront HTML and
/// product detail from the presentation API.
pub struct CatalogClient {
    client: reqwest::Client,
    search_base: String,
    api_base: String,
}

impl CatalogClient {
    pub fn new(search_base: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            search_base: search_base.into(),
            api_base: api_base.into(),
        }
    }

    pub fn from_env() -> Self {
        let search_base = std::env::var("QVC_SEARCH_BASE")
            .unwrap_or_else(|_| "https://www.qvcuk.com".to_string());
        let api_base =
            std::env::var("QVC_API_BASE").unwrap_or_else(|_| "https://api.qvc.com".to_string());
        Self::new(search_base, api_base)
    }

    /// Keyword search; returns the first matching product id and its page URL.
    pub async fn search(
        &self,
        title: &str,
        features: &[String],
    ) -> Result<(String, String), CatalogError> {
        let url = format!(
            "{}/catalog/search.html?keyword={}",
            self.search_base,
            search_query(title, features)
        );
        info!(%url, "searching catalog");
        let html = self.fetch_text(&url).await?;
        first_product(&html).ok_or(CatalogError::NoResults)
    }

    /// Full product record: core fields plus features harvested from the long
    /// description and any attachment info pages, and absolutized image URLs.
    pub async fn product_info(&self, product_id: &str) -> Result<ProductInfo, CatalogError> {
        let url = format!(
            "{}/api/sales/presentation/v3/uk/products/list/{}?response-depth=full",
            self.api_base, product_id
        );
        info!(%url, "fetching product info");
        let body = self.fetch_text(&url).await?;
        let data: Value = serde_json::from_str(&body)
            .map_err(|e| CatalogError::Http(format!("presentation parse error: {e}")))?;
        let product = data
            .get("products")
            .and_then(|p| p.get(product_id))
            .ok_or_else(|| CatalogError::MissingProduct(product_id.to_string()))?;

        let mut info = extract_product(product_id, product);

        // Attachment pages carry extra selling points; failures here are non-fatal.
        for attachment_url in attachment_urls(product) {
            match self.fetch_text(&attachment_url).await {
                Ok(html) => info.features.extend(attachment_features(&html)),
                Err(e) => error!(url = %attachment_url, error = %e, "failed to fetch attachment info"),
            }
        }

        Ok(info)
    }

    async fn fetch_text(&self, url: &str) -> Result<String, CatalogError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::Http(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Http(format!("{url} returned {status}")));
        }
        response
            .text()
            .await
            .map_err(|e| CatalogError::Http(e.to_string()))
    }
}

/// Title and features joined with `+`; spaces inside a feature become dashes.
fn search_query(title: &str, features: &[String]) -> String {
    let mut parts = vec![title.to_string()];
    parts.extend(
        features
            .iter()
            .map(|f| f.split_whitespace().collect::<Vec<_>>().join("-")),
    );
    parts.join("+")
}

/// First product anchor on the search results page.
fn first_product(html: &str) -> Option<(String, String)> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[data-prod-id]").ok()?;
    let link = document.select(&selector).next()?;
    let id = link.value().attr("data-prod-id")?.to_string();
    let href = link.value().attr("href").unwrap_or_default().to_string();
    Some((id, href))
}

fn extract_product(id: &str, product: &Value) -> ProductInfo {
    let pricing = product.get("pricing");
    ProductInfo {
        product_id: id.to_string(),
        title: str_field(product, "shortDescription")
            .unwrap_or_else(|| "Unknown Product".to_string()),
        brand: str_field(product, "brandName").unwrap_or_else(|| "Unknown Brand".to_string()),
        canonical_url: str_field(product, "canonicalURL").unwrap_or_default(),
        price: pricing
            .and_then(|p| p.get("currentMinimumSellingPrice"))
            .and_then(Value::as_f64),
        original_price: pricing
            .and_then(|p| p.get("qvcMaximumPrice"))
            .and_then(Value::as_f64),
        features: description_features(
            &str_field(product, "longDescription").unwrap_or_default(),
        ),
        images: image_assets(product),
    }
}

/// Long descriptions arrive as loose HTML prose; strip the tags and treat
/// each sentence as a feature. A sentence ends at a period followed by
/// whitespace, so decimal numbers stay intact.
fn description_features(long_description: &str) -> Vec<String> {
    static TAG: OnceLock<Regex> = OnceLock::new();
    static BOUNDARY: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]*>").unwrap());
    let boundary = BOUNDARY.get_or_init(|| Regex::new(r"\.\s+").unwrap());
    let cleaned = tag.replace_all(long_description, "");
    let clean: &str = cleaned.as_ref();

    let mut features = Vec::new();
    let mut start = 0;
    for boundary_match in boundary.find_iter(clean) {
        // keep the period, drop the whitespace run
        push_sentence(&mut features, &clean[start..boundary_match.start() + 1]);
        start = boundary_match.end();
    }
    push_sentence(&mut features, &clean[start..]);
    features
}

fn push_sentence(features: &mut Vec<String>, sentence: &str) {
    let sentence = sentence.trim();
    if !sentence.is_empty() {
        features.push(sentence.to_string());
    }
}

fn attachment_urls(product: &Value) -> Vec<String> {
    assets(product)
        .filter(|a| {
            a.get("type").and_then(Value::as_str) == Some("attachment")
                && a.get("typeCode").and_then(Value::as_str) == Some("DSCLHTML")
        })
        .filter_map(|a| a.get("url").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

/// List items and substantial paragraphs from an attachment info page.
fn attachment_features(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("ul li, p") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| text.len() > 30)
        .collect()
}

fn image_assets(product: &Value) -> Vec<String> {
    let base = str_field(product, "baseImageUrl").unwrap_or_default();
    assets(product)
        .filter(|a| a.get("type").and_then(Value::as_str) == Some("image"))
        .filter_map(|a| a.get("url").and_then(Value::as_str))
        .map(|url| {
            if url.starts_with("http") {
                url.to_string()
            } else {
                format!("{base}{url}")
            }
        })
        .collect()
}

fn assets(product: &Value) -> impl Iterator<Item = &Value> {
    product
        .get("assets")
        .and_then(Value::as_array)
        .map(|a| a.iter())
        .unwrap_or_default()
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const SEARCH_HTML: &str = r#"
        <html><body>
            <div class="galleryItem">
                <a href="/kitchenco-stand-mixer.product.123456.html" data-prod-id="123456">Stand Mixer</a>
            </div>
            <div class="galleryItem">
                <a href="/other.product.999.html" data-prod-id="999">Other</a>
            </div>
        </body></html>"#;

    #[test]
    fn first_product_takes_the_first_anchor_with_a_product_id() {
        let (id, url) = first_product(SEARCH_HTML).unwrap();
        assert_eq!(id, "123456");
        assert_eq!(url, "/kitchenco-stand-mixer.product.123456.html");
    }

    #[test]
    fn no_product_anchor_means_no_result() {
        assert_eq!(first_product("<html><a href='/x'>no id</a></html>"), None);
    }

    #[test]
    fn search_query_dashes_feature_spaces() {
        let features = vec!["500W motor".to_string(), " five  speeds ".to_string()];
        assert_eq!(
            search_query("Stand Mixer", &features),
            "Stand Mixer+500W-motor+five-speeds"
        );
    }

    #[test]
    fn description_features_strip_tags_and_split_sentences() {
        let features =
            description_features("<p>Powerful <b>500W</b> motor. Dishwasher safe parts.</p>");
        assert_eq!(
            features,
            vec![
                "Powerful 500W motor.".to_string(),
                "Dishwasher safe parts.".to_string()
            ]
        );
    }

    #[test]
    fn decimal_numbers_do_not_split_sentences() {
        let features =
            description_features("<p>Measures 1.5 litres. Includes approx. 2m of cable.</p>");
        assert_eq!(
            features,
            vec![
                "Measures 1.5 litres.".to_string(),
                "Includes approx.".to_string(),
                "2m of cable.".to_string()
            ]
        );
    }

    #[test]
    fn attachment_features_keep_only_substantial_text() {
        let html = r#"
            <ul>
                <li>Short</li>
                <li>This bullet point is comfortably longer than thirty characters.</li>
            </ul>
            <p>Tiny.</p>
            <p>This paragraph also clears the thirty character threshold easily.</p>"#;
        let features = attachment_features(html);
        assert_eq!(features.len(), 2);
        assert!(features[0].starts_with("This bullet point"));
        assert!(features[1].starts_with("This paragraph"));
    }

    #[test]
    fn image_urls_are_absolutized_against_the_base() {
        let product = json!({
            "baseImageUrl": "https://images.qvcuk.com",
            "assets": [
                {"type": "image", "url": "/123456.001.jpg"},
                {"type": "image", "url": "https://cdn.example/full.jpg"},
                {"type": "attachment", "typeCode": "DSCLHTML", "url": "/info.html"},
                {"type": "image"}
            ]
        });
        assert_eq!(
            image_assets(&product),
            vec![
                "https://images.qvcuk.com/123456.001.jpg".to_string(),
                "https://cdn.example/full.jpg".to_string()
            ]
        );
        assert_eq!(attachment_urls(&product), vec!["/info.html".to_string()]);
    }

    #[test]
    fn extract_product_defaults_missing_fields() {
        let info = extract_product("42", &json!({}));
        assert_eq!(info.title, "Unknown Product");
        assert_eq!(info.brand, "Unknown Brand");
        assert_eq!(info.price, None);
        assert_eq!(info.features, Vec::<String>::new());
    }

    #[test]
    fn extract_product_reads_pricing_and_core_fields() {
        let product = json!({
            "shortDescription": "KitchenCo Stand Mixer",
            "brandName": "KitchenCo",
            "canonicalURL": "https://www.qvcuk.com/p/123456",
            "longDescription": "Powerful motor. Five speeds.",
            "pricing": {
                "currentMinimumSellingPrice": 89.0,
                "qvcMaximumPrice": 120.0
            }
        });
        let info = extract_product("123456", &product);
        assert_eq!(info.title, "KitchenCo Stand Mixer");
        assert_eq!(info.brand, "KitchenCo");
        assert_eq!(info.price, Some(89.0));
        assert_eq!(info.original_price, Some(120.0));
        assert_eq!(info.features.len(), 2);
        assert_eq!(info.canonical_url, "https://www.qvcuk.com/p/123456");
    }
}
