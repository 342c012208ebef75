use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload sent to the `/autogen` endpoint. `features` never contains
/// blank or whitespace-only entries; order is as the user entered them.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AutogenRequest {
    pub title: String,
    pub features: Vec<String>,
}

/// What the service returns for a successful generation.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AutogenResponse {
    pub product_id: String,
    pub title: String,
    pub brand: String,
    pub price: Option<f64>,
    pub original_price: Option<f64>,
    pub features: Vec<String>,
    pub images: Vec<String>,
    pub marketing_copy: String,
    pub canonical_url: String,
    pub product_url: String,
}

/// Panel-side view of a generation response. The endpoint's shape is not
/// contractually guaranteed, so every field is defaulted: a missing or
/// wrong-typed field resolves to its default instead of failing the parse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationResult {
    pub marketing_copy: String,
    pub images: Vec<String>,
    pub product_id: Option<String>,
    pub title: Option<String>,
    pub brand: Option<String>,
    pub price: Option<f64>,
    pub original_price: Option<f64>,
    pub features: Vec<String>,
    pub canonical_url: Option<String>,
    pub product_url: Option<String>,
}

impl GenerationResult {
    /// Validates a raw response body in one pass. Numbers are accepted only
    /// when actually numeric (`"12.99"` as a string counts as absent), image
    /// entries may be bare URL strings or legacy `{"url": ...}` objects, and
    /// empty URLs are dropped.
    pub fn from_value(body: &Value) -> Self {
        Self {
            marketing_copy: non_empty_string(body.get("marketing_copy")).unwrap_or_default(),
            images: image_urls(body.get("images")),
            product_id: non_empty_string(body.get("product_id")),
            title: non_empty_string(body.get("title")),
            brand: non_empty_string(body.get("brand")),
            price: number(body.get("price")),
            original_price: number(body.get("original_price")),
            features: string_array(body.get("features")),
            canonical_url: non_empty_string(body.get("canonical_url")),
            product_url: non_empty_string(body.get("product_url")),
        }
    }

    pub fn price_display(&self) -> String {
        display_price(self.price)
    }

    pub fn original_price_display(&self) -> String {
        display_price(self.original_price)
    }
}

fn display_price(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("£{p:.2}"),
        None => "N/A".to_string(),
    }
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    }
}

fn string_array(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn image_urls(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(image_url).collect(),
        _ => Vec::new(),
    }
}

fn image_url(item: &Value) -> Option<String> {
    let url = match item {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("url")?.as_str()?,
        _ => return None,
    };
    if url.trim().is_empty() {
        return None;
    }
    Some(url.to_string())
}
