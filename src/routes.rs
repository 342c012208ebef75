use axum::{extract::State, http::StatusCode, Json};
use std::fmt::Display;
use std::sync::Arc;

use crate::catalog::CatalogClient;
use crate::copywriter::Copywriter;
use crate::models::{AutogenRequest, AutogenResponse};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogClient>,
    pub copywriter: Arc<Copywriter>,
}

/// POST /autogen: match the title and features to a catalog product, pull its
/// full record, and write marketing copy for it.
pub async fn autogen(
    State(state): State<AppState>,
    Json(body): Json<AutogenRequest>,
) -> Result<Json<AutogenResponse>, (StatusCode, String)> {
    tracing::info!(title = %body.title, features = body.features.len(), "incoming generation request");

    let (product_id, product_url) = state
        .catalog
        .search(&body.title, &body.features)
        .await
        .map_err(upstream_error)?;
    tracing::info!(%product_id, %product_url, "matched catalog product");

    let info = state
        .catalog
        .product_info(&product_id)
        .await
        .map_err(upstream_error)?;

    let marketing_copy = state
        .copywriter
        .marketing_copy(&info.title, &info.features)
        .await
        .map_err(upstream_error)?;
    tracing::info!("generated marketing copy");

    Ok(Json(AutogenResponse {
        product_id: info.product_id,
        title: info.title,
        brand: info.brand,
        price: info.price,
        original_price: info.original_price,
        features: info.features,
        images: info.images,
        marketing_copy,
        canonical_url: info.canonical_url,
        product_url,
    }))
}

fn upstream_error(e: impl Display) -> (StatusCode, String) {
    tracing::error!(error = %e, "auto-generation failed");
    (StatusCode::BAD_GATEWAY, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{AutogenClient, ClientError};
    use crate::copywriter::DEMO_KEY;
    use axum::response::Html;
    use axum::routing::{get, post};
    use axum::Router;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const SEARCH_HTML: &str = r#"
        <html><body>
            <a href="/kitchenco-stand-mixer.product.123456.html" data-prod-id="123456">Stand Mixer</a>
        </body></html>"#;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn product_json() -> serde_json::Value {
        json!({
            "products": {
                "123456": {
                    "shortDescription": "KitchenCo Stand Mixer",
                    "brandName": "KitchenCo",
                    "canonicalURL": "https://www.qvcuk.com/p/123456",
                    "longDescription": "Powerful 500W motor. Dishwasher safe parts.",
                    "baseImageUrl": "https://images.qvcuk.com",
                    "pricing": {
                        "currentMinimumSellingPrice": 89.0,
                        "qvcMaximumPrice": 120.0
                    },
                    "assets": [
                        {"type": "image", "url": "/123456.001.jpg"},
                        {"type": "image", "url": "https://cdn.example/full.jpg"}
                    ]
                }
            }
        })
    }

    async fn autogen_app(catalog_base: String) -> String {
        let state = AppState {
            catalog: Arc::new(CatalogClient::new(catalog_base.clone(), catalog_base)),
            copywriter: Arc::new(Copywriter::with_base(
                DEMO_KEY.to_string(),
                "http://127.0.0.1:9".to_string(),
                "gpt-4-1106-preview".to_string(),
            )),
        };
        let app = Router::new()
            .route("/autogen", post(autogen))
            .with_state(state);
        serve(app).await
    }

    #[tokio::test]
    async fn autogen_composes_catalog_lookup_and_copywriting() {
        let fixture = Router::new()
            .route("/catalog/search.html", get(|| async { Html(SEARCH_HTML) }))
            .route(
                "/api/sales/presentation/v3/uk/products/list/:id",
                get(|| async { Json(product_json()) }),
            );
        let base = autogen_app(serve(fixture).await).await;

        let client = AutogenClient::new(base);
        let result = client
            .generate(&AutogenRequest {
                title: "Stand Mixer".to_string(),
                features: vec!["500W motor".to_string()],
            })
            .await
            .unwrap();

        assert_eq!(result.product_id.as_deref(), Some("123456"));
        assert_eq!(result.title.as_deref(), Some("KitchenCo Stand Mixer"));
        assert_eq!(result.brand.as_deref(), Some("KitchenCo"));
        assert_eq!(result.price, Some(89.0));
        assert_eq!(result.original_price, Some(120.0));
        assert_eq!(
            result.images,
            vec![
                "https://images.qvcuk.com/123456.001.jpg".to_string(),
                "https://cdn.example/full.jpg".to_string()
            ]
        );
        assert!(result.marketing_copy.contains("KitchenCo Stand Mixer"));
        assert_eq!(
            result.product_url.as_deref(),
            Some("/kitchenco-stand-mixer.product.123456.html")
        );
    }

    #[tokio::test]
    async fn empty_search_results_map_to_bad_gateway() {
        let fixture = Router::new().route(
            "/catalog/search.html",
            get(|| async { Html("<html><body>no matches</body></html>") }),
        );
        let base = autogen_app(serve(fixture).await).await;

        let client = AutogenClient::new(base);
        let err = client
            .generate(&AutogenRequest {
                title: "Nonexistent".to_string(),
                features: Vec::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Status(s) if s == StatusCode::BAD_GATEWAY));
    }
}
