use crate::config::config::SourceConfig;
use crate::data::data_provider::CatalogSource;
use crate::data::record::{Page, Record};
use crate::error::{BrowserError, BrowserResult};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Fields requested from services that support projection
const SELECT_FIELDS: &str = "title,category,price,stock";

/// One product as the catalog service sends it. Accepts both the service's
/// own field names (`title`, `stock`) and the plain ones.
#[derive(Debug, Deserialize)]
struct ProductDto {
    id: u64,
    #[serde(alias = "title")]
    name: String,
    category: String,
    price: f64,
    #[serde(alias = "stock")]
    quantity: u64,
}

impl TryFrom<ProductDto> for Record {
    type Error = BrowserError;

    fn try_from(dto: ProductDto) -> Result<Self, Self::Error> {
        if !dto.price.is_finite() || dto.price < 0.0 {
            return Err(BrowserError::unavailable(format!(
                "malformed response: product {} has price {}",
                dto.id, dto.price
            )));
        }
        Ok(Record::new(dto.id, dto.name, dto.category, dto.price, dto.quantity))
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProductsResponse {
    Wrapped {
        products: Vec<ProductDto>,
        #[serde(default)]
        total: Option<usize>,
    },
    Bare(Vec<ProductDto>),
}

/// Decode a products response body into a page starting at `offset`
pub fn parse_products(body: &str, offset: usize) -> BrowserResult<Page> {
    let response: ProductsResponse = serde_json::from_str(body)?;
    let (products, total) = match response {
        ProductsResponse::Wrapped { products, total } => (products, total),
        ProductsResponse::Bare(products) => (products, None),
    };
    let records = products
        .into_iter()
        .map(Record::try_from)
        .collect::<BrowserResult<Vec<_>>>()?;
    Ok(Page::new(offset, records, total))
}

/// HTTP client for the remote product catalog
#[derive(Clone)]
pub struct CatalogApiClient {
    base_url: String,
    products_path: String,
    client: reqwest::Client,
}

impl CatalogApiClient {
    pub fn new(config: &SourceConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(concat!("catalog-browser/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            products_path: format!("/{}", config.products_path.trim_start_matches('/')),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn page_url(&self, offset: usize, limit: usize) -> String {
        format!(
            "{}{}?skip={}&limit={}&select={}",
            self.base_url, self.products_path, offset, limit, SELECT_FIELDS
        )
    }
}

#[async_trait]
impl CatalogSource for CatalogApiClient {
    async fn fetch_page(&self, offset: usize, limit: usize) -> BrowserResult<Page> {
        let url = self.page_url(offset, limit);
        debug!(target: "api", "GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(target: "api", "{} returned {}", url, status);
            return Err(BrowserError::unavailable(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let body = response.text().await?;
        let page = parse_products(&body, offset)?;
        debug!(
            target: "api",
            "Received {} products (total {:?})",
            page.len(),
            page.total
        );
        Ok(page)
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CatalogApiClient {
        let config = SourceConfig {
            base_url: "https://dummyjson.com/".to_string(),
            products_path: "products".to_string(),
            request_timeout_ms: 1000,
        };
        CatalogApiClient::new(&config).unwrap()
    }

    #[test]
    fn builds_skip_limit_url() {
        assert_eq!(
            client().page_url(10, 5),
            "https://dummyjson.com/products?skip=10&limit=5&select=title,category,price,stock"
        );
    }

    #[test]
    fn parses_wrapped_response_with_service_field_names() {
        let body = r#"{
            "products": [
                {"id": 1, "title": "Essence Mascara Lash Princess", "category": "beauty", "price": 9.99, "stock": 5},
                {"id": 2, "title": "Eyeshadow Palette with Mirror", "category": "beauty", "price": 19.99, "stock": 44}
            ],
            "total": 194, "skip": 0, "limit": 2
        }"#;
        let page = parse_products(body, 0).unwrap();
        assert_eq!(page.total, Some(194));
        assert_eq!(page.records[1].name, "Eyeshadow Palette with Mirror");
        assert_eq!(page.records[0].quantity, 5);
    }

    #[test]
    fn parses_bare_array_with_plain_field_names() {
        let body = r#"[{"id": 7, "name": "Bed", "category": "furniture", "price": 1899.99, "quantity": 47}]"#;
        let page = parse_products(body, 30).unwrap();
        assert_eq!(page.offset, 30);
        assert_eq!(page.total, None);
        assert_eq!(page.records[0].id, 7);
    }

    #[test]
    fn malformed_bodies_are_unavailable() {
        for body in [
            "not json",
            r#"{"items": []}"#,
            r#"[{"id": 1, "name": "x", "category": "y", "price": 1.0}]"#,
            r#"[{"id": 1, "name": "x", "category": "y", "price": -1.0, "quantity": 1}]"#,
            r#"[{"id": 1, "name": "x", "category": "y", "price": 1.0, "quantity": -3}]"#,
        ] {
            assert!(
                matches!(parse_products(body, 0), Err(BrowserError::Unavailable(_))),
                "body should be rejected: {}",
                body
            );
        }
    }
}
