use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::rows::ExportRow;

const PAGE_SIZE: usize = 250;

/// Transport for the storefront JSON endpoint. `Ok(None)` means the
/// endpoint answered with a non-success status.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Option<String>>;
}

pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<Option<String>> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("fetching {url}"))?;
        if !resp.status().is_success() {
            return Ok(None);
        }
        let body = resp
            .text()
            .await
            .with_context(|| format!("reading {url}"))?;
        Ok(Some(body))
    }
}

/// A product as served by a storefront's public `/products.json` endpoint.
/// Prices arrive as strings; `tags` is an array on most stores but a
/// comma-joined string on some, so both are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiProduct {
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub body_html: String,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub variants: Vec<ApiVariant>,
    #[serde(default)]
    pub images: Vec<ApiImage>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(untagged)]
pub enum Tags {
    #[default]
    #[serde(skip)]
    None,
    Joined(String),
    List(Vec<String>),
}

impl Tags {
    fn join(&self) -> String {
        match self {
            Tags::None => String::new(),
            Tags::Joined(s) => s.clone(),
            Tags::List(list) => list.join(", "),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiVariant {
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub compare_at_price: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiImage {
    pub src: String,
}

#[derive(Debug, Deserialize)]
struct ProductsPage {
    #[serde(default)]
    products: Vec<ApiProduct>,
}

/// Page through `{shop}/products.json` until an empty page. A non-success
/// status ends the walk with whatever was accumulated, mirroring how the
/// endpoint signals the end of the catalog on some stores.
pub async fn fetch_all_products(fetcher: &dyn PageFetcher, shop_url: &str) -> Result<Vec<ApiProduct>> {
    let shop_url = shop_url.trim_end_matches('/');
    let mut products = Vec::new();
    let mut page = 1usize;
    loop {
        let url = format!("{shop_url}/products.json?limit={PAGE_SIZE}&page={page}");
        let Some(body) = fetcher.fetch(&url).await? else {
            break;
        };
        let body: ProductsPage =
            serde_json::from_str(&body).with_context(|| format!("parsing {url}"))?;
        if body.products.is_empty() {
            break;
        }
        info!("Page {}: {} products", page, body.products.len());
        products.extend(body.products);
        page += 1;
    }
    Ok(products)
}

/// Map API products straight to export rows. The API handle is
/// authoritative (no re-slugging); the first variant supplies pricing; the
/// vendor label is overridden by configuration.
pub fn api_rows(products: &[ApiProduct], vendor: &str) -> Vec<ExportRow> {
    let mut rows = Vec::new();
    for product in products {
        let variant = product.variants.first();
        for (index, image) in product.images.iter().enumerate() {
            let first = index == 0;
            let field = |v: &str| if first { v.to_string() } else { String::new() };
            rows.push(ExportRow {
                handle: product.handle.clone(),
                title: field(&product.title),
                body_html: field(&product.body_html),
                vendor: field(vendor),
                product_type: field(&product.product_type),
                tags: field(&product.tags.join()),
                published: "TRUE".to_string(),
                option1_name: "Title".to_string(),
                option1_value: "Default Title".to_string(),
                variant_price: field(variant.map(|v| v.price.as_str()).unwrap_or("")),
                variant_compare_at_price: field(
                    variant
                        .and_then(|v| v.compare_at_price.as_deref())
                        .unwrap_or(""),
                ),
                image_src: image.src.clone(),
                image_position: index + 1,
            });
        }
    }
    rows
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapFetcher(HashMap<String, String>);

    #[async_trait]
    impl PageFetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<Option<String>> {
            Ok(self.0.get(url).cloned())
        }
    }

    fn page_url(page: usize) -> String {
        format!("https://h.shop/products.json?limit=250&page={page}")
    }

    const PAGE_JSON: &str = r#"{
        "products": [{
            "handle": "buchenholz-25kg",
            "title": "Buchenholz 25kg",
            "body_html": "<p>Trocken</p>",
            "product_type": "Brennholz",
            "tags": ["holz", "kamin"],
            "variants": [{"price": "24.90", "compare_at_price": "29.90"}],
            "images": [{"src": "https://h.shop/img/1.jpg"}, {"src": "https://h.shop/img/2.jpg"}]
        }]
    }"#;

    #[test]
    fn api_page_deserializes() {
        let page: ProductsPage = serde_json::from_str(PAGE_JSON).unwrap();
        assert_eq!(page.products.len(), 1);
        let p = &page.products[0];
        assert_eq!(p.handle, "buchenholz-25kg");
        assert_eq!(p.tags.join(), "holz, kamin");
        assert_eq!(p.variants[0].compare_at_price.as_deref(), Some("29.90"));
    }

    #[test]
    fn tags_accept_joined_string_form() {
        let json = r#"{"handle": "x", "title": "X", "tags": "a, b"}"#;
        let p: ApiProduct = serde_json::from_str(json).unwrap();
        assert_eq!(p.tags.join(), "a, b");
    }

    #[test]
    fn rows_use_api_handle_and_first_variant() {
        let page: ProductsPage = serde_json::from_str(PAGE_JSON).unwrap();
        let rows = api_rows(&page.products, "WE_TEST");
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.handle == "buchenholz-25kg"));
        assert_eq!(rows[0].vendor, "WE_TEST");
        assert_eq!(rows[0].variant_price, "24.90");
        assert_eq!(rows[0].variant_compare_at_price, "29.90");
        assert_eq!(rows[1].title, "");
        assert_eq!(rows[1].variant_price, "");
        assert_eq!(rows[1].image_position, 2);
    }

    #[tokio::test]
    async fn paging_stops_on_empty_page() {
        let fetcher = MapFetcher(HashMap::from([
            (page_url(1), PAGE_JSON.to_string()),
            (page_url(2), r#"{"products": []}"#.to_string()),
            (page_url(3), PAGE_JSON.to_string()),
        ]));
        let products = fetch_all_products(&fetcher, "https://h.shop/").await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].handle, "buchenholz-25kg");
    }

    #[tokio::test]
    async fn paging_stops_on_non_success_status() {
        let fetcher = MapFetcher(HashMap::from([(page_url(1), PAGE_JSON.to_string())]));
        let products = fetch_all_products(&fetcher, "https://h.shop").await.unwrap();
        assert_eq!(products.len(), 1);
    }

    #[test]
    fn product_without_images_emits_no_rows() {
        let json = r#"{"handle": "x", "title": "X"}"#;
        let p: ApiProduct = serde_json::from_str(json).unwrap();
        assert!(api_rows(&[p], "V").is_empty());
    }
}
