use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::error::ScrapeError;
use crate::extract;
use crate::product::RawProduct;
use crate::profile::SiteProfile;
use crate::render::{PageRenderer, PAGE_TIMEOUT_SECS};

const CONCURRENCY: usize = 4;

pub struct ScrapeStats {
    pub total: usize,
    pub ok: usize,
    /// Pages rendered fine but had no title or images.
    pub dropped: usize,
    pub errors: usize,
}

/// Scrape every classified URL through render → extract, tolerating per-URL
/// failure. Results keep the input URL order regardless of completion
/// order; a failed or dropped URL simply contributes no product.
pub async fn scrape_catalog(
    renderer: Arc<dyn PageRenderer>,
    urls: Vec<String>,
    profile: Arc<SiteProfile>,
) -> Result<(Vec<RawProduct>, ScrapeStats)> {
    let total = urls.len();
    let semaphore = Arc::new(Semaphore::new(CONCURRENCY));

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    type PageResult = (usize, String, Result<Option<RawProduct>, ScrapeError>);
    let (tx, mut rx) = tokio::sync::mpsc::channel::<PageResult>(CONCURRENCY * 2);

    for (index, url) in urls.into_iter().enumerate() {
        let renderer = Arc::clone(&renderer);
        let profile = Arc::clone(&profile);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let _permit = sem.acquire().await.unwrap();
            let result = scrape_one(renderer.as_ref(), &url, &profile).await;
            let _ = tx.send((index, url, result)).await;
        });
    }

    // Drop our copy of tx so rx closes when all spawned tasks finish
    drop(tx);

    let mut slots: Vec<Option<RawProduct>> = Vec::new();
    slots.resize_with(total, || None);
    let mut ok = 0usize;
    let mut dropped = 0usize;
    let mut errors = 0usize;

    while let Some((index, url, result)) = rx.recv().await {
        match result {
            Ok(Some(product)) => {
                ok += 1;
                slots[index] = Some(product);
            }
            Ok(None) => {
                dropped += 1;
                info!("Dropped {} (no title or no images)", url);
            }
            Err(e) => {
                errors += 1;
                warn!("Skipping {}: {}", url, e);
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Scraped {} pages ({} ok, {} dropped, {} errors)", total, ok, dropped, errors);

    let products = slots.into_iter().flatten().collect();
    Ok((products, ScrapeStats { total, ok, dropped, errors }))
}

async fn scrape_one(
    renderer: &dyn PageRenderer,
    url: &str,
    profile: &SiteProfile,
) -> Result<Option<RawProduct>, ScrapeError> {
    let html = tokio::time::timeout(
        Duration::from_secs(PAGE_TIMEOUT_SECS),
        renderer.render(url, profile),
    )
    .await
    .map_err(|_| ScrapeError::RenderTimeout {
        url: url.to_string(),
        timeout_secs: PAGE_TIMEOUT_SECS,
    })??;

    Ok(extract::extract_product(&html, url, profile))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Scripted renderer: URL → HTML, missing URL → render failure.
    struct MapRenderer(HashMap<String, String>);

    #[async_trait]
    impl PageRenderer for MapRenderer {
        async fn render(&self, url: &str, _profile: &SiteProfile) -> Result<String, ScrapeError> {
            self.0.get(url).cloned().ok_or_else(|| ScrapeError::Render {
                url: url.to_string(),
                reason: "connection reset".to_string(),
            })
        }
    }

    fn product_page(title: &str, image: &str) -> String {
        format!(
            r#"<h1 class="product_title">{title}</h1>
               <img class="wp-post-image" src="{image}">
               <p class="price"><span class="amount">9,99 €</span></p>"#
        )
    }

    #[tokio::test]
    async fn failure_on_one_url_does_not_abort_the_batch() {
        let renderer = MapRenderer(HashMap::from([
            (
                "https://x.es/producto/a".to_string(),
                product_page("Producto A", "https://x.es/a.jpg"),
            ),
            (
                "https://x.es/producto/c".to_string(),
                product_page("Producto C", "https://x.es/c.jpg"),
            ),
        ]));
        let urls = vec![
            "https://x.es/producto/a".to_string(),
            "https://x.es/producto/b".to_string(), // fails to render
            "https://x.es/producto/c".to_string(),
        ];
        let (products, stats) = scrape_catalog(
            Arc::new(renderer),
            urls,
            Arc::new(SiteProfile::woocommerce()),
        )
        .await
        .unwrap();

        assert_eq!(stats.total, 3);
        assert_eq!(stats.ok, 2);
        assert_eq!(stats.errors, 1);
        let titles: Vec<&str> = products.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Producto A", "Producto C"]);
    }

    #[tokio::test]
    async fn results_keep_input_url_order() {
        let mut pages = HashMap::new();
        let mut urls = Vec::new();
        for i in 0..20 {
            let url = format!("https://x.es/producto/{i}");
            pages.insert(url.clone(), product_page(&format!("Producto {i}"), "a.jpg"));
            urls.push(url);
        }
        let (products, stats) = scrape_catalog(
            Arc::new(MapRenderer(pages)),
            urls,
            Arc::new(SiteProfile::woocommerce()),
        )
        .await
        .unwrap();

        assert_eq!(stats.ok, 20);
        for (i, p) in products.iter().enumerate() {
            assert_eq!(p.title, format!("Producto {i}"));
        }
    }

    #[tokio::test]
    async fn non_product_pages_counted_as_dropped() {
        let renderer = MapRenderer(HashMap::from([(
            "https://x.es/producto/legal".to_string(),
            "<h1 class=\"product_title\">Aviso legal</h1>".to_string(), // no images
        )]));
        let (products, stats) = scrape_catalog(
            Arc::new(renderer),
            vec!["https://x.es/producto/legal".to_string()],
            Arc::new(SiteProfile::woocommerce()),
        )
        .await
        .unwrap();

        assert!(products.is_empty());
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.errors, 0);
    }
}
