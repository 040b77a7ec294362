use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use spider_client::shapes::request::{ReturnFormat, ReturnFormatHandling};
use spider_client::{RequestParams, Spider};
use tracing::{debug, warn};

use crate::error::ScrapeError;
use crate::profile::SiteProfile;

/// Per-page navigation budget; a timed-out page is skipped, not retried.
pub const PAGE_TIMEOUT_SECS: u64 = 60;

const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;
/// Renders per page while waiting for client-side markup to appear.
const READINESS_ATTEMPTS: u32 = 3;

/// The rendering collaborator: navigate a browsing context and return the
/// settled DOM as an HTML string.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str, profile: &SiteProfile) -> Result<String, ScrapeError>;
}

/// spider.cloud-backed renderer.
pub struct SpiderRenderer {
    spider: Spider,
}

impl SpiderRenderer {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("SPIDER_API_KEY")
            .map_err(|_| anyhow::anyhow!("SPIDER_API_KEY environment variable must be set"))?;
        let spider = Spider::new(Some(api_key))
            .map_err(|e| anyhow::anyhow!("Failed to create Spider client: {}", e))?;
        Ok(Self { spider })
    }

    async fn render_once(&self, url: &str) -> Result<String, ScrapeError> {
        let params = RequestParams {
            return_format: Some(ReturnFormatHandling::Single(ReturnFormat::Raw)),
            ..Default::default()
        };

        let response = self
            .spider
            .scrape_url(url, Some(params), "application/json")
            .await
            .map_err(|e| ScrapeError::Render {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let parsed: serde_json::Value = match response.as_str() {
            Some(s) => serde_json::from_str(s).unwrap_or(response.clone()),
            None => response,
        };

        parsed
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|obj| obj.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| ScrapeError::Render {
                url: url.to_string(),
                reason: "no content in renderer response".to_string(),
            })
    }

    /// Bounded retry with exponential backoff for transient transport
    /// failures (rate limits, upstream 5xx).
    async fn render_with_retry(&self, url: &str) -> Result<String, ScrapeError> {
        for attempt in 0..=MAX_RETRIES {
            match self.render_once(url).await {
                Ok(html) => return Ok(html),
                Err(e) if attempt < MAX_RETRIES && is_transient(&e) => {
                    let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
                    warn!(
                        "Transient render failure on {} (attempt {}/{}), backing off {:.1}s",
                        url,
                        attempt + 1,
                        MAX_RETRIES,
                        backoff.as_secs_f64()
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
        self.render_once(url).await
    }
}

#[async_trait]
impl PageRenderer for SpiderRenderer {
    async fn render(&self, url: &str, profile: &SiteProfile) -> Result<String, ScrapeError> {
        let mut html = self.render_with_retry(url).await?;
        // Client-side scripts may still be injecting prices and gallery
        // markup; re-render until the readiness node shows up, keeping the
        // last DOM either way.
        for attempt in 1..READINESS_ATTEMPTS {
            if page_ready(&html, &profile.readiness_selector) {
                break;
            }
            debug!(
                "Readiness node missing on {} (poll {}/{})",
                url, attempt, READINESS_ATTEMPTS
            );
            tokio::time::sleep(Duration::from_millis(profile.settle_ms)).await;
            html = self.render_with_retry(url).await?;
        }
        Ok(html)
    }
}

fn is_transient(e: &ScrapeError) -> bool {
    let reason = e.to_string();
    reason.contains("429")
        || reason.contains("rate")
        || reason.contains("500")
        || reason.contains("502")
        || reason.contains("503")
}

fn page_ready(html: &str, readiness_selector: &str) -> bool {
    let Ok(sel) = Selector::parse(readiness_selector) else {
        return true;
    };
    Html::parse_document(html).select(&sel).next().is_some()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_when_price_node_present() {
        let profile = SiteProfile::woocommerce();
        let html = r#"<p class="price"><span class="amount">5 €</span></p>"#;
        assert!(page_ready(html, &profile.readiness_selector));
    }

    #[test]
    fn not_ready_while_price_still_injecting() {
        let profile = SiteProfile::woocommerce();
        assert!(!page_ready("<h1>Leña</h1>", &profile.readiness_selector));
    }

    #[test]
    fn transient_classification() {
        let e = ScrapeError::Render {
            url: "u".into(),
            reason: "server returned 503".into(),
        };
        assert!(is_transient(&e));
        let e = ScrapeError::Render {
            url: "u".into(),
            reason: "dns failure".into(),
        };
        assert!(!is_transient(&e));
    }
}
