use async_trait::async_trait;
use quick_xml::events::Event;
use tracing::info;

use crate::error::ScrapeError;

/// Transport seam for sitemap documents, kept separate from the page
/// renderer so resolution stays testable offline.
#[async_trait]
pub trait XmlFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, ScrapeError>;
}

pub struct HttpXmlFetcher {
    client: reqwest::Client,
}

impl HttpXmlFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl XmlFetcher for HttpXmlFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, ScrapeError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScrapeError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        if !resp.status().is_success() {
            return Err(ScrapeError::Fetch {
                url: url.to_string(),
                reason: format!("status {}", resp.status()),
            });
        }
        resp.text().await.map_err(|e| ScrapeError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

enum SitemapDoc {
    /// `<sitemapindex>`: the locs are child sitemap URLs.
    Index(Vec<String>),
    /// `<urlset>`: the locs are leaf page URLs.
    UrlSet(Vec<String>),
}

/// Expand a root sitemap into a flat leaf URL list. An index is expanded
/// exactly one level; a child fetch failure aborts the whole resolution
/// (per-page tolerance lives in the driver, not here).
pub async fn resolve(fetcher: &dyn XmlFetcher, root_url: &str) -> Result<Vec<String>, ScrapeError> {
    let xml = fetcher.fetch_text(root_url).await?;
    match parse_sitemap(&xml, root_url)? {
        SitemapDoc::UrlSet(urls) => {
            info!("Sitemap {} is a urlset with {} URLs", root_url, urls.len());
            Ok(urls)
        }
        SitemapDoc::Index(children) => {
            let children = dedup_first_seen(children);
            info!("Sitemap {} is an index with {} children", root_url, children.len());
            let mut urls = Vec::new();
            for child_url in children {
                let child_xml = fetcher.fetch_text(&child_url).await?;
                // Children are never themselves indexes; a nested index
                // contributes no leaf URLs.
                if let SitemapDoc::UrlSet(mut leaves) = parse_sitemap(&child_xml, &child_url)? {
                    urls.append(&mut leaves);
                }
            }
            Ok(urls)
        }
    }
}

fn parse_sitemap(xml: &str, url: &str) -> Result<SitemapDoc, ScrapeError> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut root: Option<bool> = None; // true = index, false = urlset
    let mut locs = Vec::new();
    let mut in_entry = false;
    let mut in_loc = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"sitemapindex" if root.is_none() => root = Some(true),
                b"urlset" if root.is_none() => root = Some(false),
                b"sitemap" | b"url" => in_entry = true,
                b"loc" if in_entry => in_loc = true,
                _ => {}
            },
            Ok(Event::Text(e)) if in_loc => {
                let loc = e.unescape().map_err(|e| ScrapeError::MalformedSitemap {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
                let loc = loc.trim();
                if !loc.is_empty() {
                    locs.push(loc.to_string());
                }
            }
            // Generated sitemaps often wrap <loc> in CDATA; the content is
            // literal, no unescaping.
            Ok(Event::CData(e)) if in_loc => {
                let loc = String::from_utf8_lossy(&e);
                let loc = loc.trim();
                if !loc.is_empty() {
                    locs.push(loc.to_string());
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"loc" => in_loc = false,
                b"sitemap" | b"url" => in_entry = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ScrapeError::MalformedSitemap {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
            _ => {}
        }
        buf.clear();
    }

    match root {
        Some(true) => Ok(SitemapDoc::Index(locs)),
        Some(false) => Ok(SitemapDoc::UrlSet(locs)),
        None => Err(ScrapeError::MalformedSitemap {
            url: url.to_string(),
            reason: "root element is neither sitemapindex nor urlset".to_string(),
        }),
    }
}

/// Child sitemap references are deduplicated at the index level only;
/// leaf URLs across sitemaps are not.
fn dedup_first_seen(urls: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    urls.into_iter().filter(|u| seen.insert(u.clone())).collect()
}

// ── Tests ──
