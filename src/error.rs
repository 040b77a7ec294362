use thiserror::Error;

/// Failure taxonomy for the pipeline. Resolver-level errors abort the run;
/// page-level errors are caught in the driver and the URL is skipped.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("malformed sitemap at {url}: {reason}")]
    MalformedSitemap { url: String, reason: String },

    #[error("render failed for {url}: {reason}")]
    Render { url: String, reason: String },

    #[error("render timed out for {url} after {timeout_secs}s")]
    RenderTimeout { url: String, timeout_secs: u64 },
}
