use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One scraped product page, fields as found in the markup. Missing fields
/// are empty strings, never absent. Serialized as the `products.json`
/// snapshot so a scrape run can be decoupled from CSV generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProduct {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub compare_at_price: String,
    /// Raw HTML fragment, embedded verbatim in the output.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// A `RawProduct` after normalization: canonical decimal prices (or empty),
/// deduplicated images, and a derived handle.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedProduct {
    pub url: String,
    pub handle: String,
    pub title: String,
    pub price: String,
    pub compare_at_price: String,
    pub description: String,
    pub images: Vec<String>,
}

pub fn load_snapshot(path: &Path) -> Result<Vec<RawProduct>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
}

pub fn save_snapshot(path: &Path, products: &[RawProduct]) -> Result<()> {
    let json = serde_json::to_string_pretty(products)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

// ── Tests ──
