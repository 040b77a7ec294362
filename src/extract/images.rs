use scraper::{Html, Selector};

/// Collect image URLs in document order from one combined selector group.
/// Per element the source is the full-size data attribute, else `src`, else
/// the first `srcset` entry. Duplicates keep their first occurrence.
pub fn extract_images(doc: &Html, selector_group: &str) -> Vec<String> {
    let Ok(sel) = Selector::parse(selector_group) else {
        return Vec::new();
    };
    let mut seen = std::collections::HashSet::new();
    let mut images = Vec::new();
    for el in doc.select(&sel) {
        let src = el
            .value()
            .attr("data-full-size-image-url")
            .or_else(|| el.value().attr("src"))
            .or_else(|| {
                el.value()
                    .attr("srcset")
                    .and_then(|s| s.split_whitespace().next())
            })
            .map(|s| s.trim_end_matches(',').trim());
        if let Some(src) = src {
            if !src.is_empty() && seen.insert(src.to_string()) {
                images.push(src.to_string());
            }
        }
    }
    images
}

// ── Tests ──
