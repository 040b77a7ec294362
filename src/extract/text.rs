use scraper::{Html, Selector};

/// First non-empty trimmed text among the selectors, in order.
pub fn first_text(doc: &Html, selectors: &[String]) -> Option<String> {
    selectors.iter().find_map(|s| {
        let sel = Selector::parse(s).ok()?;
        doc.select(&sel).find_map(|el| {
            let text = el.text().collect::<String>();
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        })
    })
}

/// First non-empty inner HTML among the selectors, in order. Kept as a raw
/// markup fragment; consumers embed it verbatim.
pub fn first_inner_html(doc: &Html, selectors: &[String]) -> Option<String> {
    selectors.iter().find_map(|s| {
        let sel = Selector::parse(s).ok()?;
        doc.select(&sel).next().and_then(|el| {
            let html = el.inner_html();
            (!html.trim().is_empty()).then_some(html)
        })
    })
}

// ── Tests ──
