use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::product::{NormalizedProduct, RawProduct};

static NON_PRICE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9.,]").unwrap());

/// Canonicalize a raw extracted value. Total function, no failure modes.
pub fn normalize(raw: RawProduct) -> NormalizedProduct {
    let price = clean_price(&raw.price);
    let mut compare_at_price = clean_price(&raw.compare_at_price);

    // A compare-at price only makes sense as a genuine markdown-from value.
    if !compare_at_price.is_empty() {
        if let (Ok(p), Ok(c)) = (price.parse::<f64>(), compare_at_price.parse::<f64>()) {
            if c <= p {
                compare_at_price.clear();
            }
        }
    }

    NormalizedProduct {
        handle: slugify(&raw.title),
        url: raw.url,
        title: raw.title,
        price,
        compare_at_price,
        description: raw.description,
        images: dedup_images(raw.images),
    }
}

/// Reduce a scraped price string to a bare decimal: strip everything except
/// digits and separators; when a comma is present it is the decimal point,
/// so periods are thousands separators and get dropped, and the last comma
/// becomes the period. Without a comma only the final period survives, so
/// period-grouped thousands still collapse. Empty input stays empty — never
/// rendered as `0`.
pub fn clean_price(raw: &str) -> String {
    let stripped = NON_PRICE_RE.replace_all(raw, "");
    if stripped.is_empty() {
        return String::new();
    }
    if !stripped.contains(',') {
        let last_period = stripped.rfind('.');
        return stripped
            .char_indices()
            .filter(|&(i, c)| c != '.' || Some(i) == last_period)
            .map(|(_, c)| c)
            .collect();
    }
    let no_periods: String = stripped.chars().filter(|c| *c != '.').collect();
    let last_comma = no_periods.rfind(',').unwrap();
    let mut out = String::with_capacity(no_periods.len());
    for (i, c) in no_periods.char_indices() {
        if c == ',' {
            if i == last_comma {
                out.push('.');
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Title → URL-safe handle: decompose diacritics, drop combining marks,
/// lowercase, collapse non-alphanumeric runs to single hyphens.
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for c in title.nfd() {
        if is_combining_mark(c) {
            continue;
        }
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    out
}

/// Exact-string dedup preserving first-seen order.
pub fn dedup_images(images: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    images.into_iter().filter(|i| seen.insert(i.clone())).collect()
}

// ── Tests ──
