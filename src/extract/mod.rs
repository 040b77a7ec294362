pub mod images;
pub mod price;
pub mod text;

use scraper::Html;

use crate::product::RawProduct;
use crate::profile::SiteProfile;

/// Extract a product from a rendered page. Missing fields become empty
/// values. A page with no title or no images is a classifier false
/// positive, not an error, and is dropped by returning `None`.
pub fn extract_product(html: &str, url: &str, profile: &SiteProfile) -> Option<RawProduct> {
    let doc = Html::parse_document(html);

    let title = text::first_text(&doc, &profile.title_selectors).unwrap_or_default();
    let images = images::extract_images(&doc, &profile.image_selectors);
    if title.is_empty() || images.is_empty() {
        return None;
    }

    let (price, compare_at_price) = price::extract_price(&doc, &profile.price_strategies);
    let description = text::first_inner_html(&doc, &profile.description_selectors)
        .unwrap_or_default();

    Some(RawProduct {
        url: url.to_string(),
        title,
        price,
        compare_at_price,
        description,
        images,
    })
}

// ── Tests ──
