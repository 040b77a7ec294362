use scraper::{Html, Selector};
use serde_json::Value;

use crate::profile::PriceStrategy;

/// Run the profile's price strategies in order, short-circuiting on the
/// first hit. Returns `(price, compare_at_price)`, both raw strings;
/// cleaning happens in the normalizer.
pub fn extract_price(doc: &Html, strategies: &[PriceStrategy]) -> (String, String) {
    for strategy in strategies {
        if let Some(hit) = apply(doc, strategy) {
            return hit;
        }
    }
    (String::new(), String::new())
}

fn apply(doc: &Html, strategy: &PriceStrategy) -> Option<(String, String)> {
    match strategy {
        PriceStrategy::JsonLd => json_ld_price(doc).map(|p| (p, String::new())),
        PriceStrategy::Microdata => microdata_price(doc).map(|p| (p, String::new())),
        PriceStrategy::SaleRegular { sale, regular, normal } => {
            sale_regular_price(doc, sale, regular, normal)
        }
        PriceStrategy::ClassHeuristic(selector) => {
            first_text(doc, selector).map(|p| (p, String::new()))
        }
    }
}

/// `offers.price` from embedded structured data. Offers may be a single
/// object or an array; the price may be a number or a string.
fn json_ld_price(doc: &Html) -> Option<String> {
    let sel = Selector::parse("script[type='application/ld+json']").ok()?;
    for script in doc.select(&sel) {
        let text = script.text().collect::<String>();
        let Ok(data) = serde_json::from_str::<Value>(&text) else {
            continue;
        };
        let candidates: Vec<&Value> = match &data {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        for item in candidates {
            if let Some(price) = offers_price(item) {
                return Some(price);
            }
        }
    }
    None
}

fn offers_price(item: &Value) -> Option<String> {
    let offers = item.get("offers")?;
    let offer = match offers {
        Value::Array(list) => list.first()?,
        other => other,
    };
    match offer.get("price")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn microdata_price(doc: &Html) -> Option<String> {
    let sel = Selector::parse("[itemprop='price']").ok()?;
    doc.select(&sel)
        .find_map(|el| el.value().attr("content"))
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
}

/// Sale price takes precedence; the struck-through regular price becomes
/// the compare-at candidate. Without a promotion the plain amount is used.
fn sale_regular_price(
    doc: &Html,
    sale: &str,
    regular: &str,
    normal: &str,
) -> Option<(String, String)> {
    let mut price = first_text(doc, sale).unwrap_or_default();
    let compare = first_text(doc, regular).unwrap_or_default();
    if price.is_empty() {
        price = first_text(doc, normal).unwrap_or_default();
    }
    if price.is_empty() && compare.is_empty() {
        return None;
    }
    Some((price, compare))
}

fn first_text(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    doc.select(&sel).next().and_then(|el| {
        let text = el.text().collect::<String>();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::SiteProfile;

    fn prestashop_chain() -> Vec<PriceStrategy> {
        SiteProfile::prestashop().price_strategies
    }

    fn woo_chain() -> Vec<PriceStrategy> {
        SiteProfile::woocommerce().price_strategies
    }

    #[test]
    fn json_ld_wins_over_dom() {
        let doc = Html::parse_document(
            r#"
            <script type="application/ld+json">
              {"@type": "Product", "offers": {"@type": "Offer", "price": 4.5}}
            </script>
            <span class="price">99,99 €</span>
            "#,
        );
        let (price, compare) = extract_price(&doc, &prestashop_chain());
        assert_eq!(price, "4.5");
        assert_eq!(compare, "");
    }

    #[test]
    fn json_ld_offers_array_and_string_price() {
        let doc = Html::parse_document(
            r#"<script type="application/ld+json">
              [{"@type": "Product", "offers": [{"price": "12.50"}]}]
            </script>"#,
        );
        let (price, _) = extract_price(&doc, &prestashop_chain());
        assert_eq!(price, "12.50");
    }

    #[test]
    fn microdata_when_no_json_ld() {
        let doc = Html::parse_document(
            r#"<span itemprop="price" content="7.25">7,25 €</span>"#,
        );
        let (price, _) = extract_price(&doc, &prestashop_chain());
        assert_eq!(price, "7.25");
    }

    #[test]
    fn class_heuristic_is_last_resort() {
        let doc = Html::parse_document(r#"<div class="product-price">5,90 €</div>"#);
        let (price, _) = extract_price(&doc, &prestashop_chain());
        assert_eq!(price, "5,90 €");
    }

    #[test]
    fn broken_json_ld_falls_through() {
        let doc = Html::parse_document(
            r#"
            <script type="application/ld+json">{not json</script>
            <span class="price">3,10 €</span>
            "#,
        );
        let (price, _) = extract_price(&doc, &prestashop_chain());
        assert_eq!(price, "3,10 €");
    }

    #[test]
    fn sale_price_takes_precedence() {
        let doc = Html::parse_document(
            r#"<p class="price">
                 <del><span class="amount">20,00 €</span></del>
                 <ins><span class="amount">15,00 €</span></ins>
               </p>"#,
        );
        let (price, compare) = extract_price(&doc, &woo_chain());
        assert_eq!(price, "15,00 €");
        assert_eq!(compare, "20,00 €");
    }

    #[test]
    fn plain_amount_without_promotion() {
        let doc = Html::parse_document(
            r#"<p class="price"><span class="woocommerce-Price-amount">8,40 €</span></p>"#,
        );
        let (price, compare) = extract_price(&doc, &woo_chain());
        assert_eq!(price, "8,40 €");
        assert_eq!(compare, "");
    }

    #[test]
    fn missing_price_yields_empty() {
        let doc = Html::parse_document("<h1>Producto sin precio</h1>");
        assert_eq!(extract_price(&doc, &woo_chain()), (String::new(), String::new()));
        assert_eq!(
            extract_price(&doc, &prestashop_chain()),
            (String::new(), String::new())
        );
    }
}
