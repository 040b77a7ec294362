/// Per-platform configuration: which URLs are product pages, and which
/// selectors yield each field. Every target site is a `SiteProfile` value;
/// the pipeline never branches on site identity.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub name: &'static str,
    /// A URL containing any of these path fragments is a product page.
    pub product_url_patterns: Vec<String>,
    /// Tried in order; first non-empty text wins.
    pub title_selectors: Vec<String>,
    /// Single comma-joined group so matches come back in document order.
    pub image_selectors: String,
    /// Tried in order; first non-empty inner HTML wins.
    pub description_selectors: Vec<String>,
    /// Price strategies, tried in order with short-circuit on first hit.
    pub price_strategies: Vec<PriceStrategy>,
    /// Node whose presence means client-side rendering has finished.
    pub readiness_selector: String,
    /// Interval between readiness re-renders.
    pub settle_ms: u64,
}

#[derive(Debug, Clone)]
pub enum PriceStrategy {
    /// `offers.price` inside `script[type='application/ld+json']`.
    JsonLd,
    /// `content` attribute of the first `[itemprop='price']` element.
    Microdata,
    /// Sale price in `<ins>`, struck-through regular price in `<del>`,
    /// plain amount when the product is not on promotion. The only strategy
    /// that can yield a compare-at value.
    SaleRegular {
        sale: String,
        regular: String,
        normal: String,
    },
    /// First price-like element by class heuristic, text content.
    ClassHeuristic(String),
}

impl SiteProfile {
    pub fn prestashop() -> Self {
        Self {
            name: "prestashop",
            product_url_patterns: vec![
                "/pellets-de-madera/".into(),
                "/briquetas-de-madera/".into(),
                "/inicio/".into(),
            ],
            title_selectors: vec!["h1".into()],
            image_selectors: "img[data-full-size-image-url], img.product-cover, \
                              img.js-qv-product-cover, img[srcset]"
                .into(),
            description_selectors: vec![".product-description, .rte".into()],
            price_strategies: vec![
                PriceStrategy::JsonLd,
                PriceStrategy::Microdata,
                PriceStrategy::ClassHeuristic(
                    ".price, .product-price, [class*='price']".into(),
                ),
            ],
            readiness_selector: ".price, .product-price, [class*='price']".into(),
            settle_ms: 1500,
        }
    }

    pub fn woocommerce() -> Self {
        Self {
            name: "woocommerce",
            product_url_patterns: vec!["/producto/".into()],
            title_selectors: vec!["h1.product_title".into()],
            image_selectors: "img.wp-post-image, img.attachment-woocommerce_thumbnail, \
                              .woocommerce-product-gallery__image img"
                .into(),
            description_selectors: vec![
                ".woocommerce-Tabs-panel--description".into(),
                "#tab-description".into(),
                ".entry-content".into(),
                ".woocommerce-product-details__short-description".into(),
            ],
            price_strategies: vec![PriceStrategy::SaleRegular {
                sale: "p.price ins .woocommerce-Price-amount, p.price ins .amount".into(),
                regular: "p.price del .woocommerce-Price-amount, p.price del .amount".into(),
                normal: "p.price > .woocommerce-Price-amount, p.price > .amount".into(),
            }],
            readiness_selector: "p.price .woocommerce-Price-amount, p.price .amount".into(),
            settle_ms: 2500,
        }
    }

    /// Substring containment against the configured patterns; any match accepts.
    pub fn is_product_url(&self, url: &str) -> bool {
        self.product_url_patterns.iter().any(|p| url.contains(p))
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn woocommerce_product_urls() {
        let profile = SiteProfile::woocommerce();
        assert!(profile.is_product_url("https://lenasdiazcb.es/producto/lena-de-encina/"));
        assert!(!profile.is_product_url("https://lenasdiazcb.es/contacto/"));
    }

    #[test]
    fn prestashop_matches_any_pattern() {
        let profile = SiteProfile::prestashop();
        assert!(profile.is_product_url("https://shop.es/pellets-de-madera/saco-15kg"));
        assert!(profile.is_product_url("https://shop.es/inicio/oferta-palet"));
        assert!(!profile.is_product_url("https://shop.es/aviso-legal"));
    }

    #[test]
    fn overridden_patterns_replace_defaults() {
        let mut profile = SiteProfile::woocommerce();
        profile.product_url_patterns = vec!["/tienda/".into()];
        assert!(profile.is_product_url("https://x.es/tienda/item"));
        assert!(!profile.is_product_url("https://x.es/producto/item"));
    }
}
