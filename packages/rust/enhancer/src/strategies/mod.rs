//! Extraction strategy trait and built-in strategies for product discovery.
//!
//! Strategies are tried in priority order against a competitor's page;
//! the first strategy that yields at least one product wins. New site
//! layouts get a new strategy, not changes to orchestration logic.

mod link_heuristic;
mod product_card;
mod structured_data;

use scraper::Html;
use url::Url;

use campaignscope_shared::Product;

pub use link_heuristic::LinkHeuristicStrategy;
pub use product_card::ProductCardStrategy;
pub use structured_data::StructuredDataStrategy;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Trait for one way of finding product listings in a page.
///
/// Strategies are tried in priority order; extraction stops at the first
/// non-empty result.
pub trait ExtractionStrategy: Send + Sync {
    /// Extract up to `limit` products from the parsed document.
    /// An empty result means "this layout does not match", not an error.
    fn extract(&self, doc: &Html, base_url: &Url, limit: usize) -> Vec<Product>;

    /// Human-readable strategy name for tracing.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds registered strategies in priority order.
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl StrategyRegistry {
    /// Create a registry with all built-in strategies, most precise first.
    pub fn new() -> Self {
        Self {
            strategies: vec![
                Box::new(StructuredDataStrategy),
                Box::new(ProductCardStrategy),
                Box::new(LinkHeuristicStrategy),
            ],
        }
    }

    /// Run strategies in order, short-circuiting on the first non-empty match.
    pub fn extract(&self, doc: &Html, base_url: &Url, limit: usize) -> Vec<Product> {
        for strategy in &self.strategies {
            let products = strategy.extract(doc, base_url, limit);
            if !products.is_empty() {
                tracing::debug!(
                    strategy = strategy.name(),
                    count = products.len(),
                    "products extracted"
                );
                return products;
            }
        }
        Vec::new()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a possibly-relative href against the page URL.
pub(crate) fn resolve_url(base_url: &Url, href: &str) -> Option<String> {
    base_url.join(href).ok().map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://shop.example.com/").unwrap()
    }

    #[test]
    fn registry_short_circuits_on_first_match() {
        // JSON-LD present: the structured-data strategy should win even
        // though the page also contains product cards.
        let html = r#"<html><body>
            <script type="application/ld+json">
            {"@type": "Product", "name": "LD Widget", "offers": {"price": "12.00", "priceCurrency": "USD"}}
            </script>
            <div class="product-card"><h3>Card Widget</h3><span class="price">$5</span></div>
        </body></html>"#;
        let doc = Html::parse_document(html);

        let products = StrategyRegistry::new().extract(&doc, &base(), 3);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "LD Widget");
    }

    #[test]
    fn registry_falls_through_to_later_strategies() {
        let html = r#"<html><body>
            <div class="product-card"><h3>Card Widget</h3><span class="price">$5.00</span></div>
        </body></html>"#;
        let doc = Html::parse_document(html);

        let products = StrategyRegistry::new().extract(&doc, &base(), 3);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Card Widget");
        assert_eq!(products[0].price.as_deref(), Some("$5.00"));
    }

    #[test]
    fn registry_empty_when_nothing_matches() {
        let doc = Html::parse_document("<html><body><p>About us</p></body></html>");
        let products = StrategyRegistry::new().extract(&doc, &base(), 3);
        assert!(products.is_empty());
    }
}
