//! Last-resort link heuristic strategy.
//!
//! When a site has neither structured data nor recognizable card markup,
//! fall back to anchors whose href looks like a product detail page.

use std::collections::HashSet;

use scraper::{Html, Selector};
use url::Url;

use campaignscope_shared::Product;

use super::{ExtractionStrategy, resolve_url};
use crate::price::extract_price;

/// Path fragments that mark a link as product-ish.
const PRODUCT_PATH_HINTS: [&str; 4] = ["/product/", "/products/", "/item/", "/p/"];

/// Extracts products from product-looking anchor links.
pub struct LinkHeuristicStrategy;

impl ExtractionStrategy for LinkHeuristicStrategy {
    fn extract(&self, doc: &Html, base_url: &Url, limit: usize) -> Vec<Product> {
        let sel = Selector::parse("a[href]").unwrap();
        let mut seen = HashSet::new();
        let mut products = Vec::new();

        for el in doc.select(&sel) {
            if products.len() >= limit {
                break;
            }

            let Some(href) = el.value().attr("href") else {
                continue;
            };
            if !PRODUCT_PATH_HINTS.iter().any(|hint| href.contains(hint)) {
                continue;
            }

            let Some(product_url) = resolve_url(base_url, href) else {
                continue;
            };

            // Image-only anchors carry no name; leave the URL unclaimed so
            // a text link to the same product can still yield it.
            let text = el.text().collect::<String>().trim().to_string();
            if text.is_empty() {
                continue;
            }
            // One product per detail URL, however many links point at it.
            if !seen.insert(product_url.clone()) {
                continue;
            }

            let price = extract_price(&text);
            let name = match &price {
                Some(p) => text.replace(p.as_str(), "").trim().to_string(),
                None => text,
            };
            if name.is_empty() {
                continue;
            }

            let image_url = {
                let img_sel = Selector::parse("img[src]").unwrap();
                el.select(&img_sel)
                    .next()
                    .and_then(|img| img.value().attr("src"))
                    .and_then(|src| resolve_url(base_url, src))
            };

            products.push(Product {
                name,
                price,
                image_url,
                product_url: Some(product_url),
            });
        }

        products
    }

    fn name(&self) -> &str {
        "link-heuristic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://shop.example.com/").unwrap()
    }

    #[test]
    fn extracts_product_links() {
        let html = r#"<html><body>
            <a href="/products/anorak">Anorak $129.00</a>
            <a href="/about">About us</a>
            <a href="/item/beanie">Beanie</a>
        </body></html>"#;
        let doc = Html::parse_document(html);

        let products = LinkHeuristicStrategy.extract(&doc, &base(), 3);
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, "Anorak");
        assert_eq!(products[0].price.as_deref(), Some("$129.00"));
        assert_eq!(products[1].name, "Beanie");
        assert!(products[1].price.is_none());
    }

    #[test]
    fn dedupes_repeated_hrefs() {
        let html = r#"<html><body>
            <a href="/products/anorak"><img src="/img/anorak.jpg"></a>
            <a href="/products/anorak">Anorak</a>
        </body></html>"#;
        let doc = Html::parse_document(html);

        let products = LinkHeuristicStrategy.extract(&doc, &base(), 3);
        assert_eq!(products.len(), 1);
    }

    #[test]
    fn ignores_plain_navigation() {
        let html = r#"<html><body>
            <a href="/">Home</a>
            <a href="/contact">Contact</a>
        </body></html>"#;
        let doc = Html::parse_document(html);

        assert!(LinkHeuristicStrategy.extract(&doc, &base(), 3).is_empty());
    }
}
