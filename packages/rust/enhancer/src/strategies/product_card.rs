//! Product card strategy for conventional storefront grids.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use campaignscope_shared::Product;

use super::{ExtractionStrategy, resolve_url};
use crate::price::looks_like_price;

/// Card container selectors, tried in order.
const CARD_SELECTORS: [&str; 5] = [
    ".product-card",
    ".product-item",
    "li.product",
    "[data-product]",
    ".grid-product",
];

/// Extracts products from repeated card-style markup.
pub struct ProductCardStrategy;

impl ExtractionStrategy for ProductCardStrategy {
    fn extract(&self, doc: &Html, base_url: &Url, limit: usize) -> Vec<Product> {
        for sel_str in CARD_SELECTORS {
            let sel = Selector::parse(sel_str).unwrap();
            let products: Vec<Product> = doc
                .select(&sel)
                .filter_map(|card| product_from_card(&card, base_url))
                .take(limit)
                .collect();

            if !products.is_empty() {
                return products;
            }
        }
        Vec::new()
    }

    fn name(&self) -> &str {
        "product-card"
    }
}

/// Pull name/price/image/link out of one card element.
fn product_from_card(card: &ElementRef<'_>, base_url: &Url) -> Option<Product> {
    let name = first_text(
        card,
        &[".product-title", ".product-name", "h2", "h3", "a"],
    )?;

    let price = first_text(card, &[".price", ".product-price", "[class*=price]"])
        .filter(|text| looks_like_price(text));

    let image_url = {
        let img_sel = Selector::parse("img[src]").unwrap();
        card.select(&img_sel)
            .next()
            .and_then(|img| img.value().attr("src"))
            .and_then(|src| resolve_url(base_url, src))
    };

    let product_url = {
        let a_sel = Selector::parse("a[href]").unwrap();
        card.select(&a_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| resolve_url(base_url, href))
    };

    Some(Product {
        name,
        price,
        image_url,
        product_url,
    })
}

/// First non-empty text content matching any of the selectors, in order.
fn first_text(card: &ElementRef<'_>, selectors: &[&str]) -> Option<String> {
    for sel_str in selectors {
        let sel = Selector::parse(sel_str).unwrap();
        if let Some(el) = card.select(&sel).next() {
            let text = el.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://shop.example.com/").unwrap()
    }

    #[test]
    fn extracts_card_grid() {
        let html = r#"<html><body><ul>
            <li class="product">
                <a href="/products/anorak"><h3 class="product-title">Anorak</h3></a>
                <img src="/img/anorak.jpg">
                <span class="price">$129.00</span>
            </li>
            <li class="product">
                <a href="/products/beanie"><h3 class="product-title">Beanie</h3></a>
                <span class="price">$19.00</span>
            </li>
        </ul></body></html>"#;
        let doc = Html::parse_document(html);

        let products = ProductCardStrategy.extract(&doc, &base(), 3);
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, "Anorak");
        assert_eq!(products[0].price.as_deref(), Some("$129.00"));
        assert_eq!(
            products[0].product_url.as_deref(),
            Some("https://shop.example.com/products/anorak")
        );
        assert_eq!(
            products[0].image_url.as_deref(),
            Some("https://shop.example.com/img/anorak.jpg")
        );
        assert!(products[1].image_url.is_none());
    }

    #[test]
    fn respects_limit() {
        let html = r#"<html><body>
            <div class="product-card"><h3>One</h3></div>
            <div class="product-card"><h3>Two</h3></div>
            <div class="product-card"><h3>Three</h3></div>
            <div class="product-card"><h3>Four</h3></div>
        </body></html>"#;
        let doc = Html::parse_document(html);

        let products = ProductCardStrategy.extract(&doc, &base(), 3);
        assert_eq!(products.len(), 3);
    }

    #[test]
    fn drops_non_price_text() {
        let html = r#"<html><body>
            <div class="product-card">
                <h3>Mystery Box</h3>
                <span class="price">Call for pricing</span>
            </div>
        </body></html>"#;
        let doc = Html::parse_document(html);

        let products = ProductCardStrategy.extract(&doc, &base(), 3);
        assert_eq!(products.len(), 1);
        assert!(products[0].price.is_none());
    }
}
