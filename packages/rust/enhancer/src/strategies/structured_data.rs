//! JSON-LD structured data strategy.
//!
//! Storefronts that publish schema.org `Product` records are the most
//! reliable source: names and prices come straight from the merchant's
//! own markup instead of CSS guesswork.

use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

use campaignscope_shared::Product;

use super::{ExtractionStrategy, resolve_url};

/// Extracts schema.org `Product` entries from `ld+json` script tags.
pub struct StructuredDataStrategy;

impl ExtractionStrategy for StructuredDataStrategy {
    fn extract(&self, doc: &Html, base_url: &Url, limit: usize) -> Vec<Product> {
        let sel = Selector::parse(r#"script[type="application/ld+json"]"#).unwrap();
        let mut products = Vec::new();

        for el in doc.select(&sel) {
            let raw = el.text().collect::<String>();
            let Ok(value) = serde_json::from_str::<Value>(&raw) else {
                continue;
            };

            collect_products(&value, base_url, limit, &mut products);
            if products.len() >= limit {
                break;
            }
        }

        products.truncate(limit);
        products
    }

    fn name(&self) -> &str {
        "structured-data"
    }
}

/// Walk a JSON-LD value (object, array, or `@graph`) collecting products.
fn collect_products(value: &Value, base_url: &Url, limit: usize, out: &mut Vec<Product>) {
    if out.len() >= limit {
        return;
    }

    match value {
        Value::Array(items) => {
            for item in items {
                collect_products(item, base_url, limit, out);
            }
        }
        Value::Object(obj) => {
            if let Some(graph) = obj.get("@graph") {
                collect_products(graph, base_url, limit, out);
            }
            if let Some(items) = obj.get("itemListElement") {
                collect_products(items, base_url, limit, out);
            }
            if let Some(item) = obj.get("item") {
                collect_products(item, base_url, limit, out);
            }

            if is_product_type(obj.get("@type")) {
                if let Some(product) = product_from_object(obj, base_url) {
                    out.push(product);
                }
            }
        }
        _ => {}
    }
}

fn is_product_type(type_field: Option<&Value>) -> bool {
    match type_field {
        Some(Value::String(s)) => s == "Product",
        Some(Value::Array(types)) => types.iter().any(|t| t == "Product"),
        _ => false,
    }
}

fn product_from_object(obj: &serde_json::Map<String, Value>, base_url: &Url) -> Option<Product> {
    let name = obj.get("name")?.as_str()?.trim().to_string();
    if name.is_empty() {
        return None;
    }

    let price = obj.get("offers").and_then(|offers| {
        // Offers can be a single object or an array; take the first price.
        let offer = match offers {
            Value::Array(arr) => arr.first()?,
            other => other,
        };
        let price = offer.get("price")?;
        let price_text = match price {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        let currency = offer.get("priceCurrency").and_then(Value::as_str);
        Some(match currency {
            Some(cur) => format!("{price_text} {cur}"),
            None => price_text,
        })
    });

    let image_url = match obj.get("image") {
        Some(Value::String(s)) => resolve_url(base_url, s),
        Some(Value::Array(arr)) => arr
            .first()
            .and_then(Value::as_str)
            .and_then(|s| resolve_url(base_url, s)),
        _ => None,
    };

    let product_url = obj
        .get("url")
        .and_then(Value::as_str)
        .and_then(|s| resolve_url(base_url, s));

    Some(Product {
        name,
        price,
        image_url,
        product_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://shop.example.com/catalog").unwrap()
    }

    #[test]
    fn extracts_single_product() {
        let html = r#"<html><head>
            <script type="application/ld+json">
            {
              "@type": "Product",
              "name": "Trail Shoe",
              "image": "/img/trail-shoe.jpg",
              "url": "/products/trail-shoe",
              "offers": {"price": "89.95", "priceCurrency": "USD"}
            }
            </script>
        </head><body></body></html>"#;
        let doc = Html::parse_document(html);

        let products = StructuredDataStrategy.extract(&doc, &base(), 3);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Trail Shoe");
        assert_eq!(products[0].price.as_deref(), Some("89.95 USD"));
        assert_eq!(
            products[0].image_url.as_deref(),
            Some("https://shop.example.com/img/trail-shoe.jpg")
        );
    }

    #[test]
    fn extracts_from_item_list_graph() {
        let html = r#"<html><head>
            <script type="application/ld+json">
            {
              "@graph": [{
                "@type": "ItemList",
                "itemListElement": [
                  {"item": {"@type": "Product", "name": "Alpha"}},
                  {"item": {"@type": "Product", "name": "Beta"}},
                  {"item": {"@type": "Product", "name": "Gamma"}},
                  {"item": {"@type": "Product", "name": "Delta"}}
                ]
              }]
            }
            </script>
        </head><body></body></html>"#;
        let doc = Html::parse_document(html);

        let products = StructuredDataStrategy.extract(&doc, &base(), 3);
        assert_eq!(products.len(), 3);
        assert_eq!(products[0].name, "Alpha");
    }

    #[test]
    fn ignores_non_product_types() {
        let html = r#"<html><head>
            <script type="application/ld+json">
            {"@type": "Organization", "name": "Shop Inc"}
            </script>
        </head><body></body></html>"#;
        let doc = Html::parse_document(html);

        assert!(StructuredDataStrategy.extract(&doc, &base(), 3).is_empty());
    }

    #[test]
    fn tolerates_malformed_json() {
        let html = r#"<html><head>
            <script type="application/ld+json">{not json</script>
        </head><body></body></html>"#;
        let doc = Html::parse_document(html);

        assert!(StructuredDataStrategy.extract(&doc, &base(), 3).is_empty());
    }
}
