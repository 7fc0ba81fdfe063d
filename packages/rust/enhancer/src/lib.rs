//! Best-effort competitor product enrichment.
//!
//! This crate provides:
//! - [`strategies`] — Pluggable product-extraction strategies tried in cascade
//! - [`Enhancer`] — Bounded concurrent per-competitor scraping with
//!   independent fixed timeouts
//!
//! Every failure mode (network, timeout, parse, blocked target) degrades to
//! an empty product list for that competitor; a batch never fails as a whole.

mod fetch;
mod price;
pub mod strategies;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use scraper::Html;
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use url::Url;

use campaignscope_shared::{
    CampaignScopeError, Competitor, EnhanceConfig, EnrichedCompetitor, Product, Result,
};

pub use strategies::{ExtractionStrategy, StrategyRegistry};

/// Scrapes competitor pages for product listings.
#[derive(Clone)]
pub struct Enhancer {
    client: Client,
    config: EnhanceConfig,
    /// Allow localhost/private IPs (for integration tests with mock servers).
    allow_localhost: bool,
}

impl Enhancer {
    /// Create a new enhancer with the given configuration.
    pub fn new(config: EnhanceConfig) -> Result<Self> {
        Ok(Self {
            client: fetch::build_client()?,
            config,
            allow_localhost: false,
        })
    }

    /// Allow scraping localhost/private IPs (for integration tests).
    pub fn allow_localhost(mut self) -> Self {
        self.allow_localhost = true;
        self
    }

    /// Enrich a batch of competitors with discovered product listings.
    ///
    /// The batch is capped at `max_competitors`; within the cap, fetches run
    /// concurrently under a semaphore, each with its own timeout. The result
    /// has one entry per attempted competitor, in input order; competitors
    /// whose fetch or extraction failed carry an empty product list.
    pub async fn enrich_all(&self, competitors: &[Competitor]) -> Vec<EnrichedCompetitor> {
        let batch: Vec<Competitor> = competitors
            .iter()
            .take(self.config.max_competitors)
            .cloned()
            .collect();

        if batch.len() < competitors.len() {
            debug!(
                requested = competitors.len(),
                cap = self.config.max_competitors,
                "competitor batch truncated"
            );
        }

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut handles = Vec::with_capacity(batch.len());

        for competitor in batch {
            let enhancer = self.clone();
            let sem = Arc::clone(&semaphore);

            handles.push(tokio::spawn(async move {
                let _permit = sem.acquire().await.expect("semaphore closed");
                enhancer.enrich_one(competitor).await
            }));
        }

        let mut enriched = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(entry) => enriched.push(entry),
                Err(e) => {
                    // A panicked task loses its competitor entry; log and move on.
                    warn!(error = %e, "enrichment task failed");
                }
            }
        }
        enriched
    }

    /// Enrich a single competitor. Never fails: errors become an empty
    /// product list.
    async fn enrich_one(&self, competitor: Competitor) -> EnrichedCompetitor {
        let products = match self.scrape_products(&competitor.domain).await {
            Ok(products) => products,
            Err(e) => {
                warn!(domain = %competitor.domain, error = %e, "product scrape failed");
                Vec::new()
            }
        };

        debug!(
            domain = %competitor.domain,
            products = products.len(),
            "competitor enriched"
        );

        EnrichedCompetitor {
            competitor,
            products,
        }
    }

    async fn scrape_products(&self, domain: &str) -> Result<Vec<Product>> {
        let url = competitor_url(domain)?;

        if !self.allow_localhost && fetch::is_ssrf_target(&url) {
            return Err(CampaignScopeError::Network(format!(
                "{url}: blocked target"
            )));
        }

        let timeout = Duration::from_secs(self.config.fetch_timeout_secs);
        let html = fetch::fetch_html(&self.client, &url, timeout).await?;

        Ok(extract_products(
            &html,
            &url,
            self.config.max_products,
        ))
    }
}

/// Parse a page and run the strategy cascade. Synchronous so the parsed
/// document never lives across an await point.
fn extract_products(html: &str, base_url: &Url, limit: usize) -> Vec<Product> {
    let doc = Html::parse_document(html);
    StrategyRegistry::new().extract(&doc, base_url, limit)
}

/// Build a fetchable URL from a competitor's domain descriptor.
fn competitor_url(domain: &str) -> Result<Url> {
    let candidate = if domain.contains("://") {
        domain.to_string()
    } else {
        format!("https://{domain}")
    };

    Url::parse(&candidate).map_err(|e| {
        CampaignScopeError::validation(format!("invalid competitor domain {domain:?}: {e}"))
    })
}
