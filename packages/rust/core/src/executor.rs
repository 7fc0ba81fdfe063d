//! The bulk stage-executor seam.
//!
//! The per-stage analysis logic (landing-page scraping, LLM calls) lives in
//! an external service; the orchestrator only sees this request/response
//! contract. Tests substitute their own implementations.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;
use url::Url;

use campaignscope_shared::{BulkAnalysis, CampaignScopeError, Result};

/// User-Agent string for executor requests.
const USER_AGENT: &str = concat!("CampaignScope/", env!("CARGO_PKG_VERSION"));

/// The external collaborator that attempts all five analysis sections at once.
///
/// One invocation per orchestration run; a section absent from the result is
/// a legitimate outcome, not an error.
pub trait StageExecutor: Send + Sync {
    /// Run the bulk analysis for a URL.
    fn run_bulk(&self, url: &Url) -> impl Future<Output = Result<BulkAnalysis>> + Send;
}

// ---------------------------------------------------------------------------
// HTTP-backed executor
// ---------------------------------------------------------------------------

/// Wire envelope returned by the analysis service.
#[derive(Debug, Deserialize)]
struct BulkEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    analysis: Option<BulkAnalysis>,
    #[serde(default)]
    error: Option<String>,
}

/// Production executor: POSTs `{url}` to the configured analysis endpoint.
pub struct HttpStageExecutor {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpStageExecutor {
    /// Create an executor targeting `endpoint` with the given call timeout.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                CampaignScopeError::Network(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }
}

impl StageExecutor for HttpStageExecutor {
    async fn run_bulk(&self, url: &Url) -> Result<BulkAnalysis> {
        debug!(endpoint = %self.endpoint, url = %url, "invoking bulk analysis");

        let response = self
            .client
            .post(self.endpoint.as_str())
            .timeout(self.timeout)
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await
            .map_err(|e| CampaignScopeError::Analysis(format!("executor call failed: {e}")))?;

        let status = response.status();
        let envelope: BulkEnvelope = response.json().await.map_err(|e| {
            CampaignScopeError::Analysis(format!("executor response unreadable: {e}"))
        })?;

        if !envelope.success {
            let message = envelope
                .error
                .unwrap_or_else(|| format!("executor returned HTTP {status} without success"));
            return Err(CampaignScopeError::Analysis(message));
        }

        // success without a body still means "nothing was produced"
        Ok(envelope.analysis.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn executor_for(server: &MockServer) -> HttpStageExecutor {
        let endpoint = Url::parse(&format!("{}/analyze", server.uri())).unwrap();
        HttpStageExecutor::new(endpoint, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn parses_success_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .and(body_partial_json(
                serde_json::json!({"url": "https://shop.example.com/"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "analysis": {
                    "customerInsight": {"personas": ["early adopter"]},
                    "competitiveAnalysis": {
                        "competitors": [{"name": "Rival", "domain": "rival.example"}]
                    }
                }
            })))
            .mount(&server)
            .await;

        let executor = executor_for(&server);
        let url = Url::parse("https://shop.example.com/").unwrap();
        let bulk = executor.run_bulk(&url).await.expect("bulk success");

        assert!(bulk.customer_insight.is_some());
        assert!(bulk.media_plan.is_none());
        let ca = bulk.competitive_analysis.expect("competitive analysis");
        assert_eq!(ca.competitors.len(), 1);
        assert_eq!(ca.competitors[0].domain, "rival.example");
    }

    #[tokio::test]
    async fn propagates_explicit_failure_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "error": "page could not be scraped"
            })))
            .mount(&server)
            .await;

        let executor = executor_for(&server);
        let url = Url::parse("https://shop.example.com/").unwrap();
        let err = executor.run_bulk(&url).await.expect_err("must fail");

        assert!(err.to_string().contains("page could not be scraped"));
    }

    #[tokio::test]
    async fn missing_success_indicator_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"analysis": {}})),
            )
            .mount(&server)
            .await;

        let executor = executor_for(&server);
        let url = Url::parse("https://shop.example.com/").unwrap();
        assert!(executor.run_bulk(&url).await.is_err());
    }

    #[tokio::test]
    async fn success_with_empty_analysis_yields_default() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": true})),
            )
            .mount(&server)
            .await;

        let executor = executor_for(&server);
        let url = Url::parse("https://shop.example.com/").unwrap();
        let bulk = executor.run_bulk(&url).await.expect("success");
        assert!(bulk.customer_insight.is_none());
        assert!(bulk.competitive_analysis.is_none());
    }
}
