//! Core domain types for CampaignScope analysis sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::CampaignScopeError;

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for analysis session identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new time-sortable session identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// SectionName
// ---------------------------------------------------------------------------

/// The closed set of analysis sections tracked per session.
///
/// The ledger is keyed on this enum rather than free-form strings so that a
/// typo in a seed or lookup is a compile error, not a silently missing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionName {
    CustomerInsight,
    CampaignTargeting,
    MediaPlan,
    CompetitiveAnalysis,
    AdCreative,
}

impl SectionName {
    /// Every section, in seeding order.
    pub const ALL: [SectionName; 5] = [
        Self::CustomerInsight,
        Self::CampaignTargeting,
        Self::MediaPlan,
        Self::CompetitiveAnalysis,
        Self::AdCreative,
    ];

    /// Stable snake_case key used in the database and wire payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomerInsight => "customer_insight",
            Self::CampaignTargeting => "campaign_targeting",
            Self::MediaPlan => "media_plan",
            Self::CompetitiveAnalysis => "competitive_analysis",
            Self::AdCreative => "ad_creative",
        }
    }
}

impl std::fmt::Display for SectionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SectionName {
    type Err = CampaignScopeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "customer_insight" => Ok(Self::CustomerInsight),
            "campaign_targeting" => Ok(Self::CampaignTargeting),
            "media_plan" => Ok(Self::MediaPlan),
            "competitive_analysis" => Ok(Self::CompetitiveAnalysis),
            "ad_creative" => Ok(Self::AdCreative),
            other => Err(CampaignScopeError::validation(format!(
                "unknown section name: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Status enums
// ---------------------------------------------------------------------------

/// Overall status of an analysis session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = CampaignScopeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(CampaignScopeError::validation(format!(
                "unknown session status: {other}"
            ))),
        }
    }
}

/// Status of a single section within a session.
///
/// The only sanctioned re-entry into a terminal state is
/// `completed → enhancing → completed` for competitive analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Pending,
    InProgress,
    Enhancing,
    Completed,
    Failed,
}

impl SectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Enhancing => "enhancing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for SectionStatus {
    type Err = CampaignScopeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "enhancing" => Ok(Self::Enhancing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(CampaignScopeError::validation(format!(
                "unknown section status: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Session / ProgressEntry rows
// ---------------------------------------------------------------------------

/// One end-to-end orchestration run for a single input URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique session identifier (UUID v7).
    pub id: SessionId,
    /// The URL being analyzed (immutable after creation).
    pub url: String,
    /// Overall run status.
    pub status: SessionStatus,
    /// Error message, set only when `status` is `failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Set exactly once, at the session's terminal transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// One row of the progress ledger, keyed by `(session_id, section)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    /// Owning session.
    pub session_id: SessionId,
    /// Which analysis section this row tracks.
    pub section: SectionName,
    /// Current stage status.
    pub status: SectionStatus,
    /// Integer 0–100.
    pub progress_percentage: u8,
    /// Section payload; null until the stage produces output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Set at seeding time.
    pub started_at: DateTime<Utc>,
    /// Set at the stage's terminal transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Competitor enrichment records
// ---------------------------------------------------------------------------

/// A competitor identified by the bulk analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competitor {
    /// Display name.
    pub name: String,
    /// Public domain to scrape for products (e.g. `rivalbrand.com`).
    pub domain: String,
    /// Market category, if the analysis produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A product listing discovered on a competitor's public page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product name.
    pub name: String,
    /// Raw price text as shown on the page (e.g. `"$49.99"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Product image URL, resolved against the page URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Product detail page URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
}

/// A competitor with its appended product discoveries.
///
/// An empty `products` list is a valid outcome, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedCompetitor {
    #[serde(flatten)]
    pub competitor: Competitor,
    #[serde(default)]
    pub products: Vec<Product>,
}

/// The `competitive_analysis` section payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompetitiveAnalysis {
    /// Competitors identified by the bulk analysis (or enriched later).
    #[serde(default)]
    pub competitors: Vec<Competitor>,
    /// Qualitative insights, orthogonal to product enrichment; preserved
    /// across the enhancement pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights: Option<Value>,
}

// ---------------------------------------------------------------------------
// BulkAnalysis
// ---------------------------------------------------------------------------

/// Structured result of one bulk stage-executor invocation.
///
/// A section may be legitimately absent; the orchestrator leaves absent
/// sections `pending` in the ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_insight: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_targeting: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_plan: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitive_analysis: Option<CompetitiveAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_creatives: Option<Value>,
}

impl BulkAnalysis {
    /// The ledger payload for one section, if the bulk result produced it.
    pub fn section_payload(&self, section: SectionName) -> Option<Value> {
        match section {
            SectionName::CustomerInsight => self.customer_insight.clone(),
            SectionName::CampaignTargeting => self.campaign_targeting.clone(),
            SectionName::MediaPlan => self.media_plan.clone(),
            SectionName::CompetitiveAnalysis => self
                .competitive_analysis
                .as_ref()
                .and_then(|ca| serde_json::to_value(ca).ok()),
            SectionName::AdCreative => self.ad_creatives.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_roundtrip() {
        let id = SessionId::new();
        let s = id.to_string();
        let parsed: SessionId = s.parse().expect("parse SessionId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn section_name_covers_all_five() {
        assert_eq!(SectionName::ALL.len(), 5);
        for section in SectionName::ALL {
            let parsed: SectionName = section.as_str().parse().expect("roundtrip");
            assert_eq!(parsed, section);
        }
    }

    #[test]
    fn section_name_rejects_unknown() {
        let err = "media-plan".parse::<SectionName>();
        assert!(err.is_err());
    }

    #[test]
    fn status_roundtrips() {
        for status in [
            SectionStatus::Pending,
            SectionStatus::InProgress,
            SectionStatus::Enhancing,
            SectionStatus::Completed,
            SectionStatus::Failed,
        ] {
            let parsed: SectionStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert_eq!(
            "in_progress".parse::<SessionStatus>().unwrap(),
            SessionStatus::InProgress
        );
    }

    #[test]
    fn bulk_analysis_partial_deserialization() {
        let json = r#"{
            "customerInsight": {"personas": ["budget shopper"]},
            "mediaPlan": {"channels": ["search", "social"]}
        }"#;
        let bulk: BulkAnalysis = serde_json::from_str(json).expect("deserialize");

        assert!(bulk.section_payload(SectionName::CustomerInsight).is_some());
        assert!(bulk.section_payload(SectionName::MediaPlan).is_some());
        assert!(bulk.section_payload(SectionName::CampaignTargeting).is_none());
        assert!(
            bulk.section_payload(SectionName::CompetitiveAnalysis)
                .is_none()
        );
        assert!(bulk.section_payload(SectionName::AdCreative).is_none());
    }

    #[test]
    fn competitive_payload_keeps_insights() {
        let bulk = BulkAnalysis {
            competitive_analysis: Some(CompetitiveAnalysis {
                competitors: vec![Competitor {
                    name: "Rival".into(),
                    domain: "rival.example".into(),
                    category: Some("apparel".into()),
                }],
                insights: Some(serde_json::json!({"positioning": "premium"})),
            }),
            ..Default::default()
        };

        let payload = bulk
            .section_payload(SectionName::CompetitiveAnalysis)
            .expect("payload");
        assert_eq!(payload["competitors"][0]["domain"], "rival.example");
        assert_eq!(payload["insights"]["positioning"], "premium");
    }

    #[test]
    fn enriched_competitor_flattens() {
        let enriched = EnrichedCompetitor {
            competitor: Competitor {
                name: "Rival".into(),
                domain: "rival.example".into(),
                category: None,
            },
            products: vec![Product {
                name: "Widget".into(),
                price: Some("$9.99".into()),
                image_url: None,
                product_url: None,
            }],
        };

        let json = serde_json::to_value(&enriched).expect("serialize");
        assert_eq!(json["domain"], "rival.example");
        assert_eq!(json["products"][0]["name"], "Widget");
    }
}
