//! Background enhancement worker.
//!
//! Re-opens the already-completed `competitive_analysis` section, enriches
//! each competitor with scraped product listings, and writes the section
//! back — preserving previously recorded insights. This is the only
//! sanctioned re-entry into a terminal section state.

use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument};

use campaignscope_enhancer::Enhancer;
use campaignscope_shared::{Competitor, Result, SectionName, SectionStatus, SessionId};
use campaignscope_storage::{ProgressUpdate, Storage};

/// Outcome of one enhancement run, reported to whoever dispatched it.
#[derive(Debug, Clone)]
pub struct EnhancementReport {
    /// Number of competitors in the enriched list (including those whose
    /// scrape produced no products).
    pub enriched_count: usize,
}

/// Enrich a session's competitors and update its `competitive_analysis`
/// ledger row.
///
/// Errors here are the dispatcher's to report; the orchestrator never awaits
/// this function, so nothing raised here can reach the original response
/// path.
#[instrument(skip_all, fields(session_id = %session_id, competitors = competitors.len()))]
pub async fn run_enhancement(
    enhancer: &Enhancer,
    storage: &Storage,
    session_id: &SessionId,
    competitors: &[Competitor],
) -> Result<EnhancementReport> {
    // Mid-point marker the client may render as "still working".
    storage
        .update_section(
            session_id,
            SectionName::CompetitiveAnalysis,
            &ProgressUpdate {
                status: Some(SectionStatus::Enhancing),
                progress: Some(50),
                ..Default::default()
            },
        )
        .await?;

    let enriched = enhancer.enrich_all(competitors).await;
    let enriched_count = enriched.len();

    // Read existing insights before writing, so qualitative findings from
    // the bulk pass survive the competitor refresh.
    let insights = storage
        .get_section(session_id, SectionName::CompetitiveAnalysis)
        .await?
        .and_then(|entry| entry.data)
        .and_then(|data| data.get("insights").cloned())
        .filter(|value| !value.is_null());

    storage
        .update_section(
            session_id,
            SectionName::CompetitiveAnalysis,
            &ProgressUpdate {
                status: Some(SectionStatus::Completed),
                progress: Some(100),
                data: Some(json!({
                    "competitors": enriched,
                    "insights": insights,
                })),
                completed_at: Some(Utc::now()),
            },
        )
        .await?;

    info!(enriched_count, "enhancement complete");

    Ok(EnhancementReport { enriched_count })
}
