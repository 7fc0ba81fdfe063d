//! End-to-end analysis orchestration: URL → session → seed → bulk analysis →
//! ledger fan-in → detached enhancement → finalize.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};
use url::Url;

use campaignscope_enhancer::Enhancer;
use campaignscope_shared::{
    BulkAnalysis, CampaignScopeError, Result, SectionName, SectionStatus, Session, SessionId,
    SessionStatus,
};
use campaignscope_storage::{ProgressUpdate, Storage};

use crate::enhance;
use crate::executor::StageExecutor;

/// Result of one orchestration run, returned to the caller synchronously.
///
/// Serializes as the bulk result flattened alongside the session identifier.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeOutcome {
    /// Session created for this run; clients poll the ledger under this id.
    pub session_id: SessionId,
    /// The executor's original result.
    #[serde(flatten)]
    pub analysis: BulkAnalysis,
}

/// Run the full analysis pipeline for one URL.
///
/// 1. Create the session (`in_progress`)
/// 2. Seed all five ledger rows before any stage work
/// 3. Invoke the bulk stage executor (blocking from this run's view)
/// 4. Fan results into per-section ledger updates
/// 5. Finalize the session exactly once
/// 6. Dispatch the enhancement worker, fire-and-forget
///
/// The only fatal path is a bulk-executor failure; once any section
/// succeeds the session always finalizes as `completed`, and the ledger is
/// the source of truth for what actually ran.
#[instrument(skip_all, fields(url = %url))]
pub async fn run_analysis<E: StageExecutor>(
    executor: &E,
    storage: &Arc<Storage>,
    enhancer: &Arc<Enhancer>,
    url: &Url,
) -> Result<AnalyzeOutcome> {
    let session = Session {
        id: SessionId::new(),
        url: url.to_string(),
        status: SessionStatus::InProgress,
        error: None,
        created_at: Utc::now(),
        completed_at: None,
    };
    let session_id = session.id.clone();

    info!(%session_id, "starting analysis session");

    // --- Phase 1: create session + seed ledger ---
    // Seeding errors are fatal: the client must never observe a session
    // with missing rows.
    storage.insert_session(&session).await?;
    for section in SectionName::ALL {
        storage.seed_section(&session_id, section).await?;
    }

    // --- Phase 2: bulk analysis ---
    let analysis = match executor.run_bulk(url).await {
        Ok(analysis) => analysis,
        Err(e) => {
            // Total pipeline failure: no partial credit for sections the
            // executor might have computed before failing. The executor's
            // message is recorded verbatim on the session.
            let message = match &e {
                CampaignScopeError::Analysis(msg) => msg.clone(),
                other => other.to_string(),
            };
            warn!(%session_id, error = %message, "bulk analysis failed");
            fail_all_sections(storage, &session_id).await;
            storage
                .finalize_session(&session_id, SessionStatus::Failed, Some(&message))
                .await?;
            return Err(e);
        }
    };

    // --- Phase 3: fan results into the ledger ---
    // Sections absent from the result stay pending; that is a stage opting
    // out, not an error.
    let now = Utc::now();
    let mut completed = 0usize;
    for section in SectionName::ALL {
        let Some(payload) = analysis.section_payload(section) else {
            continue;
        };
        storage
            .update_section(
                &session_id,
                section,
                &ProgressUpdate {
                    status: Some(SectionStatus::Completed),
                    progress: Some(100),
                    data: Some(payload),
                    completed_at: Some(now),
                },
            )
            .await?;
        completed += 1;
    }

    // --- Phase 4: finalize ---
    storage
        .finalize_session(&session_id, SessionStatus::Completed, None)
        .await?;

    // --- Phase 5: detached enhancement ---
    dispatch_enhancement(storage, enhancer, &session_id, &analysis);

    info!(%session_id, completed, "analysis session complete");

    Ok(AnalyzeOutcome {
        session_id,
        analysis,
    })
}

/// Mark every section failed after a total bulk failure. Individual write
/// errors are logged and skipped so the session itself still finalizes.
async fn fail_all_sections(storage: &Storage, session_id: &SessionId) {
    let now = Utc::now();
    for section in SectionName::ALL {
        let update = ProgressUpdate {
            status: Some(SectionStatus::Failed),
            completed_at: Some(now),
            ..Default::default()
        };
        if let Err(e) = storage.update_section(session_id, section, &update).await {
            warn!(%session_id, %section, error = %e, "failed to mark section failed");
        }
    }
}

/// Spawn the enhancement worker if the bulk result produced competitors.
///
/// The join handle is discarded: the worker's completion is observed only
/// through the ledger, never by this request, and a dispatch problem must
/// not affect the session or the response.
fn dispatch_enhancement(
    storage: &Arc<Storage>,
    enhancer: &Arc<Enhancer>,
    session_id: &SessionId,
    analysis: &BulkAnalysis,
) {
    let Some(competitive) = analysis.competitive_analysis.as_ref() else {
        return;
    };
    if competitive.competitors.is_empty() {
        return;
    }

    let storage = Arc::clone(storage);
    let enhancer = Arc::clone(enhancer);
    let session_id = session_id.clone();
    let competitors = competitive.competitors.clone();

    info!(%session_id, competitors = competitors.len(), "dispatching background enhancement");

    tokio::spawn(async move {
        match enhance::run_enhancement(&enhancer, &storage, &session_id, &competitors).await {
            Ok(report) => {
                info!(%session_id, enriched = report.enriched_count, "background enhancement done");
            }
            Err(e) => {
                warn!(%session_id, error = %e, "background enhancement failed");
            }
        }
    });
}
