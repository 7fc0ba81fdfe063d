//! HTTP API: analysis trigger, enhancement trigger, and progress polling.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use url::Url;

use campaignscope_core::{AnalyzeOutcome, HttpStageExecutor, run_analysis, run_enhancement};
use campaignscope_enhancer::Enhancer;
use campaignscope_shared::{CampaignScopeError, Competitor, SessionId};
use campaignscope_storage::Storage;

// ---------------------------------------------------------------------------
// Shared application state
// ---------------------------------------------------------------------------

pub struct AppState {
    pub storage: Arc<Storage>,
    pub executor: HttpStageExecutor,
    pub enhancer: Arc<Enhancer>,
}

pub type SharedState = Arc<AppState>;

// ---------------------------------------------------------------------------
// Request / response payloads
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct AnalyzeRequest {
    url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnhanceRequest {
    session_id: SessionId,
    competitors: Vec<Competitor>,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    success: bool,
    #[serde(flatten)]
    outcome: AnalyzeOutcome,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureResponse {
    success: bool,
    error: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnhanceResponse {
    success: bool,
    enriched_count: usize,
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<CampaignScopeError> for ApiError {
    fn from(e: CampaignScopeError) -> Self {
        match e {
            CampaignScopeError::Validation { message } => ApiError::BadRequest(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/analyze", post(analyze))
        .route("/api/enhance", post(enhance))
        .route("/api/sessions/{id}", get(get_session))
        .route("/api/sessions/{id}/progress", get(get_progress))
        .route("/health", get(health_check))
}

/// Full application router. CORS is permissive: the API is meant to be
/// called straight from browser frontends during development.
pub fn build_router(state: SharedState) -> Router {
    api_router().layer(CorsLayer::permissive()).with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Trigger a full analysis run for a URL. Blocks until the bulk pass and
/// ledger writes finish; competitor enhancement continues in the background.
async fn analyze(
    State(state): State<SharedState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Response, ApiError> {
    let url = Url::parse(&req.url)
        .map_err(|e| ApiError::BadRequest(format!("invalid url {:?}: {e}", req.url)))?;

    match run_analysis(&state.executor, &state.storage, &state.enhancer, &url).await {
        Ok(outcome) => Ok(Json(AnalyzeResponse {
            success: true,
            outcome,
        })
        .into_response()),
        // A bulk-analysis failure is recorded (the session is finalized as
        // failed) and surfaced as an upstream failure.
        Err(CampaignScopeError::Analysis(message)) => Ok((
            StatusCode::BAD_GATEWAY,
            Json(FailureResponse {
                success: false,
                error: message,
            }),
        )
            .into_response()),
        Err(other) => Err(other.into()),
    }
}

/// Trigger competitor enhancement for an existing session. Runs to
/// completion before responding; a failed run reports the error in-band.
async fn enhance(
    State(state): State<SharedState>,
    Json(req): Json<EnhanceRequest>,
) -> Result<Response, ApiError> {
    if state.storage.get_session(&req.session_id).await?.is_none() {
        return Err(ApiError::NotFound(format!(
            "session {} not found",
            req.session_id
        )));
    }

    match run_enhancement(
        &state.enhancer,
        &state.storage,
        &req.session_id,
        &req.competitors,
    )
    .await
    {
        Ok(report) => Ok(Json(EnhanceResponse {
            success: true,
            enriched_count: report.enriched_count,
        })
        .into_response()),
        Err(e) => Ok(Json(FailureResponse {
            success: false,
            error: e.to_string(),
        })
        .into_response()),
    }
}

/// Fetch one session record.
async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_session_id(&id)?;
    let session = state
        .storage
        .get_session(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("session {id} not found")))?;
    Ok(Json(session).into_response())
}

/// Fetch the full progress ledger for a session.
async fn get_progress(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_session_id(&id)?;
    if state.storage.get_session(&id).await?.is_none() {
        return Err(ApiError::NotFound(format!("session {id} not found")));
    }
    let entries = state.storage.list_sections(&id).await?;
    Ok(Json(serde_json::json!({
        "sessionId": id,
        "entries": entries,
    }))
    .into_response())
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

fn parse_session_id(raw: &str) -> Result<SessionId, ApiError> {
    SessionId::from_str(raw).map_err(|_| ApiError::BadRequest(format!("invalid session id {raw:?}")))
}
