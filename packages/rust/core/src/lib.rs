//! Orchestration core for CampaignScope analysis sessions.
//!
//! This crate ties the stage executor, the progress ledger, and the
//! competitor enhancement worker into the end-to-end analysis workflow:
//! - [`pipeline`] — the per-request orchestration run
//! - [`enhance`] — the detached background enhancement worker
//! - [`executor`] — the external bulk-analysis collaborator seam

pub mod enhance;
pub mod executor;
pub mod pipeline;

pub use enhance::{EnhancementReport, run_enhancement};
pub use executor::{HttpStageExecutor, StageExecutor};
pub use pipeline::{AnalyzeOutcome, run_analysis};
