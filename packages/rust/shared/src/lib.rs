//! Shared types, error model, and configuration for CampaignScope.
//!
//! This crate is the foundation depended on by all other CampaignScope crates.
//! It provides:
//! - [`CampaignScopeError`] — the unified error type
//! - Domain types ([`SessionId`], [`SectionName`], [`Session`], [`ProgressEntry`], [`BulkAnalysis`])
//! - Configuration ([`AppConfig`], [`EnhanceConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AnalysisConfig, AppConfig, EnhanceConfig, ServerConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{CampaignScopeError, Result};
pub use types::{
    BulkAnalysis, Competitor, CompetitiveAnalysis, EnrichedCompetitor, Product, ProgressEntry,
    SectionName, SectionStatus, Session, SessionId, SessionStatus,
};
