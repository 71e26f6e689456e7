//! Data retrieval for the dashboard session.
//!
//! The session only talks to a [`DashboardApi`]. [`HttpApi`] reads the JSON
//! endpoints served by `scoutboard serve`; [`LocalApi`] reads the scouter's
//! SQLite file in-process.

mod http;
mod local;

pub use http::*;
pub use local::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::db::{EntitySummary, ProbeRecord, Summary};

/// Retrieval error types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DashboardError {
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed response: {0}")]
    Parse(String),
    #[error("unknown model: {0}")]
    NotFound(String),
    #[error("store error: {0}")]
    Store(String),
}

/// Source of dashboard data.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn fetch_summary(&self) -> Result<Summary, DashboardError>;

    async fn fetch_models(&self) -> Result<Vec<EntitySummary>, DashboardError>;

    /// Probe history for one model, oldest first.
    ///
    /// `model_id` may contain `/` and is used as-is.
    async fn fetch_history(&self, model_id: &str) -> Result<Vec<ProbeRecord>, DashboardError>;

    /// Human-readable description of where the data comes from.
    fn description(&self) -> &str;
}
