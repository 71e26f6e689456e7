//! In-process data source backed by the probe store.

use async_trait::async_trait;
use chrono::Local;

use super::{DashboardApi, DashboardError};
use crate::db::{DbError, EntitySummary, ProbeRecord, Summary};
use crate::stats::StatsService;

impl From<DbError> for DashboardError {
    fn from(e: DbError) -> Self {
        DashboardError::Store(e.to_string())
    }
}

/// Serves dashboard data straight from the scouter's SQLite file.
#[derive(Clone)]
pub struct LocalApi {
    service: StatsService,
    description: String,
}

impl LocalApi {
    pub fn new(service: StatsService, db_path: &str) -> Self {
        Self {
            service,
            description: format!("local: {}", db_path),
        }
    }
}

#[async_trait]
impl DashboardApi for LocalApi {
    async fn fetch_summary(&self) -> Result<Summary, DashboardError> {
        Ok(self.service.summary(Local::now().naive_local())?)
    }

    async fn fetch_models(&self) -> Result<Vec<EntitySummary>, DashboardError> {
        Ok(self.service.models(Local::now().naive_local())?)
    }

    async fn fetch_history(&self, model_id: &str) -> Result<Vec<ProbeRecord>, DashboardError> {
        self.service
            .history(model_id)?
            .ok_or_else(|| DashboardError::NotFound(model_id.to_string()))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{HealthCheck, Store};
    use crate::stats::RollingSettings;
    use std::sync::Arc;
    use tempfile::NamedTempFile;
    use tokio_test::{assert_err, assert_ok, block_on};

    #[test]
    fn test_local_history_and_not_found() {
        let tmp = NamedTempFile::new().unwrap();
        let store = Arc::new(Store::new(tmp.path()).unwrap());
        let run = store.insert_run("2023-01-01 10:00:00").unwrap();
        store
            .insert_check(&HealthCheck {
                run_id: run,
                model_id: "google/gemma".to_string(),
                ok: true,
                http_status: Some(200),
                error_category: None,
                latency_ms: Some(100),
            })
            .unwrap();

        let service = StatsService::new(store, RollingSettings::default(), 50);
        let api = LocalApi::new(service, "scouter.db");
        assert_eq!(api.description(), "local: scouter.db");

        let history = assert_ok!(block_on(api.fetch_history("google/gemma")));
        assert_eq!(history.len(), 1);
        assert!(history[0].ok);

        let missing = assert_err!(block_on(api.fetch_history("google")));
        assert_eq!(missing, DashboardError::NotFound("google".to_string()));

        // The 2023 run is far outside any 24h window from today
        let models = assert_ok!(block_on(api.fetch_models()));
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].uptime_24h, None);
    }
}
