//! HTTP client for the dashboard JSON endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::{DashboardApi, DashboardError};
use crate::db::{EntitySummary, ProbeRecord, Summary};

/// Reads `/summary`, `/models` and `/models/{id}/history` below a base URL.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
    description: String,
}

impl HttpApi {
    /// Create a client for the API rooted at `base_url` (e.g. `http://host:8000/api`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DashboardError> {
        let base_url = if base_url.starts_with("http://") || base_url.starts_with("https://") {
            base_url.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", base_url.trim_end_matches('/'))
        };

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DashboardError::Network(e.to_string()))?;

        Ok(Self {
            client,
            description: format!("http: {}", base_url),
            base_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, DashboardError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                DashboardError::Network(format!("request to {} timed out", url))
            } else {
                DashboardError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(DashboardError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(DashboardError::Network(format!(
                "{} returned HTTP {}",
                url,
                status.as_u16()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DashboardError::Network(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| DashboardError::Parse(e.to_string()))
    }
}

#[async_trait]
impl DashboardApi for HttpApi {
    async fn fetch_summary(&self) -> Result<Summary, DashboardError> {
        self.get_json(&self.url("summary")).await
    }

    async fn fetch_models(&self) -> Result<Vec<EntitySummary>, DashboardError> {
        self.get_json(&self.url("models")).await
    }

    async fn fetch_history(&self, model_id: &str) -> Result<Vec<ProbeRecord>, DashboardError> {
        // The server routes on the raw path, so slashes in the id stay unescaped.
        let url = self.url(&format!("models/{}/history", model_id));
        match self.get_json(&url).await {
            Err(DashboardError::NotFound(_)) => Err(DashboardError::NotFound(model_id.to_string())),
            other => other,
        }
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalization() {
        let api = HttpApi::new("localhost:8000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(api.url("summary"), "http://localhost:8000/api/summary");
        assert_eq!(api.description(), "http: http://localhost:8000/api");

        let api = HttpApi::new("https://scout.example/api", Duration::from_secs(1)).unwrap();
        assert_eq!(api.url("models"), "https://scout.example/api/models");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let api = HttpApi::new("http://256.256.256.256/api", Duration::from_millis(100)).unwrap();
        let result = api.fetch_summary().await;
        assert!(matches!(result, Err(DashboardError::Network(_))));
    }
}
