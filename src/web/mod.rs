//! Web server module.

mod handlers;

pub use handlers::*;

use crate::config::ServerConfig;
use crate::stats::StatsService;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub service: StatsService,
}

/// JSON API consumed by dashboard sessions.
pub struct Server {
    state: AppState,
}

impl Server {
    pub fn new(config: ServerConfig, service: StatsService) -> Self {
        Self {
            state: AppState { config, service },
        }
    }

    /// Build the router with all routes.
    fn routes(&self) -> Router {
        let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

        Router::new()
            .route("/api/summary", get(handlers::handle_summary))
            .route("/api/models", get(handlers::handle_models))
            .route("/api/trends", get(handlers::handle_trends))
            // Model ids contain '/', so the history route is matched by suffix.
            .route("/api/models/{*path}", get(handlers::handle_model_path))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(self.state.clone())
    }

    /// Start the server on the configured address.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = self.state.config.bind_addr();
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("Web server listening on {}", addr);
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        axum::serve(listener, self.routes()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{DashboardApi, DashboardError, HttpApi};
    use crate::db::{HealthCheck, Store};
    use crate::stats::RollingSettings;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_http_client_against_server() {
        let tmp = NamedTempFile::new().unwrap();
        let store = Arc::new(Store::new(tmp.path()).unwrap());
        let run = store.insert_run("2024-03-01 10:00:00").unwrap();
        for (model_id, ok) in [("google/gemma-2-9b", true), ("mistral", false)] {
            store
                .insert_check(&HealthCheck {
                    run_id: run,
                    model_id: model_id.to_string(),
                    ok,
                    http_status: if ok { Some(200) } else { Some(429) },
                    error_category: None,
                    latency_ms: ok.then_some(150),
                })
                .unwrap();
        }

        let service = StatsService::new(store, RollingSettings::default(), 50);
        let server = Server::new(ServerConfig::default(), service);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { server.serve(listener).await });

        let api = HttpApi::new(&format!("http://{}/api", addr), Duration::from_secs(5)).unwrap();

        let summary = api.fetch_summary().await.unwrap();
        assert_eq!(summary.total_models, 2);

        let models = api.fetch_models().await.unwrap();
        let ids: Vec<&str> = models.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["google/gemma-2-9b", "mistral"]);

        let history = api.fetch_history("google/gemma-2-9b").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].latency_ms, Some(150.0));

        let history = api.fetch_history("mistral").await.unwrap();
        assert_eq!(history[0].status_label, "429");

        let missing = api.fetch_history("google").await;
        assert_eq!(missing, Err(DashboardError::NotFound("google".to_string())));

        let trends: serde_json::Value = reqwest::get(format!("http://{}/api/trends?runs=1&top=1", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(trends["runs"][0]["rate_limited"], 1);
        assert!(trends["recommendations"][0].as_str().unwrap().starts_with("High 429 pressure"));
    }
}
