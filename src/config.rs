//! Configuration module for Scoutboard.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

use crate::stats::RollingSettings;

/// Configuration shared by every binary mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Interface the web server binds to (default: "0.0.0.0")
    pub http_host: String,
    /// HTTP port for the web server (default: 8000)
    pub http_port: u16,
    /// Path to the scouter's SQLite file (default: "results/scouter.db")
    pub db_path: String,
    /// Base URL the `watch` mode reads from (default: "http://127.0.0.1:8000/api")
    pub api_url: String,
    pub lookback_hours: i64,
    /// Runs returned by the history endpoint (default: 50)
    pub history_limit: u32,
    /// Samples kept per model sparkline (default: 20)
    pub sparkline_len: usize,
    pub request_timeout_secs: u64,
    /// Automatic refresh period for dashboard sessions, 0 disables (default: 30)
    pub refresh_secs: u64,
    /// Runs covered by the trend report (default: 24)
    pub trend_runs: u32,
    /// Models listed per trend candidate group (default: 10)
    pub trend_top: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_host: "0.0.0.0".to_string(),
            http_port: 8000,
            db_path: "results/scouter.db".to_string(),
            api_url: "http://127.0.0.1:8000/api".to_string(),
            lookback_hours: 24,
            history_limit: 50,
            sparkline_len: 20,
            request_timeout_secs: 10,
            refresh_secs: 30,
            trend_runs: 24,
            trend_top: 10,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables (all prefixed with `SCOUTBOARD_`):
    /// `HTTP_HOST`, `HTTP_PORT`, `DB_PATH`, `API_URL`, `LOOKBACK_HOURS`,
    /// `HISTORY_LIMIT`, `SPARKLINE_LEN`, `REQUEST_TIMEOUT_SECS`, `REFRESH_SECS`, `TREND_RUNS`, `TREND_TOP`.
    /// Values that fail to parse keep their default.
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let mut cfg = Self::default();
        let var = |name: &str| lookup(&format!("SCOUTBOARD_{}", name));

        if let Some(host) = var("HTTP_HOST") {
            cfg.http_host = host;
        }
        if let Some(db_path) = var("DB_PATH") {
            cfg.db_path = db_path;
        }
        if let Some(api_url) = var("API_URL") {
            cfg.api_url = api_url;
        }

        parse_into(var("HTTP_PORT"), &mut cfg.http_port);
        parse_into(var("HISTORY_LIMIT"), &mut cfg.history_limit);
        parse_into(var("SPARKLINE_LEN"), &mut cfg.sparkline_len);
        parse_into(var("REQUEST_TIMEOUT_SECS"), &mut cfg.request_timeout_secs);
        parse_into(var("REFRESH_SECS"), &mut cfg.refresh_secs);
        parse_into(var("TREND_RUNS"), &mut cfg.trend_runs);
        parse_into(var("TREND_TOP"), &mut cfg.trend_top);

        let mut hours = cfg.lookback_hours;
        parse_into(var("LOOKBACK_HOURS"), &mut hours);
        if hours > 0 {
            cfg.lookback_hours = hours;
        }

        cfg
    }

    pub fn rolling_settings(&self) -> RollingSettings {
        RollingSettings {
            lookback: chrono::Duration::hours(self.lookback_hours),
            sparkline_len: self.sparkline_len,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

fn parse_into<T: std::str::FromStr>(value: Option<String>, target: &mut T) {
    if let Some(parsed) = value.and_then(|v| v.trim().parse().ok()) {
        *target = parsed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.http_port, 8000);
        assert_eq!(cfg.db_path, "results/scouter.db");
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8000");
        assert_eq!(cfg.rolling_settings(), RollingSettings::default());
        assert_eq!((cfg.trend_runs, cfg.trend_top), (24, 10));
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let vars: HashMap<&str, &str> = [
            ("SCOUTBOARD_HTTP_PORT", "9100"),
            ("SCOUTBOARD_DB_PATH", "/tmp/s.db"),
            ("SCOUTBOARD_HISTORY_LIMIT", "lots"),
            ("SCOUTBOARD_LOOKBACK_HOURS", "-3"),
            ("SCOUTBOARD_SPARKLINE_LEN", " 30 "),
            ("SCOUTBOARD_REFRESH_SECS", "0"),
            ("SCOUTBOARD_TREND_RUNS", "6"),
        ]
        .into_iter()
        .collect();

        let cfg = ServerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.http_port, 9100);
        assert_eq!(cfg.db_path, "/tmp/s.db");
        assert_eq!(cfg.history_limit, 50);
        assert_eq!(cfg.lookback_hours, 24);
        assert_eq!(cfg.sparkline_len, 30);
        assert!(cfg.refresh_interval().is_zero());
        assert_eq!(cfg.trend_runs, 6);
    }
}
