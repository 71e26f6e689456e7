//! Database model types and the JSON shapes served to the dashboard.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Label of a successful probe.
pub const STATUS_OK: &str = "OK";
/// Label of a rate-limited probe.
pub const STATUS_RATE_LIMITED: &str = "429";
/// Label of a probe that failed without an HTTP status.
pub const STATUS_FAIL: &str = "FAIL";
/// Label used when a model has no probe in the lookback window.
pub const STATUS_MISSING: &str = "MISS";

/// Format the scouter writes into `runs.run_datetime`.
pub const RUN_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One scan run. Every model checked in a scan shares the run's datetime.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub id: i64,
    pub run_datetime: NaiveDateTime,
}

/// A single row of the `healthchecks` table.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthCheck {
    pub run_id: i64,
    pub model_id: String,
    pub ok: bool,
    pub http_status: Option<i64>,
    pub error_category: Option<String>,
    pub latency_ms: Option<i64>,
}

impl HealthCheck {
    /// Short categorical label for this check.
    pub fn status_label(&self) -> String {
        if self.ok {
            return STATUS_OK.to_string();
        }
        if self.http_status == Some(429) || self.error_category.as_deref() == Some("rate_limited") {
            return STATUS_RATE_LIMITED.to_string();
        }
        match self.http_status {
            Some(code) => format!("HTTP {}", code),
            None => STATUS_FAIL.to_string(),
        }
    }

    /// Convert into the probe record shape, stamped with its run time.
    pub fn into_probe(self, timestamp: NaiveDateTime) -> ProbeRecord {
        ProbeRecord {
            status_label: self.status_label(),
            timestamp,
            ok: self.ok,
            latency_ms: self.latency_ms.map(|ms| ms as f64),
        }
    }
}

/// One probe result for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeRecord {
    #[serde(rename = "run_datetime", with = "run_time")]
    pub timestamp: NaiveDateTime,
    pub ok: bool,
    pub status_label: String,
    #[serde(default)]
    pub latency_ms: Option<f64>,
}

/// Current snapshot for one monitored model.
///
/// `uptime_24h` is `None` when the lookback window holds no probes at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySummary {
    #[serde(rename = "model_id")]
    pub id: String,
    pub latest_status: String,
    #[serde(default)]
    pub uptime_24h: Option<f64>,
    #[serde(default)]
    pub avg_latency_24h: Option<f64>,
    #[serde(default)]
    pub sparkline_data: Vec<Option<f64>>,
    #[serde(default)]
    pub consecutive_failures: u32,
}

/// Fleet-wide counts shown above the model table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_models: usize,
    pub healthy_count: usize,
    pub degraded_count: usize,
    pub down_count: usize,
    #[serde(default, with = "run_time_opt")]
    pub last_updated: Option<NaiveDateTime>,
}

/// Parse a run datetime as written by the scouter or by an ISO-8601 producer.
pub fn parse_run_time(s: &str) -> Option<NaiveDateTime> {
    let formats = [
        RUN_TIME_FORMAT,
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];

    let s = s.trim();
    for fmt in &formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local())
}

/// Serde adapter for run datetimes in the scouter's text format.
pub mod run_time {
    use super::{parse_run_time, RUN_TIME_FORMAT};
    use chrono::NaiveDateTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(RUN_TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_run_time(&raw).ok_or_else(|| D::Error::custom(format!("invalid run datetime: {}", raw)))
    }
}

/// Same as [`run_time`] for nullable fields.
pub mod run_time_opt {
    use super::{parse_run_time, RUN_TIME_FORMAT};
    use chrono::NaiveDateTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.collect_str(&dt.format(RUN_TIME_FORMAT)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse_run_time(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid run datetime: {}", raw))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn check(ok: bool, http_status: Option<i64>, error_category: Option<&str>) -> HealthCheck {
        HealthCheck {
            run_id: 1,
            model_id: "meta/llama".to_string(),
            ok,
            http_status,
            error_category: error_category.map(str::to_string),
            latency_ms: None,
        }
    }

    #[test]
    fn test_status_label() {
        assert_eq!(check(true, Some(200), None).status_label(), "OK");
        assert_eq!(check(false, Some(429), None).status_label(), "429");
        assert_eq!(check(false, None, Some("rate_limited")).status_label(), "429");
        assert_eq!(check(false, Some(503), None).status_label(), "HTTP 503");
        assert_eq!(check(false, None, Some("timeout")).status_label(), "FAIL");
    }

    #[test]
    fn test_parse_run_time_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(parse_run_time("2023-01-01 10:00:00"), Some(expected));
        assert_eq!(parse_run_time("2023-01-01T10:00:00"), Some(expected));
        assert_eq!(parse_run_time("2023-01-01T10:00:00+02:00"), Some(expected));
        assert_eq!(parse_run_time("yesterday"), None);
    }

    #[test]
    fn test_probe_record_wire_format() {
        let json = r#"{"run_datetime":"2023-01-01 10:00:00","ok":false,"status_label":"429","latency_ms":null}"#;
        let record: ProbeRecord = serde_json::from_str(json).unwrap();
        assert!(!record.ok);
        assert_eq!(record.latency_ms, None);

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["run_datetime"], "2023-01-01 10:00:00");
    }

    #[test]
    fn test_entity_summary_accepts_sparse_payload() {
        // The older server omits sparkline_data and may send integer latencies.
        let json = r#"{"model_id":"google/gemma","latest_status":"OK","uptime_24h":100.0,"avg_latency_24h":120,"consecutive_failures":0}"#;
        let entity: EntitySummary = serde_json::from_str(json).unwrap();
        assert_eq!(entity.id, "google/gemma");
        assert_eq!(entity.avg_latency_24h, Some(120.0));
        assert!(entity.sparkline_data.is_empty());
    }

    #[test]
    fn test_summary_null_last_updated() {
        let json = r#"{"total_models":0,"healthy_count":0,"degraded_count":0,"down_count":0,"last_updated":null}"#;
        let summary: Summary = serde_json::from_str(json).unwrap();
        assert_eq!(summary, Summary::default());
    }
}
