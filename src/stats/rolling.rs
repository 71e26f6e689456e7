//! Rolling statistics over one model's probe history.
//!
//! All functions take the history oldest first, as the store returns it.

use chrono::{Duration, NaiveDateTime};

use crate::db::{EntitySummary, ProbeRecord, STATUS_MISSING};

/// Window and sample sizes used when summarizing a model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollingSettings {
    /// Trailing duration the uptime and latency figures cover.
    pub lookback: Duration,
    /// Number of most recent probes kept for the sparkline.
    pub sparkline_len: usize,
}

impl Default for RollingSettings {
    fn default() -> Self {
        Self {
            lookback: Duration::hours(24),
            sparkline_len: 20,
        }
    }
}

/// Statistics for a non-empty run of probes.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingStats {
    /// Percentage of ok probes, 0..=100.
    pub uptime: f64,
    /// Mean latency over ok probes that reported one.
    pub avg_latency: Option<f64>,
    pub latest_status: String,
    /// Trailing streak of failed probes.
    pub consecutive_failures: u32,
}

impl RollingStats {
    /// Returns `None` for an empty slice: uptime is undefined there, not 0%.
    pub fn compute(records: &[ProbeRecord]) -> Option<Self> {
        let latest = records.last()?;

        let ok_count = records.iter().filter(|r| r.ok).count();
        let uptime = 100.0 * ok_count as f64 / records.len() as f64;

        let latencies: Vec<f64> = records
            .iter()
            .filter(|r| r.ok)
            .filter_map(|r| r.latency_ms)
            .collect();
        let avg_latency = if latencies.is_empty() {
            None
        } else {
            Some(latencies.iter().sum::<f64>() / latencies.len() as f64)
        };

        let consecutive_failures = records.iter().rev().take_while(|r| !r.ok).count() as u32;

        Some(Self {
            uptime,
            avg_latency,
            latest_status: latest.status_label.clone(),
            consecutive_failures,
        })
    }
}

/// Trailing slice of `records` no older than `now - lookback`.
///
/// `records` must be sorted by timestamp, oldest first, as the store returns them.
pub fn window(records: &[ProbeRecord], now: NaiveDateTime, lookback: Duration) -> &[ProbeRecord] {
    let cutoff = now - lookback;
    let start = records.partition_point(|r| r.timestamp < cutoff);
    &records[start..]
}

/// Latencies of the last `len` probes; failed probes become gaps.
pub fn sparkline_samples(records: &[ProbeRecord], len: usize) -> Vec<Option<f64>> {
    records[records.len().saturating_sub(len)..]
        .iter()
        .map(|r| if r.ok { r.latency_ms } else { None })
        .collect()
}

/// Build the dashboard snapshot for one model.
pub fn summarize(
    id: &str,
    history: &[ProbeRecord],
    now: NaiveDateTime,
    settings: &RollingSettings,
) -> EntitySummary {
    let recent = window(history, now, settings.lookback);

    match RollingStats::compute(recent) {
        Some(stats) => EntitySummary {
            id: id.to_string(),
            latest_status: stats.latest_status,
            uptime_24h: Some(stats.uptime),
            avg_latency_24h: stats.avg_latency,
            sparkline_data: sparkline_samples(recent, settings.sparkline_len),
            consecutive_failures: stats.consecutive_failures,
        },
        None => EntitySummary {
            id: id.to_string(),
            latest_status: STATUS_MISSING.to_string(),
            uptime_24h: None,
            avg_latency_24h: None,
            sparkline_data: Vec::new(),
            consecutive_failures: 0,
        },
    }
}
