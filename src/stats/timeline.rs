//! History chart series for one model.
//!
//! Pairs a running-uptime curve with a color-coded latency series. Both
//! series are derived from the same points, so they always line up on the
//! shared time axis.

use chrono::NaiveDateTime;

use crate::db::{ProbeRecord, STATUS_RATE_LIMITED};

/// Color class of a latency bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTag {
    Success,
    Warning,
    Error,
}

impl ColorTag {
    fn for_probe(record: &ProbeRecord) -> Self {
        if record.ok {
            ColorTag::Success
        } else if record.status_label == STATUS_RATE_LIMITED {
            ColorTag::Warning
        } else {
            ColorTag::Error
        }
    }

    pub fn hex(&self) -> &'static str {
        match self {
            ColorTag::Success => "#10B981",
            ColorTag::Warning => "#F59E0B",
            ColorTag::Error => "#EF4444",
        }
    }
}

/// One chart datum.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPoint {
    pub timestamp: NaiveDateTime,
    /// Measured latency, or 0 when the probe reported none.
    pub latency_value: f64,
    pub color: ColorTag,
    pub status_label: String,
    /// Success ratio of every point up to and including this one, in percent.
    pub running_uptime: f64,
}

/// Chart payload for one model's history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryChart {
    pub entity_id: String,
    pub points: Vec<HistoryPoint>,
}

impl HistoryChart {
    /// Aggregate `records`, oldest first.
    ///
    /// The running uptime restarts at the first record given, so it covers the
    /// fetched window rather than the model's whole lifetime.
    pub fn build(entity_id: &str, records: &[ProbeRecord]) -> Self {
        let mut successes = 0usize;

        let points = records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                if record.ok {
                    successes += 1;
                }
                HistoryPoint {
                    timestamp: record.timestamp,
                    latency_value: record.latency_ms.unwrap_or(0.0),
                    color: ColorTag::for_probe(record),
                    status_label: record.status_label.clone(),
                    running_uptime: 100.0 * successes as f64 / (i + 1) as f64,
                }
            })
            .collect();

        Self {
            entity_id: entity_id.to_string(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Shared x-axis.
    pub fn dates(&self) -> Vec<NaiveDateTime> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    pub fn latency_values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.latency_value).collect()
    }

    pub fn colors(&self) -> Vec<ColorTag> {
        self.points.iter().map(|p| p.color).collect()
    }

    pub fn uptime_series(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.running_uptime).collect()
    }

    /// Running uptime at the most recent point.
    pub fn final_uptime(&self) -> Option<f64> {
        self.points.last().map(|p| p.running_uptime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn probe(minute: u32, ok: bool, label: &str, latency_ms: Option<f64>) -> ProbeRecord {
        ProbeRecord {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(12, minute, 0)
                .unwrap(),
            ok,
            status_label: label.to_string(),
            latency_ms,
        }
    }

    #[test]
    fn test_single_rate_limited_probe() {
        let chart = HistoryChart::build("m", &[probe(0, false, "429", None)]);
        assert_eq!(chart.uptime_series(), vec![0.0]);
        assert_eq!(chart.latency_values(), vec![0.0]);
        assert_eq!(chart.colors(), vec![ColorTag::Warning]);
    }

    #[test]
    fn test_all_ok_is_flat_hundred() {
        let records: Vec<_> = (0..7).map(|m| probe(m, true, "OK", Some(m as f64))).collect();
        let chart = HistoryChart::build("m", &records);
        assert!(chart.uptime_series().iter().all(|u| *u == 100.0));
        assert!(chart.colors().iter().all(|c| *c == ColorTag::Success));
    }

    #[test]
    fn test_running_ratio_and_colors() {
        let records = vec![
            probe(0, true, "OK", Some(120.0)),
            probe(1, false, "HTTP 502", None),
            probe(2, false, "FAIL", Some(30.0)),
            probe(3, true, "OK", Some(80.0)),
        ];
        let chart = HistoryChart::build("google/gemma", &records);

        assert_eq!(chart.uptime_series(), vec![100.0, 50.0, 100.0 / 3.0, 50.0]);
        assert_eq!(chart.latency_values(), vec![120.0, 0.0, 30.0, 80.0]);
        assert_eq!(
            chart.colors(),
            vec![ColorTag::Success, ColorTag::Error, ColorTag::Error, ColorTag::Success]
        );
        assert_eq!(chart.final_uptime(), Some(50.0));
        assert_eq!(chart.points[1].status_label, "HTTP 502");
    }

    #[test]
    fn test_series_share_length() {
        let records = vec![probe(0, false, "FAIL", None), probe(1, true, "OK", None)];
        let chart = HistoryChart::build("m", &records);
        assert_eq!(chart.len(), 2);
        assert_eq!(chart.dates().len(), chart.uptime_series().len());
        assert_eq!(chart.latency_values().len(), chart.uptime_series().len());
    }

    #[test]
    fn test_empty_history() {
        let chart = HistoryChart::build("m", &[]);
        assert!(chart.is_empty());
        assert_eq!(chart.final_uptime(), None);
    }
}
