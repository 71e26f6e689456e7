//! Entity list controller.
//!
//! Owns the authoritative model list as last fetched, kept in display order,
//! and the current filter. Rows are rebuilt from that state on every change.

use std::cmp::Ordering;

use crate::client::{DashboardApi, DashboardError};
use crate::db::EntitySummary;
use crate::stats::{Canvas, Health, Sparkline, StatusClass};

/// Render-ready table row.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRow {
    pub id: String,
    /// `None` when the model has no probes in the window.
    pub health: Option<Health>,
    /// Latest-status badge only. Health comes from `health`, never from this.
    pub status: StatusClass,
    pub uptime_24h: Option<f64>,
    pub avg_latency_24h: Option<f64>,
    pub sparkline: Sparkline,
    pub consecutive_failures: u32,
}

impl EntityRow {
    fn new(entry: &EntitySummary, canvas: Canvas) -> Self {
        Self {
            id: entry.id.clone(),
            health: entry.uptime_24h.map(Health::from_uptime),
            status: StatusClass::from_label(&entry.latest_status),
            uptime_24h: entry.uptime_24h,
            avg_latency_24h: entry.avg_latency_24h,
            sparkline: Sparkline::build(&entry.sparkline_data, canvas),
            consecutive_failures: entry.consecutive_failures,
        }
    }
}

#[derive(Debug, Default)]
pub struct EntityList {
    entries: Vec<EntitySummary>,
    filter: String,
    canvas: Canvas,
}

impl EntityList {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            ..Default::default()
        }
    }

    /// Fetch the model list and make it the current state.
    ///
    /// Returns `None` and keeps the previous list if the fetch fails.
    pub async fn load(&mut self, api: &dyn DashboardApi) -> Option<Vec<EntityRow>> {
        let result = api.fetch_models().await;
        self.apply_fetch(result, api.description())
    }

    /// Install the outcome of a model list fetch made elsewhere.
    pub fn apply_fetch(
        &mut self,
        result: Result<Vec<EntitySummary>, DashboardError>,
        source: &str,
    ) -> Option<Vec<EntityRow>> {
        match result {
            Ok(entries) => {
                tracing::debug!("Loaded {} models from {}", entries.len(), source);
                Some(self.replace(entries))
            }
            Err(e) => {
                tracing::warn!("Failed to load model list from {}: {}", source, e);
                None
            }
        }
    }

    /// Replace the list, sort it and return the filtered rows.
    pub fn replace(&mut self, mut entries: Vec<EntitySummary>) -> Vec<EntityRow> {
        sort_entries(&mut entries);
        self.entries = entries;
        self.rows()
    }

    /// Case-insensitive substring filter on model id. Does not re-fetch.
    pub fn set_filter(&mut self, text: &str) -> Vec<EntityRow> {
        self.filter = text.to_lowercase();
        self.rows()
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Number of models held, regardless of the filter.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rows(&self) -> Vec<EntityRow> {
        self.entries
            .iter()
            .filter(|e| e.id.to_lowercase().contains(&self.filter))
            .map(|e| EntityRow::new(e, self.canvas))
            .collect()
    }
}

/// Default display order: uptime descending with no-data models last, then
/// average latency ascending with missing latency last, then id.
pub fn sort_entries(entries: &mut [EntitySummary]) {
    entries.sort_by(compare_entries);
}

fn compare_entries(a: &EntitySummary, b: &EntitySummary) -> Ordering {
    let uptime = match (a.uptime_24h, b.uptime_24h) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    let latency = a
        .avg_latency_24h
        .unwrap_or(f64::INFINITY)
        .total_cmp(&b.avg_latency_24h.unwrap_or(f64::INFINITY));

    uptime.then(latency).then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ProbeRecord, Summary};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn entry(id: &str, uptime: Option<f64>, latency: Option<f64>) -> EntitySummary {
        EntitySummary {
            id: id.to_string(),
            latest_status: "OK".to_string(),
            uptime_24h: uptime,
            avg_latency_24h: latency,
            sparkline_data: vec![latency],
            consecutive_failures: 0,
        }
    }

    fn ids(rows: &[EntityRow]) -> Vec<&str> {
        rows.iter().map(|r| r.id.as_str()).collect()
    }

    struct ScriptedApi {
        models: Mutex<Vec<Result<Vec<EntitySummary>, DashboardError>>>,
    }

    #[async_trait]
    impl DashboardApi for ScriptedApi {
        async fn fetch_summary(&self) -> Result<Summary, DashboardError> {
            Ok(Summary::default())
        }

        async fn fetch_models(&self) -> Result<Vec<EntitySummary>, DashboardError> {
            self.models.lock().unwrap().remove(0)
        }

        async fn fetch_history(&self, id: &str) -> Result<Vec<ProbeRecord>, DashboardError> {
            Err(DashboardError::NotFound(id.to_string()))
        }

        fn description(&self) -> &str {
            "scripted"
        }
    }

    #[test]
    fn test_latency_tie_break_puts_missing_last() {
        let mut list = EntityList::default();
        let rows = list.replace(vec![entry("b", Some(90.0), None), entry("a", Some(90.0), Some(5.0))]);
        assert_eq!(ids(&rows), vec!["a", "b"]);
    }

    #[test]
    fn test_full_sort_order() {
        let mut list = EntityList::default();
        let rows = list.replace(vec![
            entry("z-nodata", None, None),
            entry("slow", Some(100.0), Some(900.0)),
            entry("half", Some(50.0), Some(10.0)),
            entry("fast", Some(100.0), Some(100.0)),
            entry("b-twin", Some(75.0), Some(20.0)),
            entry("a-twin", Some(75.0), Some(20.0)),
        ]);
        assert_eq!(
            ids(&rows),
            vec!["fast", "slow", "a-twin", "b-twin", "half", "z-nodata"]
        );
    }

    #[test]
    fn test_filter_is_case_insensitive_and_keeps_order() {
        let mut list = EntityList::default();
        list.replace(vec![entry("openai/gpt", Some(99.0), None), entry("meta/llama", Some(95.0), None)]);

        assert_eq!(ids(&list.set_filter("meta")), vec!["meta/llama"]);
        assert_eq!(ids(&list.set_filter("META")), vec!["meta/llama"]);
        assert_eq!(list.filter(), "meta");
        assert!(list.set_filter("mistral").is_empty());
        assert_eq!(ids(&list.set_filter("")), vec!["openai/gpt", "meta/llama"]);
    }

    #[test]
    fn test_filter_survives_replace() {
        let mut list = EntityList::default();
        list.set_filter("Gem");
        let rows = list.replace(vec![entry("google/gemma", Some(80.0), None), entry("x", Some(1.0), None)]);
        assert_eq!(ids(&rows), vec!["google/gemma"]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_row_fields() {
        let mut list = EntityList::new(Canvas { width: 10.0, height: 10.0 });
        let mut failing = entry("down", Some(20.0), None);
        failing.latest_status = "HTTP 502".to_string();
        failing.consecutive_failures = 4;
        failing.sparkline_data = vec![];

        let rows = list.replace(vec![entry("up", Some(100.0), Some(50.0)), failing, entry("quiet", None, None)]);

        assert_eq!(rows[0].health, Some(Health::Normal));
        assert_eq!(rows[0].status, StatusClass::Ok);
        assert!(matches!(rows[0].sparkline, Sparkline::Bars { .. }));

        assert_eq!(rows[1].health, Some(Health::Down));
        assert_eq!(rows[1].status, StatusClass::HttpError("HTTP 502".to_string()));
        assert_eq!(rows[1].consecutive_failures, 4);
        assert_eq!(rows[1].sparkline, Sparkline::NoData);

        assert_eq!(rows[2].health, None);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_state() {
        let api = ScriptedApi {
            models: Mutex::new(vec![
                Ok(vec![entry("a", Some(100.0), None)]),
                Err(DashboardError::Network("connection refused".to_string())),
                Err(DashboardError::Parse("expected value".to_string())),
            ]),
        };
        let mut list = EntityList::default();

        let rows = list.load(&api).await.unwrap();
        assert_eq!(ids(&rows), vec!["a"]);

        assert!(list.load(&api).await.is_none());
        assert!(list.load(&api).await.is_none());
        assert_eq!(ids(&list.rows()), vec!["a"]);
    }

    #[test]
    fn test_badge_does_not_drive_health() {
        let mut list = EntityList::default();
        let mut recovering = entry("recovering", Some(20.0), None);
        recovering.latest_status = "OK".to_string();
        let mut limited = entry("limited", Some(100.0), None);
        limited.latest_status = "429".to_string();

        let rows = list.replace(vec![recovering, limited]);
        let recovering = rows.iter().find(|r| r.id == "recovering").unwrap();
        assert_eq!(recovering.status, StatusClass::Ok);
        assert_eq!(recovering.health, Some(Health::Down));

        let limited = rows.iter().find(|r| r.id == "limited").unwrap();
        assert_eq!(limited.status, StatusClass::RateLimited);
        assert_eq!(limited.health, Some(Health::Normal));
    }

    #[test]
    fn test_sort_is_idempotent() {
        let mut entries = vec![
            entry("c", Some(60.0), None),
            entry("a", Some(60.0), None),
            entry("b", Some(99.0), Some(3.0)),
        ];
        sort_entries(&mut entries);
        let once: Vec<String> = entries.iter().map(|e| e.id.clone()).collect();
        sort_entries(&mut entries);
        let twice: Vec<String> = entries.iter().map(|e| e.id.clone()).collect();
        assert_eq!(once, twice);
        assert_eq!(once, vec!["b", "a", "c"]);
    }
}
