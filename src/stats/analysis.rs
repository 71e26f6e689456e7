//! Multi-run trend analysis.
//!
//! Works on a run-aligned status grid: one column per run, one row per model,
//! with [`STATUS_MISSING`] where a model was not checked in a run. Missing
//! cells never count as samples.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::db::{HealthCheck, Run, RUN_TIME_FORMAT, STATUS_MISSING, STATUS_OK, STATUS_RATE_LIMITED};

/// Fewest sampled runs before a model can be called stable or unstable.
pub const MIN_MODEL_SAMPLES: usize = 3;
pub const STABLE_OK_RATE_MIN: f64 = 0.9;
pub const STABLE_RATE_LIMITED_RATE_MAX: f64 = 0.1;
pub const UNSTABLE_FLIP_MIN: usize = 2;
pub const UNSTABLE_RATE_LIMITED_RATE_MIN: f64 = 0.5;
pub const UNSTABLE_OK_RATE_MAX: f64 = 0.5;

const HIGH_RATE_LIMIT_PRESSURE: f64 = 0.35;
const MODERATE_RATE_LIMIT_PRESSURE: f64 = 0.20;
const ELEVATED_FAIL_RATE: f64 = 0.20;
/// Models named in each recommendation.
const RECOMMENDATION_MODELS: usize = 3;

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

// --- Status grid ---

/// Statuses of every model across consecutive runs, oldest run first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusGrid {
    pub run_labels: Vec<String>,
    /// Model id → one status label per run.
    pub statuses: BTreeMap<String, Vec<String>>,
}

impl StatusGrid {
    /// Lay out the checks of each run, in the order given.
    pub fn from_runs(runs: &[(Run, Vec<HealthCheck>)]) -> Self {
        let run_labels = runs
            .iter()
            .map(|(run, _)| run.run_datetime.format(RUN_TIME_FORMAT).to_string())
            .collect();

        let mut statuses: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (index, (_, checks)) in runs.iter().enumerate() {
            for check in checks {
                let row = statuses
                    .entry(check.model_id.clone())
                    .or_insert_with(|| vec![STATUS_MISSING.to_string(); runs.len()]);
                row[index] = check.status_label();
            }
        }

        Self { run_labels, statuses }
    }

    fn column(&self, index: usize) -> impl Iterator<Item = &str> {
        self.statuses
            .values()
            .filter_map(move |row| row.get(index).map(String::as_str))
    }
}

// --- Counts ---

/// Sampled status counts. `checked` excludes missing cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub checked: usize,
    pub ok: usize,
    pub rate_limited: usize,
    pub failed: usize,
}

impl StatusCounts {
    /// Anything that is neither OK, 429 nor missing counts as failed.
    pub fn tally<'a>(statuses: impl IntoIterator<Item = &'a str>) -> Self {
        let mut counts = Self::default();
        for status in statuses {
            match status {
                STATUS_MISSING => continue,
                STATUS_OK => counts.ok += 1,
                STATUS_RATE_LIMITED => counts.rate_limited += 1,
                _ => counts.failed += 1,
            }
            counts.checked += 1;
        }
        counts
    }

    pub fn ok_rate(&self) -> f64 {
        ratio(self.ok, self.checked)
    }

    pub fn rate_limited_rate(&self) -> f64 {
        ratio(self.rate_limited, self.checked)
    }

    pub fn fail_rate(&self) -> f64 {
        ratio(self.failed, self.checked)
    }
}

/// Fleet counts for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSnapshot {
    pub label: String,
    #[serde(flatten)]
    pub counts: StatusCounts,
}

pub fn run_snapshots(grid: &StatusGrid) -> Vec<RunSnapshot> {
    grid.run_labels
        .iter()
        .enumerate()
        .map(|(index, label)| RunSnapshot {
            label: label.clone(),
            counts: StatusCounts::tally(grid.column(index)),
        })
        .collect()
}

// --- Per-model trends ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelTrend {
    pub model_id: String,
    #[serde(flatten)]
    pub counts: StatusCounts,
    /// Status changes between consecutive sampled runs.
    pub flip_count: usize,
    pub latest_status: String,
}

impl ModelTrend {
    pub fn samples(&self) -> usize {
        self.counts.checked
    }

    fn is_stable(&self) -> bool {
        self.samples() >= MIN_MODEL_SAMPLES
            && self.counts.ok_rate() >= STABLE_OK_RATE_MIN
            && self.counts.rate_limited_rate() <= STABLE_RATE_LIMITED_RATE_MAX
    }

    fn is_unstable(&self) -> bool {
        self.samples() >= MIN_MODEL_SAMPLES
            && (self.flip_count >= UNSTABLE_FLIP_MIN
                || self.counts.rate_limited_rate() >= UNSTABLE_RATE_LIMITED_RATE_MIN
                || self.counts.ok_rate() <= UNSTABLE_OK_RATE_MAX)
    }
}

/// Trend per model with at least one sampled run, in model id order.
pub fn model_trends(grid: &StatusGrid) -> Vec<ModelTrend> {
    grid.statuses
        .iter()
        .filter_map(|(model_id, row)| {
            let sampled: Vec<&str> = row
                .iter()
                .map(String::as_str)
                .filter(|s| *s != STATUS_MISSING)
                .collect();
            let latest = sampled.last()?;

            Some(ModelTrend {
                model_id: model_id.clone(),
                counts: StatusCounts::tally(sampled.iter().copied()),
                flip_count: sampled.windows(2).filter(|w| w[0] != w[1]).count(),
                latest_status: latest.to_string(),
            })
        })
        .collect()
}

/// Models reliable enough to route to first: best ok rate, then fewest 429s,
/// then most samples.
pub fn stable_candidates(trends: &[ModelTrend]) -> Vec<ModelTrend> {
    let mut candidates: Vec<ModelTrend> = trends.iter().filter(|t| t.is_stable()).cloned().collect();
    candidates.sort_by(|a, b| {
        b.counts
            .ok_rate()
            .total_cmp(&a.counts.ok_rate())
            .then(a.counts.rate_limited_rate().total_cmp(&b.counts.rate_limited_rate()))
            .then(b.samples().cmp(&a.samples()))
            .then_with(|| a.model_id.cmp(&b.model_id))
    });
    candidates
}

/// High-variance models: most flips first, then most 429s, then worst ok rate.
pub fn unstable_candidates(trends: &[ModelTrend]) -> Vec<ModelTrend> {
    let mut candidates: Vec<ModelTrend> = trends.iter().filter(|t| t.is_unstable()).cloned().collect();
    candidates.sort_by(|a, b| {
        b.flip_count
            .cmp(&a.flip_count)
            .then(b.counts.rate_limited_rate().total_cmp(&a.counts.rate_limited_rate()))
            .then(a.counts.ok_rate().total_cmp(&b.counts.ok_rate()))
            .then_with(|| a.model_id.cmp(&b.model_id))
    });
    candidates
}

// --- Run deltas ---

/// Models whose status crossed OK between the last two runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunDeltas {
    pub recovered: Vec<String>,
    pub regressed: Vec<String>,
    /// OK rate change in percentage points.
    pub ok_rate_delta: f64,
    pub rate_limited_rate_delta: f64,
}

/// `None` with fewer than two runs. Models missing from either run are skipped.
pub fn run_deltas(grid: &StatusGrid) -> Option<RunDeltas> {
    let runs = grid.run_labels.len();
    if runs < 2 {
        return None;
    }
    let (prev, curr) = (runs - 2, runs - 1);

    let mut deltas = RunDeltas::default();
    for (model_id, row) in &grid.statuses {
        let (Some(before), Some(after)) = (row.get(prev), row.get(curr)) else {
            continue;
        };
        if before == STATUS_MISSING || after == STATUS_MISSING {
            continue;
        }
        match (before == STATUS_OK, after == STATUS_OK) {
            (false, true) => deltas.recovered.push(model_id.clone()),
            (true, false) => deltas.regressed.push(model_id.clone()),
            _ => {}
        }
    }

    let before = StatusCounts::tally(grid.column(prev));
    let after = StatusCounts::tally(grid.column(curr));
    deltas.ok_rate_delta = (after.ok_rate() - before.ok_rate()) * 100.0;
    deltas.rate_limited_rate_delta = (after.rate_limited_rate() - before.rate_limited_rate()) * 100.0;

    Some(deltas)
}

// --- Report ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub runs: Vec<RunSnapshot>,
    pub stable: Vec<ModelTrend>,
    pub unstable: Vec<ModelTrend>,
    pub deltas: Option<RunDeltas>,
    pub recommendations: Vec<String>,
}

impl TrendReport {
    /// Analyze `grid`, keeping at most `top_n` models per candidate list.
    pub fn build(grid: &StatusGrid, top_n: usize) -> Self {
        let runs = run_snapshots(grid);
        let trends = model_trends(grid);
        let mut stable = stable_candidates(&trends);
        let mut unstable = unstable_candidates(&trends);

        let latest = runs.last().map(|r| r.counts).unwrap_or_default();
        let recommendations = recommendations(&latest, &stable, &unstable);

        stable.truncate(top_n);
        unstable.truncate(top_n);

        Self {
            runs,
            stable,
            unstable,
            deltas: run_deltas(grid),
            recommendations,
        }
    }

    pub fn latest(&self) -> Option<&RunSnapshot> {
        self.runs.last()
    }
}

fn model_list(trends: &[ModelTrend]) -> String {
    trends
        .iter()
        .take(RECOMMENDATION_MODELS)
        .map(|t| t.model_id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Operator advice for the latest run.
pub fn recommendations(latest: &StatusCounts, stable: &[ModelTrend], unstable: &[ModelTrend]) -> Vec<String> {
    if latest.checked == 0 {
        return vec!["No sampled models in the latest run. Check the scouter's API key and model list.".to_string()];
    }

    let mut advice = Vec::new();

    let rate_limited = latest.rate_limited_rate();
    if rate_limited >= HIGH_RATE_LIMIT_PRESSURE {
        advice.push("High 429 pressure: scan with concurrency 1, a 1s request delay and retries.".to_string());
    } else if rate_limited >= MODERATE_RATE_LIMIT_PRESSURE {
        advice.push("Moderate 429 pressure: reduce scan concurrency or add a request delay.".to_string());
    }

    if latest.fail_rate() >= ELEVATED_FAIL_RATE {
        advice.push("Non-429 failures are elevated: raise the request timeout and inspect provider errors.".to_string());
    }

    if !stable.is_empty() {
        advice.push(format!("Prefer stable models as primary routing candidates: {}.", model_list(stable)));
    }
    if !unstable.is_empty() {
        advice.push(format!(
            "Treat high-variance models as fallback-only until their trend improves: {}.",
            model_list(unstable)
        ));
    }

    if advice.is_empty() {
        advice.push("Current trend is healthy. Keep the existing scan profile.".to_string());
    }
    advice
}
