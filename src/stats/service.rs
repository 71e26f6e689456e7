//! Dashboard payloads assembled from the probe store.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDateTime;

use super::analysis::{StatusGrid, TrendReport};
use super::health::Health;
use super::rolling::{summarize, RollingSettings};
use crate::db::{DbError, EntitySummary, ProbeRecord, Store, Summary};

/// Computes the summary, model list and history payloads.
#[derive(Clone)]
pub struct StatsService {
    store: Arc<Store>,
    settings: RollingSettings,
    history_limit: u32,
}

impl StatsService {
    pub fn new(store: Arc<Store>, settings: RollingSettings, history_limit: u32) -> Self {
        Self {
            store,
            settings,
            history_limit,
        }
    }

    /// Fleet counts for the models checked in the latest run.
    ///
    /// Models without probes in the lookback window only count toward the total.
    pub fn summary(&self, now: NaiveDateTime) -> Result<Summary, DbError> {
        let Some(latest) = self.store.latest_run()? else {
            return Ok(Summary::default());
        };

        let models = self.models(now)?;
        let mut summary = Summary {
            total_models: models.len(),
            last_updated: Some(latest.run_datetime),
            ..Default::default()
        };

        for health in models.iter().filter_map(|m| m.uptime_24h).map(Health::from_uptime) {
            match health {
                Health::Normal => summary.healthy_count += 1,
                Health::Unstable => summary.degraded_count += 1,
                Health::Down => summary.down_count += 1,
            }
        }

        Ok(summary)
    }

    /// Rolling stats for every model checked in the latest run.
    pub fn models(&self, now: NaiveDateTime) -> Result<Vec<EntitySummary>, DbError> {
        let Some(latest) = self.store.latest_run()? else {
            return Ok(Vec::new());
        };

        let model_ids: Vec<String> = self
            .store
            .checks_for_run(latest.id)?
            .into_iter()
            .map(|c| c.model_id)
            .collect();
        let wanted: HashSet<&str> = model_ids.iter().map(String::as_str).collect();

        let mut histories: BTreeMap<String, Vec<ProbeRecord>> = BTreeMap::new();
        for (timestamp, check) in self.store.checks_since(now - self.settings.lookback)? {
            if !wanted.contains(check.model_id.as_str()) {
                continue;
            }
            histories
                .entry(check.model_id.clone())
                .or_default()
                .push(check.into_probe(timestamp));
        }

        let models = model_ids
            .iter()
            .map(|id| {
                let history = histories.get(id).map(Vec::as_slice).unwrap_or(&[]);
                summarize(id, history, now, &self.settings)
            })
            .collect();

        Ok(models)
    }

    /// Recent probes for one model, oldest first. `None` if the model is unknown.
    pub fn history(&self, model_id: &str) -> Result<Option<Vec<ProbeRecord>>, DbError> {
        if !self.store.has_model(model_id)? {
            return Ok(None);
        }
        Ok(Some(self.store.model_history(model_id, self.history_limit)?))
    }

    /// Trend analysis over the last `runs` runs, listing at most `top_n`
    /// models per candidate group.
    pub fn trends(&self, runs: u32, top_n: usize) -> Result<TrendReport, DbError> {
        let runs = self
            .store
            .recent_runs(runs)?
            .into_iter()
            .map(|run| {
                let checks = self.store.checks_for_run(run.id)?;
                Ok((run, checks))
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(TrendReport::build(&StatusGrid::from_runs(&runs), top_n))
    }
}
