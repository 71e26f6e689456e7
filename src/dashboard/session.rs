//! Dashboard session.
//!
//! A single task owns the entity list, the chart slot and the request
//! counters. Fetches run in spawned tasks and report back over an internal
//! channel, so the loop never waits on the network. Completions arrive in any
//! order; each carries the sequence number of the request that started it and
//! is dropped once a newer one has been applied.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval};

use super::events::{Command, Notification};
use super::list::EntityList;
use crate::client::{DashboardApi, DashboardError};
use crate::db::{EntitySummary, ProbeRecord, Summary};
use crate::stats::{Canvas, HistoryChart};

/// The one chart a session may show.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ChartSlot {
    #[default]
    Empty,
    Loading { id: String },
    Ready(HistoryChart),
    Failed { id: String, reason: String },
}

impl ChartSlot {
    pub fn entity_id(&self) -> Option<&str> {
        match self {
            ChartSlot::Empty => None,
            ChartSlot::Loading { id } | ChartSlot::Failed { id, .. } => Some(id),
            ChartSlot::Ready(chart) => Some(&chart.entity_id),
        }
    }
}

enum Completion {
    Summary {
        seq: u64,
        result: Result<Summary, DashboardError>,
    },
    Models {
        seq: u64,
        result: Result<Vec<EntitySummary>, DashboardError>,
    },
    History {
        seq: u64,
        id: String,
        result: Result<Vec<ProbeRecord>, DashboardError>,
    },
}

pub struct Session {
    api: Arc<dyn DashboardApi>,
    list: EntityList,
    chart: ChartSlot,
    refresh_seq: u64,
    summary_applied: u64,
    models_applied: u64,
    history_seq: u64,
    history_task: Option<JoinHandle<()>>,
    refresh_every: Option<Duration>,
    notify: mpsc::Sender<Notification>,
    done_tx: mpsc::UnboundedSender<Completion>,
    done_rx: mpsc::UnboundedReceiver<Completion>,
}

impl Session {
    pub fn new(api: Arc<dyn DashboardApi>, canvas: Canvas, notify: mpsc::Sender<Notification>) -> Self {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        Self {
            api,
            list: EntityList::new(canvas),
            chart: ChartSlot::Empty,
            refresh_seq: 0,
            summary_applied: 0,
            models_applied: 0,
            history_seq: 0,
            history_task: None,
            refresh_every: None,
            notify,
            done_tx,
            done_rx,
        }
    }

    /// Refresh automatically every `period`. Zero disables the timer.
    pub fn with_refresh_interval(mut self, period: Duration) -> Self {
        self.refresh_every = (!period.is_zero()).then_some(period);
        self
    }

    /// Load once, then process commands until `Shutdown` or the sender is dropped.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        tracing::info!("Dashboard session started against {}", self.api.description());

        let mut ticker = self.refresh_every.map(|p| interval_at(Instant::now() + p, p));
        self.refresh();

        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.handle(cmd).await,
                },
                Some(done) = self.done_rx.recv() => self.complete(done).await,
                _ = next_tick(&mut ticker) => self.refresh(),
            }
        }

        self.dispose_chart().await;
        tracing::info!("Dashboard session stopped");
    }

    async fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Refresh => self.refresh(),
            Command::SetFilter(text) => {
                let rows = self.list.set_filter(&text);
                self.publish(Notification::ListUpdated(rows)).await;
            }
            Command::ShowHistory { id } => self.show_history(id).await,
            Command::CloseHistory => self.dispose_chart().await,
            Command::Shutdown => {}
        }
    }

    /// Start the summary and model list fetches. Neither waits for the other.
    fn refresh(&mut self) {
        self.refresh_seq += 1;
        let seq = self.refresh_seq;

        let api = self.api.clone();
        let done = self.done_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_summary().await;
            let _ = done.send(Completion::Summary { seq, result });
        });

        let api = self.api.clone();
        let done = self.done_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_models().await;
            let _ = done.send(Completion::Models { seq, result });
        });
    }

    async fn show_history(&mut self, id: String) {
        self.dispose_chart().await;

        self.history_seq += 1;
        let seq = self.history_seq;
        self.chart = ChartSlot::Loading { id: id.clone() };
        self.publish(Notification::HistoryLoading { id: id.clone() }).await;

        let api = self.api.clone();
        let done = self.done_tx.clone();
        self.history_task = Some(tokio::spawn(async move {
            let result = api.fetch_history(&id).await;
            let _ = done.send(Completion::History { seq, id, result });
        }));
    }

    /// Tear down the current chart and cancel its pending fetch, if any.
    async fn dispose_chart(&mut self) {
        if let Some(task) = self.history_task.take() {
            task.abort();
        }
        let previous = std::mem::take(&mut self.chart);
        if let Some(id) = previous.entity_id() {
            self.publish(Notification::ChartDisposed { id: id.to_string() }).await;
        }
    }

    async fn complete(&mut self, done: Completion) {
        match done {
            Completion::Summary { seq, result } => {
                if seq < self.summary_applied {
                    tracing::debug!("Discarding summary from superseded refresh {}", seq);
                    return;
                }
                self.summary_applied = seq;
                match result {
                    Ok(summary) => self.publish(Notification::SummaryUpdated(summary)).await,
                    Err(e) => tracing::warn!("Failed to load summary from {}: {}", self.api.description(), e),
                }
            }
            Completion::Models { seq, result } => {
                if seq < self.models_applied {
                    tracing::debug!("Discarding model list from superseded refresh {}", seq);
                    return;
                }
                self.models_applied = seq;
                if let Some(rows) = self.list.apply_fetch(result, self.api.description()) {
                    self.publish(Notification::ListUpdated(rows)).await;
                }
            }
            Completion::History { seq, id, result } => {
                let current = matches!(&self.chart, ChartSlot::Loading { id: loading } if *loading == id);
                if seq != self.history_seq || !current {
                    tracing::debug!("Discarding stale history response for {}", id);
                    return;
                }
                self.history_task = None;

                match result {
                    Ok(records) => {
                        let chart = HistoryChart::build(&id, &records);
                        self.chart = ChartSlot::Ready(chart.clone());
                        self.publish(Notification::HistoryLoaded(chart)).await;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load history for {}: {}", id, e);
                        let reason = e.to_string();
                        self.chart = ChartSlot::Failed {
                            id: id.clone(),
                            reason: reason.clone(),
                        };
                        self.publish(Notification::HistoryFailed { id, reason }).await;
                    }
                }
            }
        }
    }

    async fn publish(&self, notification: Notification) {
        if self.notify.send(notification).await.is_err() {
            tracing::debug!("Notification dropped: renderer is gone");
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
