use super::list::EntityRow;
use crate::db::Summary;
use crate::stats::HistoryChart;

/// Input to a running session.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Re-fetch the summary and the model list.
    Refresh,
    /// Replace the model id filter. Empty text shows every model.
    SetFilter(String),
    /// Open the history chart for one model.
    ShowHistory { id: String },
    CloseHistory,
    Shutdown,
}

/// State changes published by a session for the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    SummaryUpdated(Summary),
    ListUpdated(Vec<EntityRow>),
    HistoryLoading { id: String },
    HistoryLoaded(HistoryChart),
    HistoryFailed { id: String, reason: String },
    /// The chart for `id` was torn down and must no longer be shown.
    ChartDisposed { id: String },
}
