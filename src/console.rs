//! Plain-text rendering of session notifications for the terminal modes.

use crate::dashboard::{Command, EntityRow, Notification};
use crate::db::Summary;
use crate::stats::{ColorTag, HistoryChart, ModelTrend, Sparkline, TrendReport};

const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const GAP_CHAR: char = '·';
const MISSING: &str = "-";

pub const HELP: &str = "Commands: r (refresh), /text (filter, '/' clears), h <model> (history), c (close history), q (quit)";

/// Parse one input line. `None` for anything unrecognized.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if let Some(filter) = line.strip_prefix('/') {
        return Some(Command::SetFilter(filter.to_string()));
    }

    match line.split_once(char::is_whitespace) {
        Some(("h", id)) if !id.trim().is_empty() => Some(Command::ShowHistory {
            id: id.trim().to_string(),
        }),
        Some(_) => None,
        None => match line {
            "" | "r" => Some(Command::Refresh),
            "c" => Some(Command::CloseHistory),
            "q" => Some(Command::Shutdown),
            _ => None,
        },
    }
}

pub fn render_notification(notification: &Notification) -> String {
    match notification {
        Notification::SummaryUpdated(summary) => render_summary(summary),
        Notification::ListUpdated(rows) => render_rows(rows),
        Notification::HistoryLoading { id } => format!("Loading history for {}...", id),
        Notification::HistoryLoaded(chart) => render_history(chart),
        Notification::HistoryFailed { id, reason } => {
            format!("!! Could not load history for {}: {}", id, reason)
        }
        Notification::ChartDisposed { id } => format!("(closed history for {})", id),
    }
}

pub fn render_summary(summary: &Summary) -> String {
    let updated = summary
        .last_updated
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());

    format!(
        "Models: {}  Healthy: {}  Degraded: {}  Down: {}  Last run: {}",
        summary.total_models, summary.healthy_count, summary.degraded_count, summary.down_count, updated
    )
}

pub fn render_rows(rows: &[EntityRow]) -> String {
    if rows.is_empty() {
        return "No models match.".to_string();
    }

    let mut out = format!(
        "{:<44} {:<9} {:>7} {:>9} {:<20} {:>5}  {}",
        "MODEL", "HEALTH", "UPTIME", "LATENCY", "RECENT", "FAILS", "LAST"
    );
    for row in rows {
        out.push('\n');
        out.push_str(&format!(
            "{:<44} {:<9} {:>7} {:>9} {:<20} {:>5}  {}",
            row.id,
            row.health.map(|h| h.label()).unwrap_or(MISSING),
            format_percent(row.uptime_24h),
            format_latency(row.avg_latency_24h),
            sparkline_text(&row.sparkline),
            row.consecutive_failures,
            row.status.label(),
        ));
    }
    out
}

pub fn render_history(chart: &HistoryChart) -> String {
    let mut out = format!(
        "History for {} ({} runs, uptime {})",
        chart.entity_id,
        chart.len(),
        format_percent(chart.final_uptime())
    );
    for point in &chart.points {
        out.push('\n');
        out.push_str(&format!(
            "  {} {} {:<10} {:>9} {:>7}",
            point.timestamp.format("%Y-%m-%d %H:%M"),
            marker(point.color),
            point.status_label,
            format!("{:.0} ms", point.latency_value),
            format!("{:.1}%", point.running_uptime),
        ));
    }
    out
}

/// Multi-run trend report for the `report` mode.
pub fn render_trend_report(report: &TrendReport) -> String {
    let mut out = format!("Trend over {} runs", report.runs.len());
    if let Some(latest) = report.latest() {
        out.push_str(&format!(
            " (latest {}: {} checked, ok {}, 429 {}, failed {})",
            latest.label,
            latest.counts.checked,
            format_rate(latest.counts.ok_rate()),
            format_rate(latest.counts.rate_limited_rate()),
            format_rate(latest.counts.fail_rate()),
        ));
    }

    if let Some(deltas) = &report.deltas {
        out.push_str(&format!(
            "\nSince previous run: ok {:+.1} pts, 429 {:+.1} pts",
            deltas.ok_rate_delta, deltas.rate_limited_rate_delta
        ));
        out.push_str(&format!("\n  Recovered: {}", model_names(&deltas.recovered)));
        out.push_str(&format!("\n  Regressed: {}", model_names(&deltas.regressed)));
    }

    out.push_str("\n\nRUN                  CHECKED      OK     429  FAILED");
    for run in &report.runs {
        out.push_str(&format!(
            "\n{:<20} {:>7} {:>7} {:>7} {:>7}",
            run.label,
            run.counts.checked,
            format_rate(run.counts.ok_rate()),
            format_rate(run.counts.rate_limited_rate()),
            format_rate(run.counts.fail_rate()),
        ));
    }

    out.push_str(&trend_table("Stable candidates", &report.stable));
    out.push_str(&trend_table("Unstable / 429 risk", &report.unstable));

    out.push_str("\n\nRecommended actions:");
    for advice in &report.recommendations {
        out.push_str(&format!("\n- {}", advice));
    }
    out
}

fn trend_table(title: &str, trends: &[ModelTrend]) -> String {
    let mut out = format!("\n\n{}:", title);
    if trends.is_empty() {
        out.push_str(" none");
        return out;
    }
    for trend in trends {
        out.push_str(&format!(
            "\n  {:<44} {:>3} samples  ok {:>6}  429 {:>6}  flips {:>2}  last {}",
            trend.model_id,
            trend.samples(),
            format_rate(trend.counts.ok_rate()),
            format_rate(trend.counts.rate_limited_rate()),
            trend.flip_count,
            trend.latest_status,
        ));
    }
    out
}

fn model_names(ids: &[String]) -> String {
    if ids.is_empty() {
        MISSING.to_string()
    } else {
        ids.join(", ")
    }
}

/// Block characters for each bar; gaps render as a dot.
pub fn sparkline_text(sparkline: &Sparkline) -> String {
    match sparkline {
        Sparkline::NoData => MISSING.to_string(),
        Sparkline::Bars { .. } => sparkline
            .levels()
            .into_iter()
            .map(|level| match level {
                Some(l) => SPARKLINE_CHARS[l.min(7) as usize],
                None => GAP_CHAR,
            })
            .collect(),
    }
}

fn marker(color: ColorTag) -> char {
    match color {
        ColorTag::Success => '+',
        ColorTag::Warning => '~',
        ColorTag::Error => 'x',
    }
}

fn format_percent(value: Option<f64>) -> String {
    value.map(|v| format!("{:.1}%", v)).unwrap_or_else(|| MISSING.to_string())
}

fn format_rate(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

fn format_latency(value: Option<f64>) -> String {
    value.map(|v| format!("{:.0} ms", v)).unwrap_or_else(|| MISSING.to_string())
}
