//! `scoutboard serve` exposes the JSON API over the scouter's SQLite file,
//! `scoutboard watch` runs a terminal dashboard against that API,
//! `scoutboard local` runs the same dashboard straight off the database and
//! `scoutboard report` prints the multi-run trend report.

use scoutboard::client::{DashboardApi, HttpApi, LocalApi};
use scoutboard::config::ServerConfig;
use scoutboard::console;
use scoutboard::dashboard::{Command, Session};
use scoutboard::db::Store;
use scoutboard::stats::{Canvas, StatsService};
use scoutboard::web::Server;

use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser, Debug)]
#[command(name = "scoutboard")]
#[command(about = "Health dashboard for the free model scouter's run history")]
struct Args {
    /// Path to the scouter's SQLite file (overrides SCOUTBOARD_DB_PATH)
    #[arg(long, global = true)]
    db_path: Option<String>,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Mode {
    /// Serve the JSON API (default)
    Serve,
    /// Terminal dashboard against a running API
    Watch {
        /// API base URL (overrides SCOUTBOARD_API_URL)
        #[arg(long)]
        api_url: Option<String>,
    },
    /// Terminal dashboard reading the database directly
    Local,
    /// Print the multi-run trend report and exit
    Report {
        /// Number of recent runs to analyze
        #[arg(long)]
        runs: Option<u32>,
        /// Models listed per candidate group
        #[arg(long)]
        top: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Logs go to stderr so they don't interleave with the terminal dashboard
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("scoutboard=info".parse()?))
        .init();

    let args = Args::parse();
    let mut cfg = ServerConfig::load();
    if let Some(db_path) = args.db_path {
        cfg.db_path = db_path;
    }

    match args.mode.unwrap_or(Mode::Serve) {
        Mode::Serve => {
            tracing::info!("Starting Scoutboard on {}...", cfg.bind_addr());
            let service = open_service(&cfg)?;
            Server::new(cfg, service).start().await
        }
        Mode::Watch { api_url } => {
            let api_url = api_url.unwrap_or_else(|| cfg.api_url.clone());
            let api = HttpApi::new(&api_url, cfg.request_timeout())?;
            watch(&cfg, Arc::new(api)).await
        }
        Mode::Local => {
            let api = LocalApi::new(open_service(&cfg)?, &cfg.db_path);
            watch(&cfg, Arc::new(api)).await
        }
        Mode::Report { runs, top } => {
            let service = open_service(&cfg)?;
            let report = service.trends(runs.unwrap_or(cfg.trend_runs), top.unwrap_or(cfg.trend_top))?;
            println!("{}", console::render_trend_report(&report));
            Ok(())
        }
    }
}

fn open_service(cfg: &ServerConfig) -> Result<StatsService, BoxError> {
    tracing::info!("Using database at {}", cfg.db_path);
    if let Some(dir) = Path::new(&cfg.db_path).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    let store = Arc::new(Store::new(&cfg.db_path)?);
    tracing::info!("Database initialized successfully");

    Ok(StatsService::new(store, cfg.rolling_settings(), cfg.history_limit))
}

/// Run a dashboard session, printing its notifications and feeding it stdin commands.
async fn watch(cfg: &ServerConfig, api: Arc<dyn DashboardApi>) -> Result<(), BoxError> {
    tracing::info!("Watching {}", api.description());

    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (note_tx, mut note_rx) = mpsc::channel(64);

    let session = Session::new(api, Canvas::default(), note_tx).with_refresh_interval(cfg.refresh_interval());
    let session = tokio::spawn(session.run(cmd_rx));
    let printer = tokio::spawn(async move {
        while let Some(notification) = note_rx.recv().await {
            println!("{}\n", console::render_notification(&notification));
        }
    });

    println!("{}", console::HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(cmd) = console::parse_command(&line) else {
            println!("{}", console::HELP);
            continue;
        };
        let quit = cmd == Command::Shutdown;
        if cmd_tx.send(cmd).await.is_err() || quit {
            break;
        }
    }

    drop(cmd_tx);
    session.await?;
    printer.await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_serve_is_default() {
        let args = Args::try_parse_from(["scoutboard"]).unwrap();
        assert_eq!(args.mode, None);
        assert_eq!(args.db_path, None);

        let args = Args::try_parse_from(["scoutboard", "serve", "--db-path", "/tmp/s.db"]).unwrap();
        assert_eq!(args.mode, Some(Mode::Serve));
        assert_eq!(args.db_path.as_deref(), Some("/tmp/s.db"));
    }

    #[test]
    fn test_mode_options() {
        let args = Args::try_parse_from(["scoutboard", "watch", "--api-url", "http://host:9000/api"]).unwrap();
        assert_eq!(
            args.mode,
            Some(Mode::Watch {
                api_url: Some("http://host:9000/api".to_string())
            })
        );

        let args = Args::try_parse_from(["scoutboard", "report", "--runs", "6"]).unwrap();
        assert_eq!(args.mode, Some(Mode::Report { runs: Some(6), top: None }));
    }

    #[test]
    fn test_bad_arguments() {
        assert!(Args::try_parse_from(["scoutboard", "dance"]).is_err());

        let err = Args::try_parse_from(["scoutboard", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);

        let err = Args::try_parse_from(["scoutboard", "report", "--runs", "many"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }
}
