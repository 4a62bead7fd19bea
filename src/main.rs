use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use admitwatch::{artifacts, server, Monitor, MonitorConfig, Notifier, StatusStore};

fn parse_port_from_args() -> Option<u16> {
    let mut args = std::env::args().peekable();
    while let Some(a) = args.next() {
        if a == "--port" {
            if let Some(v) = args.next() {
                if let Ok(p) = v.parse::<u16>() {
                    return Some(p);
                }
            }
        } else if let Some(rest) = a.strip_prefix("--port=") {
            if let Ok(p) = rest.parse::<u16>() {
                return Some(p);
            }
        }
    }
    None
}

/// Tracing to stdout, plus an append-only log file under the artifacts dir
/// when it is writable. Returns the appender guard that must outlive main.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=warn"));

    let log_dir = artifacts::artifacts_dir();
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let appender = tracing_appender::rolling::never(&log_dir, "admitwatch.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false),
            )
            .init();
        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
        None
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log_guard = init_tracing();

    let cfg = Arc::new(MonitorConfig::load()?);
    info!(
        "admitwatch starting: {} target program(s), base {}",
        cfg.targets.len(),
        cfg.base_url
    );

    let http_timeout = std::env::var("HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(10);
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(http_timeout))
        .build()?;

    let notifier = Notifier::new(http_client, cfg.telegram.clone());
    if !notifier.enabled() {
        info!("telegram alerts disabled (no token/chat id configured)");
    }

    let status = StatusStore::new();
    let stop = Arc::new(AtomicBool::new(false));

    let monitor = Monitor::new(cfg.clone(), status.clone(), notifier, stop.clone());
    let monitor_task = tokio::spawn(monitor.run());

    let app = server::router(status);
    let port = parse_port_from_args().unwrap_or(cfg.status_port);
    let bind_addr = format!("0.0.0.0:{port}");
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            anyhow::bail!(
                "Address already in use: {bind_addr}. Stop the existing process or run with --port {} (or set ADMITWATCH_PORT/PORT).",
                port.saturating_add(1)
            )
        }
        Err(e) => return Err(e.into()),
    };
    info!("status surface listening on http://{bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(stop.clone()))
        .await?;

    // The stop flag is only honored at cycle boundaries; give the monitor a
    // bounded window to finish its in-flight step and release the browser.
    stop.store(true, Ordering::Relaxed);
    if tokio::time::timeout(Duration::from_secs(10), monitor_task)
        .await
        .is_err()
    {
        warn!("monitor still mid-cycle at shutdown; exiting anyway");
    }

    Ok(())
}

async fn shutdown_signal(stop: Arc<AtomicBool>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).ok();
        let mut sigint = signal(SignalKind::interrupt()).ok();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = async {
                if let Some(ref mut s) = sigterm {
                    s.recv().await;
                } else {
                    futures::future::pending::<()>().await;
                }
            } => {},
            _ = async {
                if let Some(ref mut s) = sigint {
                    s.recv().await;
                } else {
                    futures::future::pending::<()>().await;
                }
            } => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("shutdown signal received");
    stop.store(true, Ordering::Relaxed);
}
