//! sigmon-alerts - Live signal-problem notification service
//!
//! Starts the alert feed against the monitoring service (historical
//! catch-up + SSE push subscription) and serves the read API until
//! Ctrl-C / SIGTERM, then releases the push subscription.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sigmon_common::config::ConfigResolver;
use sigmon_common::events::{EventBus, MonitorEvent};
use tokio::signal;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sigmon_alerts::feed::{FeedOptions, LiveAlertFeed};
use sigmon_alerts::transport::{HttpMeasurementSource, MeasurementSource, SsePushChannel};
use sigmon_alerts::{build_router, AppState};

/// Command-line arguments for sigmon-alerts
#[derive(Parser, Debug)]
#[command(name = "sigmon-alerts")]
#[command(about = "Live signal-quality alert feed for the monitoring service")]
#[command(version)]
struct Args {
    /// Path to TOML config file (falls back to $SIGMON_CONFIG, then the default locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Monitoring service base URL (overrides config)
    #[arg(long, env = "SIGMON_API_BASE_URL")]
    api_base_url: Option<String>,

    /// Address for the read API (overrides config)
    #[arg(short, long, env = "SIGMON_BIND_ADDR")]
    bind_addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ConfigResolver::default()
        .load(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(url) = args.api_base_url {
        config.api_base_url = url;
    }
    if let Some(addr) = args.bind_addr {
        config.bind_addr = addr;
    }
    config.validate().context("Invalid configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    format!("sigmon_alerts={0},sigmon_common={0},tower_http=info", config.logging.level)
                        .into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting sigmon-alerts v{} against {}",
        env!("CARGO_PKG_VERSION"),
        config.api_base_url
    );

    let source: Arc<dyn MeasurementSource> = Arc::new(
        HttpMeasurementSource::from_config(&config).context("Failed to build HTTP client")?,
    );
    let push = Arc::new(
        SsePushChannel::from_config(&config).context("Failed to build push client")?,
    );
    info!("Push endpoint: {}", push.url());

    let event_bus = EventBus::new(config.event_bus_capacity);
    let mut feed = LiveAlertFeed::new(
        Arc::clone(&source),
        push,
        event_bus.clone(),
        FeedOptions {
            push_event: config.push_event.clone(),
            suppress_duplicates: config.suppress_duplicates,
        },
    );

    // Subscribe before start so FeedStarted and early catch-up events are seen
    let badge_task = tokio::spawn(log_badge_updates(event_bus.subscribe()));
    feed.start();

    let state = AppState::new(feed.view(), source, event_bus, config.insight_window);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!("sigmon-alerts listening on http://{}", config.bind_addr);
    info!("Health check: http://{}/health", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    feed.stop();
    badge_task.abort();
    info!(
        "Shutdown complete, {} notifications this session",
        feed.notification_count()
    );
    Ok(())
}

/// Log the notification badge as it changes
async fn log_badge_updates(mut rx: broadcast::Receiver<MonitorEvent>) {
    loop {
        match rx.recv().await {
            Ok(MonitorEvent::NotificationRaised { total, .. }) => {
                info!("Notification badge: {}", total);
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!("Badge logger lagged, skipped {} events", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
