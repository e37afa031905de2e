use std::net::SocketAddr;

use anyhow::Context;
use seatkeep_api::{app, scheduler, AppState};
use seatkeep_store::app_config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "seatkeep_api=debug,seatkeep_core=debug,seatkeep_store=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Seatkeep API on port {}", config.server.port);

    let store = seatkeep_store::connect(&config.store)
        .await
        .context("Failed to set up document store")?;

    let state = AppState::new(store, config.reconciler.settle_delay());

    if config.archiver.enabled {
        let schedule =
            scheduler::DailySchedule::parse(&config.archiver.timezone, &config.archiver.run_at)
                .context("Invalid archiver schedule")?;
        scheduler::spawn_archive_schedule(state.archiver.clone(), schedule);
    } else {
        tracing::info!("Scheduled booking archive disabled");
    }

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
