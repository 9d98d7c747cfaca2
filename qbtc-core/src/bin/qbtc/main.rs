// qbtc-core/src/bin/qbtc/main.rs
// QBTC daemon: polls the entropy oracle, drives the Big Bang engine and
// serves the control API.

use anyhow::Context;
use dotenvy::dotenv;
use qbtc_common::{Clock, EntropyOracle, SignalSource, SineHashSource, SystemClock};
use qbtc_core::archive::EventArchive;
use qbtc_core::bigbang::BigBangEngine;
use qbtc_core::config::{ExecutionMode, Settings};
use qbtc_core::execution::{ExecutionSink, HttpExecutionSink, PaperPositionBook, PositionProvider};
use qbtc_core::leverage::LeverageEngine;
use qbtc_core::server::{self, ControlState};
use qbtc_core::service::{PollingService, ServiceError};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::new().map_err(ServiceError::from)?;
    info!(
        "QBTC starting | gate coherence>{} quantum>{} | execution {:?}",
        settings.bigbang.coherence_threshold,
        settings.bigbang.quantum_threshold,
        settings.execution.mode
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let signals: Arc<dyn SignalSource> = Arc::new(EntropyOracle::<SineHashSource>::default());

    let book = Arc::new(PaperPositionBook::from_positions(settings.positions.clone()));
    info!("Position book seeded with {} positions", book.len());
    let positions: Arc<dyn PositionProvider> = book.clone();
    let sink: Arc<dyn ExecutionSink> = match settings.execution.mode {
        ExecutionMode::Paper => book.clone() as Arc<dyn ExecutionSink>,
        ExecutionMode::Http => {
            info!("Routing amplifications to {}", settings.execution.endpoint);
            let sink = HttpExecutionSink::new(
                &settings.execution.endpoint,
                settings.execution_timeout(),
            )
            .map_err(ServiceError::from)?;
            Arc::new(sink)
        }
    };

    let mut engine = BigBangEngine::new(
        settings.bigbang_config(),
        signals.clone(),
        clock.clone(),
        positions,
        sink,
    );
    if settings.archive.enabled {
        let archive = EventArchive::connect(&settings.archive.url)
            .await
            .map_err(ServiceError::from)
            .with_context(|| format!("opening event archive {}", settings.archive.url))?;
        engine = engine.with_archive(Arc::new(archive));
    }
    let engine = Arc::new(engine);
    let leverage = Arc::new(LeverageEngine::new(
        settings.leverage_config(),
        settings.tier_registry(),
    ));

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let poller = PollingService::new(engine.clone(), settings.poll_interval());
    let poller_shutdown = shutdown_tx.subscribe();
    let poller_task = tokio::spawn(async move { poller.start(poller_shutdown).await });

    let server_task = if settings.server.enabled {
        let listener = TcpListener::bind(&settings.server.bind)
            .await
            .with_context(|| format!("binding control server to {}", settings.server.bind))?;
        let state = Arc::new(ControlState {
            bigbang: engine.clone(),
            leverage,
            signals,
            clock,
        });
        let mut server_shutdown = shutdown_tx.subscribe();
        Some(tokio::spawn(server::serve(listener, state, async move {
            let _ = server_shutdown.recv().await;
        })))
    } else {
        warn!("Control server disabled");
        None
    };

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    info!("Shutdown signal received");
    let _ = shutdown_tx.send(());

    match poller_task.await {
        Ok(activations) => info!("Poller stopped after {} activations", activations),
        Err(e) => error!("Poller task failed: {}", e),
    }
    if let Some(task) = server_task {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Control server error: {}", e),
            Err(e) => error!("Control server task failed: {}", e),
        }
    }

    let stats = engine.get_big_bang_stats().await;
    info!(
        "Final stats: {} events | avg {:.2} min | avg coherence {:.2}%",
        stats.total_events, stats.avg_duration_minutes, stats.avg_coherence_percent
    );
    Ok(())
}
