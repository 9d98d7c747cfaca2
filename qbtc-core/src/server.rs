//! # Control Server
//!
//! Thin JSON request/response layer over the Big Bang engine and the
//! leverage engine.
//!
//! - `GET  /health`     liveness
//! - `GET  /status`     current state and live boost
//! - `GET  /history`    activation events, oldest first
//! - `GET  /stats`      lifetime statistics
//! - `POST /activate`   forced activation, optional coherence override
//! - `POST /deactivate` explicit deactivation
//! - `POST /size`       sizing decision for a symbol at the current snapshot

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use qbtc_common::{
    AmplificationBoost, BigBangEvent, BigBangState, BigBangStats, Clock, SignalSource,
    SizingOutcome,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::bigbang::{BigBangActivation, BigBangEngine};
use crate::leverage::LeverageEngine;
use crate::service::ServiceError;

/// Shared state for all handlers.
pub struct ControlState {
    pub bigbang: Arc<BigBangEngine>,
    pub leverage: Arc<LeverageEngine>,
    pub signals: Arc<dyn SignalSource>,
    pub clock: Arc<dyn Clock>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub state: BigBangState,
    pub active_boost: Option<AmplificationBoost>,
    pub server_time: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActivateRequest {
    pub consciousness_level: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeactivateResponse {
    pub was_active: bool,
    pub state: BigBangState,
}

#[derive(Debug, Deserialize)]
pub struct SizeRequest {
    pub symbol: String,
}

pub fn router(state: Arc<ControlState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/history", get(history_handler))
        .route("/stats", get(stats_handler))
        .route("/activate", post(activate_handler))
        .route("/deactivate", post(deactivate_handler))
        .route("/size", post(size_handler))
        .with_state(state)
}

/// Serves the control API until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: Arc<ControlState>, shutdown: F) -> Result<(), ServiceError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!("Control server listening on http://{}", addr);
    info!("  Status:     GET  http://{}/status", addr);
    info!("  Activate:   POST http://{}/activate", addr);
    info!("  Deactivate: POST http://{}/deactivate", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServiceError::Server(e.to_string()))
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "qbtc-core",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn status_handler(State(state): State<Arc<ControlState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        state: state.bigbang.get_big_bang_state().await,
        active_boost: state.bigbang.active_boost().await,
        server_time: state.clock.now_ms(),
    })
}

async fn history_handler(State(state): State<Arc<ControlState>>) -> Json<Vec<BigBangEvent>> {
    Json(state.bigbang.get_big_bang_history().await)
}

async fn stats_handler(State(state): State<Arc<ControlState>>) -> Json<BigBangStats> {
    Json(state.bigbang.get_big_bang_stats().await)
}

async fn activate_handler(
    State(state): State<Arc<ControlState>>,
    body: Bytes,
) -> Response {
    // Only an empty body means "no override"; anything else must parse
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ActivateRequest::default()
    } else {
        match serde_json::from_slice::<ActivateRequest>(&body) {
            Ok(r) => r,
            Err(e) => return bad_request(&format!("invalid activate body: {}", e)),
        }
    };

    if let Some(level) = request.consciousness_level {
        if !(0.0..=1.0).contains(&level) {
            return bad_request("consciousness_level must lie in [0, 1]");
        }
    }

    info!("Manual activation requested (override: {:?})", request.consciousness_level);
    let activation: BigBangActivation = state
        .bigbang
        .activate_manual(request.consciousness_level)
        .await;
    Json(activation).into_response()
}

async fn deactivate_handler(State(state): State<Arc<ControlState>>) -> Json<DeactivateResponse> {
    let was_active = state.bigbang.deactivate().await;
    Json(DeactivateResponse {
        was_active,
        state: state.bigbang.get_big_bang_state().await,
    })
}

async fn size_handler(
    State(state): State<Arc<ControlState>>,
    Json(request): Json<SizeRequest>,
) -> Response {
    if request.symbol.trim().is_empty() {
        return bad_request("symbol must not be empty");
    }

    let snapshot = state.signals.snapshot(state.clock.now_ms());
    let mut outcome = state.leverage.size(request.symbol.trim(), &snapshot);

    if let (SizingOutcome::Trade(decision), Some(boost)) =
        (&outcome, state.bigbang.active_boost().await)
    {
        let caps = state.leverage.config();
        outcome = SizingOutcome::Trade(decision.boosted(
            boost,
            caps.max_leverage,
            caps.max_risk_per_trade,
        ));
    }
    Json(outcome).into_response()
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}
