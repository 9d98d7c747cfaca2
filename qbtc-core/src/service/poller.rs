// service/poller.rs
// Fixed-interval driver for BigBangEngine::detect_big_bang_event

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::bigbang::BigBangEngine;

pub struct PollingService {
    engine: Arc<BigBangEngine>,
    period: Duration,
}

impl PollingService {
    pub fn new(engine: Arc<BigBangEngine>, period: Duration) -> Self {
        Self {
            engine,
            period: period.max(Duration::from_millis(1)),
        }
    }

    /// Polls until the shutdown channel fires or closes. Returns the number
    /// of activations observed.
    pub async fn start(&self, mut shutdown_rx: broadcast::Receiver<()>) -> u64 {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut activations = 0;

        info!("Big Bang polling every {:?}", self.period);
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    debug!("Polling stopped after {} activations", activations);
                    return activations;
                }
                _ = ticker.tick() => {
                    if self.engine.detect_big_bang_event().await.is_some() {
                        activations += 1;
                    }
                }
            }
        }
    }
}
