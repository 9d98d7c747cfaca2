// qbtc-core/src/bigbang/machine.rs
// Big Bang engine: threshold-triggered amplification with timed deactivation

use qbtc_common::{
    ActivationTrigger, AmplificationBoost, BigBangEvent, BigBangState, BigBangStats, Clock,
    EntropySnapshot, SignalSource,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use super::amplifier::{Amplifier, FailedAmplification};
use super::history::EventHistory;
use super::BigBangConfig;
use crate::archive::EventArchive;
use crate::execution::{ExecutionSink, PositionProvider};

/// Outcome of one INACTIVE/ACTIVE -> ACTIVE transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BigBangActivation {
    pub event: BigBangEvent,
    /// Positions amplified by this pass
    pub amplified_positions: usize,
    pub failed_positions: Vec<FailedAmplification>,
    /// A running activation was replaced
    pub superseded: bool,
    pub deactivates_at: i64,
}

/// State record, history and the pending deactivation timer. Guarded by one
/// mutex so every transition has a single writer.
struct MachineCore {
    state: BigBangState,
    history: EventHistory,
    timer: Option<JoinHandle<()>>,
    /// Symbols already amplified in the running window
    amplified: HashSet<String>,
    /// Bumped on every transition; a timer only fires for its own generation
    generation: u64,
}

impl MachineCore {
    fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
        self.generation = self.generation.wrapping_add(1);
    }
}

pub struct BigBangEngine {
    config: BigBangConfig,
    signals: Arc<dyn SignalSource>,
    clock: Arc<dyn Clock>,
    positions: Arc<dyn PositionProvider>,
    amplifier: Amplifier,
    archive: Option<Arc<EventArchive>>,
    core: Arc<Mutex<MachineCore>>,
}

impl BigBangEngine {
    pub fn new(
        config: BigBangConfig,
        signals: Arc<dyn SignalSource>,
        clock: Arc<dyn Clock>,
        positions: Arc<dyn PositionProvider>,
        sink: Arc<dyn ExecutionSink>,
    ) -> Self {
        let amplifier = Amplifier::new(sink, &config);
        let core = MachineCore {
            state: BigBangState::idle(config.duration.min_ms),
            history: EventHistory::new(config.history_capacity),
            timer: None,
            amplified: HashSet::new(),
            generation: 0,
        };

        Self {
            config,
            signals,
            clock,
            positions,
            amplifier,
            archive: None,
            core: Arc::new(Mutex::new(core)),
        }
    }

    /// Every activation is also appended to the archive.
    pub fn with_archive(mut self, archive: Arc<EventArchive>) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn config(&self) -> &BigBangConfig {
        &self.config
    }

    /// Samples the current snapshot and activates when both thresholds hold.
    pub async fn detect_big_bang_event(&self) -> Option<BigBangActivation> {
        let snapshot = self.signals.snapshot(self.clock.now_ms());
        self.evaluate(snapshot).await
    }

    /// Threshold gate over an explicit snapshot.
    pub async fn evaluate(&self, snapshot: EntropySnapshot) -> Option<BigBangActivation> {
        if !self.config.thresholds_met(&snapshot) {
            debug!(
                "No Big Bang: coherence {:.4} / quantum {:.4}",
                snapshot.coherence, snapshot.quantum_randomness
            );
            return None;
        }
        Some(self.activate(snapshot, ActivationTrigger::Threshold).await)
    }

    /// Forced activation. The override replaces the sampled coherence and the
    /// threshold gate is skipped.
    pub async fn activate_manual(&self, coherence_override: Option<f64>) -> BigBangActivation {
        let mut snapshot = self.signals.snapshot(self.clock.now_ms());
        if let Some(level) = coherence_override.filter(|l| l.is_finite()) {
            snapshot.coherence = level.clamp(0.0, 1.0);
        }
        self.activate(snapshot, ActivationTrigger::Manual).await
    }

    /// Explicit ACTIVE -> INACTIVE. Cancels the pending timer; returns whether
    /// the machine was active.
    pub async fn deactivate(&self) -> bool {
        let mut core = self.core.lock().await;
        core.cancel_timer();
        let was_active = core.state.is_active;
        core.state.is_active = false;
        if was_active {
            info!("BIG BANG deactivated manually");
        }
        was_active
    }

    pub async fn get_big_bang_state(&self) -> BigBangState {
        self.core.lock().await.state.clone()
    }

    pub async fn get_big_bang_history(&self) -> Vec<BigBangEvent> {
        self.core.lock().await.history.events()
    }

    pub async fn get_big_bang_stats(&self) -> BigBangStats {
        self.core.lock().await.history.stats()
    }

    pub async fn is_active(&self) -> bool {
        self.core.lock().await.state.is_active
    }

    /// Multipliers for new sizing decisions while a Big Bang runs.
    pub async fn active_boost(&self) -> Option<AmplificationBoost> {
        if self.is_active().await {
            Some(self.config.boost())
        } else {
            None
        }
    }

    async fn activate(&self, snapshot: EntropySnapshot, trigger: ActivationTrigger) -> BigBangActivation {
        let mut core = self.core.lock().await;

        let superseded = core.state.is_active;
        if superseded {
            warn!(
                "BIG BANG superseded: previous activation from {:?} replaced",
                core.state.start_time
            );
        }
        core.cancel_timer();
        if !superseded {
            core.amplified.clear();
        }

        let duration_ms = self
            .config
            .duration
            .compute(snapshot.coherence, snapshot.quantum_randomness);
        let started_at = snapshot.timestamp;
        let deadline = Instant::now() + Duration::from_millis(duration_ms);

        core.state = BigBangState {
            is_active: true,
            start_time: Some(started_at),
            duration_ms,
            coherence_peak: snapshot.coherence,
            quantum_peak: snapshot.quantum_randomness,
            amplified_positions: 0,
            total_profit: 0.0,
        };

        let mut positions = match self.positions.get_active_positions().await {
            Ok(p) => p,
            Err(e) => {
                warn!("Position provider failed, nothing amplified: {}", e);
                Vec::new()
            }
        };
        // A renewed window only amplifies positions it has not touched yet
        let before = positions.len();
        positions.retain(|p| !core.amplified.contains(&p.symbol));
        if positions.len() < before {
            debug!(
                "{} positions already amplified in this window, skipped",
                before - positions.len()
            );
        }

        let report = self.amplifier.run(&positions).await;
        core.amplified.extend(report.amplified.iter().map(|o| o.symbol.clone()));
        core.state.amplified_positions = core.amplified.len();

        let generation = core.generation;
        core.timer = Some(spawn_deactivation(
            Arc::downgrade(&self.core),
            deadline,
            generation,
        ));

        let event = BigBangEvent {
            timestamp: started_at,
            coherence: snapshot.coherence,
            quantum: snapshot.quantum_randomness,
            entropy: snapshot.global_entropy,
            duration_ms,
            leverage_multiplier: self.config.leverage_multiplier,
            risk_multiplier: self.config.risk_multiplier,
            trigger,
            superseded,
        };
        core.history.push(event.clone());
        drop(core);

        info!(
            "BIG BANG ({:?}) | coherence {:.4} | quantum {:.4} | {:.2} min | {} amplified, {} failed",
            trigger,
            snapshot.coherence,
            snapshot.quantum_randomness,
            duration_ms as f64 / 60_000.0,
            report.amplified.len(),
            report.failed.len()
        );

        if let Some(archive) = &self.archive {
            if let Err(e) = archive.append(&event).await {
                warn!("Failed to archive Big Bang event: {}", e);
            }
        }

        BigBangActivation {
            event,
            amplified_positions: report.amplified.len(),
            failed_positions: report.failed,
            superseded,
            deactivates_at: started_at + duration_ms as i64,
        }
    }
}

impl Drop for BigBangEngine {
    fn drop(&mut self) {
        if let Ok(mut core) = self.core.try_lock() {
            core.cancel_timer();
        }
    }
}

fn spawn_deactivation(core: Weak<Mutex<MachineCore>>, deadline: Instant, generation: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        sleep_until(deadline).await;
        let Some(core) = core.upgrade() else {
            return;
        };
        let mut core = core.lock().await;
        if core.generation != generation || !core.state.is_active {
            return;
        }
        core.state.is_active = false;
        core.timer = None;
        info!(
            "BIG BANG window elapsed after {:.2} min, amplification off",
            core.state.duration_ms as f64 / 60_000.0
        );
    })
}
