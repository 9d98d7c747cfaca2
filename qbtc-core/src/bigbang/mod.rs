// qbtc-core/src/bigbang/mod.rs
// Big Bang event state machine: INACTIVE <-> ACTIVE

pub mod amplifier;
pub mod history;
pub mod machine;

pub use amplifier::{AmplificationOrder, AmplificationReport, Amplifier, FailedAmplification};
pub use history::EventHistory;
pub use machine::{BigBangActivation, BigBangEngine};

use qbtc_common::{AmplificationBoost, DurationWindow, EntropySnapshot};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct BigBangConfig {
    pub coherence_threshold: f64,
    pub quantum_threshold: f64,
    pub leverage_multiplier: f64,
    pub risk_multiplier: f64,
    /// Leverage ceiling for amplified positions
    pub max_leverage: f64,
    pub duration: DurationWindow,
    /// Ring buffer size for the event history
    pub history_capacity: usize,
    /// Per-request deadline for the execution sink
    pub execution_timeout: Duration,
    /// Extra attempts after a failed amplification
    pub execution_retries: u32,
}

impl Default for BigBangConfig {
    fn default() -> Self {
        Self {
            coherence_threshold: 0.92,
            quantum_threshold: 0.97,
            leverage_multiplier: 1.5,
            risk_multiplier: 2.0,
            max_leverage: 20.0,
            duration: DurationWindow::default(),
            history_capacity: 1000,
            execution_timeout: Duration::from_secs(5),
            execution_retries: 1,
        }
    }
}

impl BigBangConfig {
    /// Both conditions, strictly above their thresholds.
    pub fn thresholds_met(&self, snapshot: &EntropySnapshot) -> bool {
        snapshot.coherence > self.coherence_threshold
            && snapshot.quantum_randomness > self.quantum_threshold
    }

    pub fn boost(&self) -> AmplificationBoost {
        AmplificationBoost {
            leverage_multiplier: self.leverage_multiplier,
            risk_multiplier: self.risk_multiplier,
        }
    }
}
