// qbtc-common/src/types.rs
// QBTC - Domain model shared by the sizing engine and the Big Bang machine

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One draw from a deterministic pseudo-random source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PseudoRandomSample {
    pub index: u64,
    pub modifier: u64,
    pub value: f64,
}

/// Market-wide signal reading for one evaluation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntropySnapshot {
    pub coherence: f64,
    pub quantum_randomness: f64,
    pub global_entropy: f64,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// Open position as reported by the position-tracking side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub leverage: f64,
    pub size: Decimal,
}

impl Position {
    pub fn new(symbol: impl Into<String>, leverage: f64, size: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            leverage,
            size,
        }
    }
}

/// Temporary multipliers handed out while a Big Bang is running.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmplificationBoost {
    pub leverage_multiplier: f64,
    pub risk_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeverageDecision {
    pub symbol: String,
    pub base_leverage: f64,
    /// Always within [1, max_leverage]
    pub adjusted_leverage: f64,
    /// Fraction of capital put at risk on this trade
    pub risk_budget: f64,
}

impl LeverageDecision {
    /// Applies a Big Bang boost while keeping both ceilings intact.
    pub fn boosted(&self, boost: AmplificationBoost, max_leverage: f64, max_risk: f64) -> Self {
        Self {
            symbol: self.symbol.clone(),
            base_leverage: self.base_leverage,
            adjusted_leverage: (self.adjusted_leverage * boost.leverage_multiplier)
                .clamp(1.0, max_leverage.max(1.0)),
            risk_budget: (self.risk_budget * boost.risk_multiplier).clamp(0.0, max_risk.max(0.0)),
        }
    }
}

/// Risk-off outcome: coherence below the tier gate, caller holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoTradeSignal {
    pub symbol: String,
    pub coherence: f64,
    pub min_coherence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SizingOutcome {
    Trade(LeverageDecision),
    NoTrade(NoTradeSignal),
}

impl SizingOutcome {
    pub fn is_trade(&self) -> bool {
        matches!(self, SizingOutcome::Trade(_))
    }

    pub fn decision(&self) -> Option<&LeverageDecision> {
        match self {
            SizingOutcome::Trade(d) => Some(d),
            SizingOutcome::NoTrade(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationTrigger {
    /// Both thresholds crossed on a poll
    Threshold,
    /// Forced through the control surface
    Manual,
}

/// Current activation record of a Big Bang engine.
///
/// Only `is_active` flips on deactivation; the remaining fields describe the
/// most recent activation until the next one overwrites them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BigBangState {
    pub is_active: bool,
    pub start_time: Option<i64>,
    pub duration_ms: u64,
    pub coherence_peak: f64,
    pub quantum_peak: f64,
    pub amplified_positions: usize,
    /// No fill data reaches the machine, so this stays at zero.
    pub total_profit: f64,
}

impl BigBangState {
    pub fn idle(duration_ms: u64) -> Self {
        Self {
            is_active: false,
            start_time: None,
            duration_ms,
            coherence_peak: 0.0,
            quantum_peak: 0.0,
            amplified_positions: 0,
            total_profit: 0.0,
        }
    }

    /// End of the running window, if any.
    pub fn ends_at(&self) -> Option<i64> {
        if !self.is_active {
            return None;
        }
        self.start_time.map(|t| t + self.duration_ms as i64)
    }
}

/// Immutable record appended on every activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BigBangEvent {
    pub timestamp: i64,
    pub coherence: f64,
    pub quantum: f64,
    pub entropy: f64,
    pub duration_ms: u64,
    pub leverage_multiplier: f64,
    pub risk_multiplier: f64,
    pub trigger: ActivationTrigger,
    /// Replaced an activation that was still running
    #[serde(default)]
    pub superseded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BigBangStats {
    pub total_events: u64,
    pub avg_duration_minutes: f64,
    pub avg_coherence_percent: f64,
    pub last_event_timestamp: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision() -> LeverageDecision {
        LeverageDecision {
            symbol: "BTCUSDT".to_string(),
            base_leverage: 10.0,
            adjusted_leverage: 16.0,
            risk_budget: 0.03,
        }
    }

    #[test]
    fn test_boost_respects_ceilings() {
        let boost = AmplificationBoost {
            leverage_multiplier: 1.5,
            risk_multiplier: 2.0,
        };
        let boosted = decision().boosted(boost, 20.0, 0.05);
        assert_eq!(boosted.adjusted_leverage, 20.0);
        assert_eq!(boosted.risk_budget, 0.05);
        assert_eq!(boosted.base_leverage, 10.0);
    }

    #[test]
    fn test_sizing_outcome_is_tagged() {
        let outcome = SizingOutcome::NoTrade(NoTradeSignal {
            symbol: "DOGEUSDT".to_string(),
            coherence: 0.4,
            min_coherence: 0.7,
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "no_trade");
        assert!(!outcome.is_trade());
        assert!(outcome.decision().is_none());
    }

    #[test]
    fn test_ends_at_only_while_active() {
        let mut state = BigBangState::idle(300_000);
        state.start_time = Some(1_000);
        assert_eq!(state.ends_at(), None);
        state.is_active = true;
        assert_eq!(state.ends_at(), Some(301_000));
    }
}
