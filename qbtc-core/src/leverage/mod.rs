// qbtc-core/src/leverage/mod.rs
// Leverage / risk sizing driven by the global entropy signal

pub mod tiers;

pub use tiers::{TierProfile, TierRegistry, DEFAULT_TIER};

use qbtc_common::{EntropySnapshot, LeverageDecision, NoTradeSignal, SizingOutcome};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct LeverageConfig {
    /// Hard leverage ceiling for any decision
    pub max_leverage: f64,
    pub base_risk_per_trade: f64,
    /// Risk budget ceiling, fraction of capital
    pub max_risk_per_trade: f64,
    /// Ceiling for the entropy scale factor
    pub max_scale_factor: f64,
}

impl Default for LeverageConfig {
    fn default() -> Self {
        Self {
            max_leverage: 20.0,
            base_risk_per_trade: 0.01,
            max_risk_per_trade: 0.05,
            max_scale_factor: 2.0,
        }
    }
}

pub struct LeverageEngine {
    config: LeverageConfig,
    registry: TierRegistry,
}

impl LeverageEngine {
    pub fn new(config: LeverageConfig, registry: TierRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &LeverageConfig {
        &self.config
    }

    pub fn registry(&self) -> &TierRegistry {
        &self.registry
    }

    /// Sizes a symbol with its registered tier and that tier's base leverage.
    pub fn size(&self, symbol: &str, snapshot: &EntropySnapshot) -> SizingOutcome {
        let (tier_name, profile) = self.registry.resolve(symbol);
        debug!("Sizing {} with tier '{}'", symbol, tier_name);
        self.size_for_symbol(symbol, snapshot, profile.base_leverage, profile)
    }

    /// Pure sizing decision. Coherence below the tier gate yields `NoTrade`.
    pub fn size_for_symbol(
        &self,
        symbol: &str,
        snapshot: &EntropySnapshot,
        base_leverage: f64,
        tier: &TierProfile,
    ) -> SizingOutcome {
        if snapshot.coherence.is_nan() || snapshot.coherence < tier.min_coherence {
            debug!(
                "NO-TRADE {}: coherence {:.3} below gate {:.3}",
                symbol, snapshot.coherence, tier.min_coherence
            );
            return SizingOutcome::NoTrade(NoTradeSignal {
                symbol: symbol.to_string(),
                coherence: snapshot.coherence,
                min_coherence: tier.min_coherence,
            });
        }

        let max_leverage = self.config.max_leverage.max(1.0);
        let base = if base_leverage.is_finite() {
            base_leverage
        } else {
            1.0
        };
        let factor = self.entropy_scale_factor(snapshot.global_entropy, tier);
        let adjusted_leverage = (base * factor).clamp(1.0, max_leverage);

        let risk_budget = (self.config.base_risk_per_trade * tier.risk_multiplier)
            .clamp(0.0, self.config.max_risk_per_trade.max(0.0));

        SizingOutcome::Trade(LeverageDecision {
            symbol: symbol.to_string(),
            base_leverage: base,
            adjusted_leverage,
            risk_budget,
        })
    }

    /// Grows from 1.0 toward the tier multiplier as entropy approaches the
    /// tier's sensitivity, never above `max_scale_factor`.
    pub fn entropy_scale_factor(&self, global_entropy: f64, tier: &TierProfile) -> f64 {
        let ratio = if tier.entropy_sensitivity > 0.0 && global_entropy.is_finite() {
            (global_entropy / tier.entropy_sensitivity).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let factor = 1.0 + (tier.leverage_multiplier - 1.0) * ratio;
        if factor.is_finite() {
            factor.clamp(0.0, self.config.max_scale_factor.max(1.0))
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(coherence: f64, entropy: f64) -> EntropySnapshot {
        EntropySnapshot {
            coherence,
            quantum_randomness: 0.5,
            global_entropy: entropy,
            timestamp: 0,
        }
    }

    fn engine() -> LeverageEngine {
        LeverageEngine::new(LeverageConfig::default(), TierRegistry::builtin())
    }

    fn gated_tier() -> TierProfile {
        TierProfile {
            base_leverage: 5.0,
            leverage_multiplier: 1.2,
            risk_multiplier: 1.5,
            min_coherence: 0.7,
            entropy_sensitivity: 0.6,
        }
    }

    #[test]
    fn test_low_coherence_is_no_trade() {
        let outcome = engine().size_for_symbol("ADAUSDT", &snapshot(0.4, 0.5), 5.0, &gated_tier());
        match outcome {
            SizingOutcome::NoTrade(signal) => {
                assert_eq!(signal.coherence, 0.4);
                assert_eq!(signal.min_coherence, 0.7);
            }
            other => panic!("expected no-trade, got {:?}", other),
        }
    }

    #[test]
    fn test_entropy_scales_leverage_up_to_sensitivity() {
        let e = engine();
        let tier = gated_tier();
        let half = e.size_for_symbol("ADAUSDT", &snapshot(0.8, 0.3), 5.0, &tier);
        let full = e.size_for_symbol("ADAUSDT", &snapshot(0.8, 0.6), 5.0, &tier);
        let beyond = e.size_for_symbol("ADAUSDT", &snapshot(0.8, 0.9), 5.0, &tier);

        let lev = |o: &SizingOutcome| o.decision().unwrap().adjusted_leverage;
        assert!((lev(&half) - 5.5).abs() < 1e-9);
        assert!((lev(&full) - 6.0).abs() < 1e-9);
        assert_eq!(lev(&beyond), lev(&full));
    }

    #[test]
    fn test_leverage_ceiling_at_extreme_entropy() {
        let outcome = engine().size("BTCUSDT", &snapshot(0.95, 0.9));
        let decision = outcome.decision().unwrap();
        // 20 * 1.5 would be 30x
        assert_eq!(decision.adjusted_leverage, 20.0);
    }

    #[test]
    fn test_risk_budget_is_capped() {
        let mut tier = gated_tier();
        tier.risk_multiplier = 50.0;
        let outcome = engine().size_for_symbol("ADAUSDT", &snapshot(0.9, 0.5), 5.0, &tier);
        assert_eq!(outcome.decision().unwrap().risk_budget, 0.05);

        let outcome = engine().size("BTCUSDT", &snapshot(0.9, 0.5));
        assert!((outcome.decision().unwrap().risk_budget - 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_symbol_uses_conservative_profile() {
        let outcome = engine().size("NEWCOINUSDT", &snapshot(0.9, 0.9));
        let decision = outcome.decision().unwrap();
        assert_eq!(decision.base_leverage, 1.0);
        assert_eq!(decision.adjusted_leverage, 1.0);
        assert!((decision.risk_budget - 0.005).abs() < 1e-12);

        // default gate is stricter
        assert!(!engine().size("NEWCOINUSDT", &snapshot(0.8, 0.5)).is_trade());
    }

    #[test]
    fn test_leverage_floor_is_one() {
        let outcome = engine().size_for_symbol("ADAUSDT", &snapshot(0.9, 0.1), 0.2, &gated_tier());
        assert_eq!(outcome.decision().unwrap().adjusted_leverage, 1.0);
    }

    #[test]
    fn test_nan_coherence_does_not_trade() {
        assert!(!engine().size("BTCUSDT", &snapshot(f64::NAN, 0.5)).is_trade());
    }
}
