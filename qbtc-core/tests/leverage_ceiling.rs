//! Property tests: no sizing path may exceed the configured caps.

use proptest::prelude::*;
use qbtc_common::{AmplificationBoost, EntropySnapshot, SizingOutcome};
use qbtc_core::leverage::{LeverageConfig, LeverageEngine, TierProfile, TierRegistry};

const SYMBOLS: &[&str] = &["BTCUSDT", "SOLUSDT", "LINKUSDT", "PEPEUSDT", "UNKNOWNUSDT"];

fn snapshot(coherence: f64, entropy: f64) -> EntropySnapshot {
    EntropySnapshot {
        coherence,
        quantum_randomness: 0.5,
        global_entropy: entropy,
        timestamp: 0,
    }
}

proptest! {
    #[test]
    fn builtin_tiers_respect_caps(
        idx in 0usize..5,
        coherence in 0.0f64..1.0,
        entropy in 0.0f64..1.0,
    ) {
        let engine = LeverageEngine::new(LeverageConfig::default(), TierRegistry::builtin());
        match engine.size(SYMBOLS[idx], &snapshot(coherence, entropy)) {
            SizingOutcome::Trade(d) => {
                prop_assert!(d.adjusted_leverage >= 1.0 && d.adjusted_leverage <= 20.0);
                prop_assert!(d.risk_budget >= 0.0 && d.risk_budget <= 0.05);

                let boosted = d.boosted(
                    AmplificationBoost { leverage_multiplier: 1.5, risk_multiplier: 2.0 },
                    20.0,
                    0.05,
                );
                prop_assert!(boosted.adjusted_leverage <= 20.0);
                prop_assert!(boosted.risk_budget <= 0.05);
                prop_assert!(boosted.adjusted_leverage >= d.adjusted_leverage);
            }
            SizingOutcome::NoTrade(n) => prop_assert!(coherence < n.min_coherence),
        }
    }

    #[test]
    fn arbitrary_base_leverage_is_capped(
        base in -1.0e6f64..1.0e6,
        multiplier in 1.0f64..5.0,
        entropy in 0.0f64..1.0,
    ) {
        let engine = LeverageEngine::new(LeverageConfig::default(), TierRegistry::builtin());
        let tier = TierProfile {
            base_leverage: 1.0,
            leverage_multiplier: multiplier,
            risk_multiplier: 10.0,
            min_coherence: 0.0,
            entropy_sensitivity: 0.5,
        };
        let outcome = engine.size_for_symbol("XUSDT", &snapshot(0.9, entropy), base, &tier);
        let d = outcome.decision().cloned().unwrap();
        prop_assert!(d.adjusted_leverage >= 1.0 && d.adjusted_leverage <= 20.0);
        prop_assert!(d.risk_budget <= 0.05);
        prop_assert!(engine.entropy_scale_factor(entropy, &tier) <= 2.0);
    }
}
