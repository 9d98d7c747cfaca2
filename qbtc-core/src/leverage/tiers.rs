// qbtc-core/src/leverage/tiers.rs
// Symbol classification buckets and their sizing profiles

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_TIER: &str = "default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierProfile {
    /// Tier default leverage before entropy scaling
    pub base_leverage: f64,
    /// Scale factor reached once entropy hits the sensitivity level
    pub leverage_multiplier: f64,
    pub risk_multiplier: f64,
    /// Coherence gate; below it the tier does not trade
    pub min_coherence: f64,
    /// Entropy level at which the full multiplier applies
    pub entropy_sensitivity: f64,
}

impl TierProfile {
    const fn new(
        base_leverage: f64,
        leverage_multiplier: f64,
        risk_multiplier: f64,
        min_coherence: f64,
        entropy_sensitivity: f64,
    ) -> Self {
        Self {
            base_leverage,
            leverage_multiplier,
            risk_multiplier,
            min_coherence,
            entropy_sensitivity,
        }
    }

    /// Conservative fallback for unknown symbols
    pub const fn conservative() -> Self {
        Self::new(1.0, 1.0, 0.5, 0.85, 0.5)
    }
}

pub struct TierRegistry {
    tiers: HashMap<String, TierProfile>,
    symbols: HashMap<String, String>,
    fallback: TierProfile,
}

impl TierRegistry {
    pub fn builtin() -> Self {
        let tiers: HashMap<String, TierProfile> = [
            ("major", TierProfile::new(20.0, 1.5, 3.0, 0.60, 0.70)),
            ("large_cap", TierProfile::new(10.0, 1.3, 2.0, 0.65, 0.65)),
            ("mid_cap", TierProfile::new(5.0, 1.2, 1.5, 0.70, 0.60)),
            ("speculative", TierProfile::new(3.0, 1.1, 1.0, 0.80, 0.50)),
            (DEFAULT_TIER, TierProfile::conservative()),
        ]
        .into_iter()
        .map(|(name, p)| (name.to_string(), p))
        .collect();

        let symbols: HashMap<String, String> = [
            ("BTCUSDT", "major"),
            ("ETHUSDT", "major"),
            ("BNBUSDT", "large_cap"),
            ("SOLUSDT", "large_cap"),
            ("XRPUSDT", "large_cap"),
            ("ADAUSDT", "mid_cap"),
            ("DOTUSDT", "mid_cap"),
            ("LINKUSDT", "mid_cap"),
            ("AVAXUSDT", "mid_cap"),
            ("MATICUSDT", "mid_cap"),
            ("DOGEUSDT", "speculative"),
            ("SHIBUSDT", "speculative"),
            ("PEPEUSDT", "speculative"),
        ]
        .into_iter()
        .map(|(s, t)| (s.to_string(), t.to_string()))
        .collect();

        Self {
            tiers,
            symbols,
            fallback: TierProfile::conservative(),
        }
    }

    /// Built-in tiers with configured profiles and symbol mappings layered on top.
    pub fn with_overrides(
        tiers: HashMap<String, TierProfile>,
        symbols: HashMap<String, String>,
    ) -> Self {
        let mut registry = Self::builtin();
        for (name, profile) in tiers {
            registry.tiers.insert(name.to_lowercase(), profile);
        }
        for (symbol, tier) in symbols {
            registry
                .symbols
                .insert(symbol.to_uppercase(), tier.to_lowercase());
        }
        if let Some(default) = registry.tiers.get(DEFAULT_TIER) {
            registry.fallback = default.clone();
        }
        registry
    }

    /// Tier name and profile for a symbol. Unknown symbols and symbols mapped
    /// to a missing tier resolve to the default profile.
    pub fn resolve(&self, symbol: &str) -> (&str, &TierProfile) {
        self.symbols
            .get(&symbol.to_uppercase())
            .and_then(|name| self.tiers.get_key_value(name))
            .map(|(name, profile)| (name.as_str(), profile))
            .unwrap_or((DEFAULT_TIER, &self.fallback))
    }

    pub fn tier(&self, name: &str) -> Option<&TierProfile> {
        self.tiers.get(&name.to_lowercase())
    }
}

impl Default for TierRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
