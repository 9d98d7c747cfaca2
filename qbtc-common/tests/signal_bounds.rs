//! Property tests for the signal primitive and the duration window.

use proptest::prelude::*;
use qbtc_common::{compute_duration, EntropyOracle, RandomSource, SignalSource, SineHashSource};

struct Constant(f64);

impl RandomSource for Constant {
    fn sample(&self, _index: u64, _modifier: u64) -> f64 {
        self.0
    }
}

proptest! {
    #[test]
    fn signals_stay_in_bounds(t in any::<i64>()) {
        let oracle = EntropyOracle::<SineHashSource>::default();
        let coherence = oracle.compute_coherence(t);
        let entropy = oracle.compute_global_entropy(t);
        let quantum = oracle.compute_quantum_randomness(t);

        prop_assert!((0.1..=0.99).contains(&coherence));
        prop_assert!((0.1..=0.9).contains(&entropy));
        prop_assert!((0.0..1.0).contains(&quantum));
    }

    #[test]
    fn misbehaving_sources_cannot_escape_bounds(t in any::<i64>(), raw in -10.0f64..10.0) {
        let snap = EntropyOracle::new(Constant(raw)).snapshot(t);
        prop_assert!((0.1..=0.99).contains(&snap.coherence));
        prop_assert!((0.1..=0.9).contains(&snap.global_entropy));
        prop_assert!((0.0..1.0).contains(&snap.quantum_randomness));
    }

    #[test]
    fn duration_stays_in_window(coherence in 0.0f64..=1.0, quantum in 0.0f64..=1.0) {
        let d = compute_duration(coherence, quantum);
        prop_assert!((300_000..=900_000).contains(&d));
    }

    #[test]
    fn same_instant_same_snapshot(t in 0i64..4_000_000_000_000) {
        let oracle = EntropyOracle::<SineHashSource>::default();
        prop_assert_eq!(oracle.snapshot(t), oracle.snapshot(t));
    }
}
