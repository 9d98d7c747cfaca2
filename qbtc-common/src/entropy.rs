// qbtc-common/src/entropy.rs
// QBTC - Coherence / Quantum / Global-Entropy primitive
//
// Every synthetic signal is a smooth trend (daily + resonance oscillators)
// plus bounded noise drawn from one pseudo-random source.

use crate::types::{EntropySnapshot, PseudoRandomSample};
use std::f64::consts::TAU;

pub const DAY_MS: i64 = 86_400_000;
/// Secondary oscillator period (7919 s)
pub const RESONANCE_PERIOD_MS: i64 = 7_919_000;

const DAILY_AMPLITUDE: f64 = 0.1;
const RESONANCE_AMPLITUDE: f64 = 0.05;
const NOISE_AMPLITUDE: f64 = 0.1;

const COHERENCE_BASE: f64 = 0.8;
const COHERENCE_FLOOR: f64 = 0.1;
const COHERENCE_CEILING: f64 = 0.99;

const ENTROPY_BASE: f64 = 0.5;
const ENTROPY_FLOOR: f64 = 0.1;
const ENTROPY_CEILING: f64 = 0.9;

const COHERENCE_MODIFIER: u64 = 1;
const QUANTUM_MODIFIER: u64 = 2;
const INDEX_SPAN: i64 = 1000;

/// Largest f64 strictly below 1.0
const BELOW_ONE: f64 = 1.0 - f64::EPSILON / 2.0;

/// Deterministic-but-varying generator keyed by (index, modifier).
pub trait RandomSource: Send + Sync {
    /// Must return a value in [0, 1).
    fn sample(&self, index: u64, modifier: u64) -> f64;
}

/// `frac(sin(index * modifier) * 10000)`
#[derive(Debug, Clone, Copy, Default)]
pub struct SineHashSource;

impl RandomSource for SineHashSource {
    fn sample(&self, index: u64, modifier: u64) -> f64 {
        let x = (index.wrapping_mul(modifier) as f64).sin() * 10_000.0;
        let v = x - x.floor();
        // x - floor(x) rounds up to 1.0 for tiny negative x
        if v.is_finite() && v < 1.0 {
            v
        } else {
            0.0
        }
    }
}

/// Anything able to produce a snapshot for a point in time.
pub trait SignalSource: Send + Sync {
    fn snapshot(&self, now_ms: i64) -> EntropySnapshot;
}

pub struct EntropyOracle<R: RandomSource = SineHashSource> {
    source: R,
}

impl Default for EntropyOracle<SineHashSource> {
    fn default() -> Self {
        Self::new(SineHashSource)
    }
}

impl<R: RandomSource> EntropyOracle<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    pub fn sample(&self, index: u64, modifier: u64) -> PseudoRandomSample {
        let raw = self.source.sample(index, modifier);
        let value = if raw.is_finite() {
            raw.clamp(0.0, BELOW_ONE)
        } else {
            0.0
        };
        PseudoRandomSample {
            index,
            modifier,
            value,
        }
    }

    /// Result in [0.1, 0.99]
    pub fn compute_coherence(&self, now_ms: i64) -> f64 {
        (COHERENCE_BASE + Self::trend(now_ms) + self.noise(now_ms))
            .clamp(COHERENCE_FLOOR, COHERENCE_CEILING)
    }

    /// Result in [0, 1)
    pub fn compute_quantum_randomness(&self, now_ms: i64) -> f64 {
        let index = bucket(now_ms, 100);
        self.sample(index, QUANTUM_MODIFIER).value
    }

    /// Result in [0.1, 0.9]
    pub fn compute_global_entropy(&self, now_ms: i64) -> f64 {
        (ENTROPY_BASE + Self::trend(now_ms) + self.noise(now_ms))
            .clamp(ENTROPY_FLOOR, ENTROPY_CEILING)
    }

    fn trend(now_ms: i64) -> f64 {
        DAILY_AMPLITUDE * phase(now_ms, DAY_MS).sin()
            + RESONANCE_AMPLITUDE * phase(now_ms, RESONANCE_PERIOD_MS).sin()
    }

    /// Shared perturbation in [-0.1, 0.1)
    fn noise(&self, now_ms: i64) -> f64 {
        let sample = self.sample(bucket(now_ms, 1000), COHERENCE_MODIFIER);
        sample.value * 2.0 * NOISE_AMPLITUDE - NOISE_AMPLITUDE
    }
}

impl<R: RandomSource> SignalSource for EntropyOracle<R> {
    fn snapshot(&self, now_ms: i64) -> EntropySnapshot {
        EntropySnapshot {
            coherence: self.compute_coherence(now_ms),
            quantum_randomness: self.compute_quantum_randomness(now_ms),
            global_entropy: self.compute_global_entropy(now_ms),
            timestamp: now_ms,
        }
    }
}

/// `floor(now / step) mod 1000`, non-negative for pre-epoch timestamps too.
fn bucket(now_ms: i64, step: i64) -> u64 {
    now_ms.div_euclid(step).rem_euclid(INDEX_SPAN) as u64
}

fn phase(now_ms: i64, period_ms: i64) -> f64 {
    now_ms.rem_euclid(period_ms) as f64 / period_ms as f64 * TAU
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f64);

    impl RandomSource for Fixed {
        fn sample(&self, _index: u64, _modifier: u64) -> f64 {
            self.0
        }
    }

    #[test]
    fn test_sine_hash_is_deterministic() {
        let src = SineHashSource;
        assert_eq!(src.sample(17, 2), src.sample(17, 2));
        assert_ne!(src.sample(17, 1), src.sample(17, 2));
        assert_eq!(src.sample(0, 1), 0.0);
    }

    #[test]
    fn test_coherence_at_epoch_with_neutral_noise() {
        // Noise sample 0.5 maps to a zero perturbation, both sines are zero at t=0
        let oracle = EntropyOracle::new(Fixed(0.5));
        assert!((oracle.compute_coherence(0) - 0.8).abs() < 1e-12);
        assert!((oracle.compute_global_entropy(0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_daily_peak_lifts_coherence() {
        let oracle = EntropyOracle::new(Fixed(0.5));
        let quarter_day = DAY_MS / 4;
        let resonance = RESONANCE_AMPLITUDE * phase(quarter_day, RESONANCE_PERIOD_MS).sin();
        let expected = 0.8 + 0.1 + resonance;
        assert!((oracle.compute_coherence(quarter_day) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range_source_is_clamped() {
        let oracle = EntropyOracle::new(Fixed(1.7));
        let q = oracle.compute_quantum_randomness(123_456);
        assert!(q < 1.0 && q >= 0.0);

        let oracle = EntropyOracle::new(Fixed(f64::NAN));
        assert_eq!(oracle.compute_quantum_randomness(123_456), 0.0);
    }

    #[test]
    fn test_buckets_follow_time_steps() {
        assert_eq!(bucket(1_999, 1000), 1);
        assert_eq!(bucket(1_000_500, 1000), 0);
        assert_eq!(bucket(250, 100), 2);
        assert_eq!(bucket(-1, 1000), 999);
    }

    #[test]
    fn test_snapshot_carries_timestamp() {
        let snap = EntropyOracle::<SineHashSource>::default().snapshot(1_700_000_000_000);
        assert_eq!(snap.timestamp, 1_700_000_000_000);
        assert!((0.1..=0.99).contains(&snap.coherence));
        assert!((0.1..=0.9).contains(&snap.global_entropy));
    }
}
