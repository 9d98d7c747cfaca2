// qbtc-common/src/duration.rs
// QBTC - Big Bang activation window

use serde::{Deserialize, Serialize};

pub const BASE_DURATION_MS: u64 = 510_000; // 8.5 min
pub const MIN_DURATION_MS: u64 = 300_000; // 5 min
pub const MAX_DURATION_MS: u64 = 900_000; // 15 min
pub const COHERENCE_PIVOT: f64 = 0.92;

/// Stronger signals stretch the window, the bounds always win.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationWindow {
    pub base_ms: u64,
    pub min_ms: u64,
    pub max_ms: u64,
    /// Coherence at which the coherence factor is exactly 1.0
    pub coherence_pivot: f64,
}

impl Default for DurationWindow {
    fn default() -> Self {
        Self {
            base_ms: BASE_DURATION_MS,
            min_ms: MIN_DURATION_MS,
            max_ms: MAX_DURATION_MS,
            coherence_pivot: COHERENCE_PIVOT,
        }
    }
}

impl DurationWindow {
    pub fn compute(&self, coherence: f64, quantum: f64) -> u64 {
        let coherence_factor = 1.0 + (coherence - self.coherence_pivot) * 2.0;
        let quantum_factor = 0.8 + quantum * 0.4;
        let raw = self.base_ms as f64 * coherence_factor * quantum_factor;

        let (lo, hi) = self.bounds();
        if !raw.is_finite() {
            return lo;
        }
        raw.round().clamp(lo as f64, hi as f64) as u64
    }

    pub fn contains(&self, duration_ms: u64) -> bool {
        let (lo, hi) = self.bounds();
        (lo..=hi).contains(&duration_ms)
    }

    /// `(min, max)` with inverted windows swapped back into order
    fn bounds(&self) -> (u64, u64) {
        if self.min_ms <= self.max_ms {
            (self.min_ms, self.max_ms)
        } else {
            (self.max_ms, self.min_ms)
        }
    }
}

/// Duration in ms for the default 5-15 minute window.
pub fn compute_duration(coherence: f64, quantum: f64) -> u64 {
    DurationWindow::default().compute(coherence, quantum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_activation_duration() {
        // 8.5 min * 1.06 * 1.196 ~ 10.77 min
        let d = compute_duration(0.95, 0.99);
        assert!((d as f64 - 646_557.6).abs() < 1.0);
        assert!((d as f64 / 60_000.0 - 10.78).abs() < 0.01);
    }

    #[test]
    fn test_clamps_to_window() {
        assert_eq!(compute_duration(0.0, 0.0), MIN_DURATION_MS);
        assert_eq!(compute_duration(5.0, 1.0), MAX_DURATION_MS);
        assert_eq!(compute_duration(f64::NAN, 0.5), MIN_DURATION_MS);
    }

    #[test]
    fn test_custom_window() {
        let w = DurationWindow {
            base_ms: 60_000,
            min_ms: 30_000,
            max_ms: 120_000,
            coherence_pivot: 0.5,
        };
        // factors 1.0 and 1.0
        assert_eq!(w.compute(0.5, 0.5), 60_000);
        assert!(w.contains(30_000));
        assert!(!w.contains(120_001));
    }

    #[test]
    fn test_inverted_window_does_not_panic() {
        let w = DurationWindow {
            min_ms: 900_000,
            max_ms: 300_000,
            ..DurationWindow::default()
        };
        let d = w.compute(0.95, 0.99);
        assert!((300_000..=900_000).contains(&d));
        assert_eq!(w.compute(0.0, 0.0), 300_000);
        assert_eq!(w.compute(f64::NAN, 0.5), 300_000);
        assert!(w.contains(600_000));
    }
}
