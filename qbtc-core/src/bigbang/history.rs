// qbtc-core/src/bigbang/history.rs

use qbtc_common::{BigBangEvent, BigBangStats};
use std::collections::VecDeque;

/// Insertion-ordered event log capped at `capacity`; the oldest entry is
/// evicted first. Stats are lifetime totals and survive eviction.
#[derive(Debug, Clone)]
pub struct EventHistory {
    events: VecDeque<BigBangEvent>,
    capacity: usize,
    total_events: u64,
    duration_sum_ms: f64,
    coherence_sum: f64,
    last_event_timestamp: Option<i64>,
}

impl EventHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            total_events: 0,
            duration_sum_ms: 0.0,
            coherence_sum: 0.0,
            last_event_timestamp: None,
        }
    }

    pub fn push(&mut self, event: BigBangEvent) {
        self.total_events += 1;
        self.duration_sum_ms += event.duration_ms as f64;
        self.coherence_sum += event.coherence;
        self.last_event_timestamp = Some(event.timestamp);

        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn events(&self) -> Vec<BigBangEvent> {
        self.events.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn stats(&self) -> BigBangStats {
        let n = self.total_events as f64;
        let (avg_duration_minutes, avg_coherence_percent) = if self.total_events == 0 {
            (0.0, 0.0)
        } else {
            (
                self.duration_sum_ms / n / 60_000.0,
                self.coherence_sum / n * 100.0,
            )
        };

        BigBangStats {
            total_events: self.total_events,
            avg_duration_minutes,
            avg_coherence_percent,
            last_event_timestamp: self.last_event_timestamp,
        }
    }
}
