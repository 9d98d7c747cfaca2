// qbtc-core/src/bigbang/amplifier.rs
// One-shot amplification pass over the open position set

use futures_util::future::join_all;
use qbtc_common::Position;
use rust_decimal::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::BigBangConfig;
use crate::execution::{ExecutionError, ExecutionSink};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmplificationOrder {
    pub symbol: String,
    pub new_leverage: f64,
    pub new_size: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedAmplification {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AmplificationReport {
    pub amplified: Vec<AmplificationOrder>,
    pub failed: Vec<FailedAmplification>,
}

pub struct Amplifier {
    sink: Arc<dyn ExecutionSink>,
    leverage_multiplier: f64,
    max_leverage: f64,
    timeout: Duration,
    retries: u32,
}

impl Amplifier {
    pub fn new(sink: Arc<dyn ExecutionSink>, config: &BigBangConfig) -> Self {
        Self {
            sink,
            leverage_multiplier: config.leverage_multiplier,
            max_leverage: config.max_leverage,
            timeout: config.execution_timeout,
            retries: config.execution_retries,
        }
    }

    /// New leverage capped at the ceiling, size scaled by the same multiplier.
    /// Rejects non-positive leverage and sizes that would overflow.
    pub fn plan(&self, position: &Position) -> Result<AmplificationOrder, ExecutionError> {
        let rejected = |reason: String| ExecutionError::Rejected {
            symbol: position.symbol.clone(),
            reason,
        };

        if !position.leverage.is_finite() || position.leverage <= 0.0 {
            return Err(rejected(format!("invalid leverage {}", position.leverage)));
        }
        let multiplier = Decimal::from_f64(self.leverage_multiplier).unwrap_or(Decimal::ONE);
        let new_size = position
            .size
            .checked_mul(multiplier)
            .ok_or_else(|| rejected(format!("size {} overflows at x{}", position.size, multiplier)))?;

        Ok(AmplificationOrder {
            symbol: position.symbol.clone(),
            new_leverage: (position.leverage * self.leverage_multiplier).min(self.max_leverage),
            new_size,
        })
    }

    /// Submits every position concurrently. A failing position is recorded
    /// and never aborts the others.
    pub async fn run(&self, positions: &[Position]) -> AmplificationReport {
        let submissions = positions.iter().map(|position| async move {
            let outcome = match self.plan(position) {
                Ok(order) => self.submit(&order).await.map(|()| order),
                Err(e) => Err(e),
            };
            (position.symbol.clone(), outcome)
        });

        let mut report = AmplificationReport::default();
        for (symbol, outcome) in join_all(submissions).await {
            match outcome {
                Ok(order) => report.amplified.push(order),
                Err(e) => {
                    warn!("Amplification failed for {}: {}", symbol, e);
                    report.failed.push(FailedAmplification {
                        symbol,
                        reason: e.to_string(),
                    });
                }
            }
        }
        report
    }

    async fn submit(&self, order: &AmplificationOrder) -> Result<(), ExecutionError> {
        let mut attempt = 0;
        loop {
            let call = self.sink.execute_amplification(
                &order.symbol,
                order.new_leverage,
                order.new_size,
            );
            let result = match timeout(self.timeout, call).await {
                Ok(r) => r,
                Err(_) => Err(ExecutionError::Timeout(order.symbol.clone())),
            };

            match result {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    debug!("Retrying amplification for {} ({}): {}", order.symbol, attempt, e);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
