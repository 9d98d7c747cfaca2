// src/execution/paper.rs
use async_trait::async_trait;
use dashmap::DashMap;
use qbtc_common::Position;
use rust_decimal::Decimal;
use tracing::debug;

use super::errors::{ExecutionError, ProviderError};
use super::traits::{ExecutionSink, PositionProvider};

/// In-memory position book. Serves as both the position provider and the
/// execution sink when no live execution path is configured.
#[derive(Debug, Default)]
pub struct PaperPositionBook {
    positions: DashMap<String, Position>,
}

impl PaperPositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_positions(positions: impl IntoIterator<Item = Position>) -> Self {
        let book = Self::new();
        for p in positions {
            book.upsert(p);
        }
        book
    }

    pub fn upsert(&self, position: Position) {
        self.positions
            .insert(position.symbol.to_uppercase(), position);
    }

    pub fn remove(&self, symbol: &str) -> Option<Position> {
        self.positions
            .remove(&symbol.to_uppercase())
            .map(|(_, p)| p)
    }

    pub fn get(&self, symbol: &str) -> Option<Position> {
        self.positions
            .get(&symbol.to_uppercase())
            .map(|p| p.clone())
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[async_trait]
impl PositionProvider for PaperPositionBook {
    async fn get_active_positions(&self) -> Result<Vec<Position>, ProviderError> {
        let mut positions: Vec<Position> =
            self.positions.iter().map(|e| e.value().clone()).collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(positions)
    }
}

#[async_trait]
impl ExecutionSink for PaperPositionBook {
    async fn execute_amplification(
        &self,
        symbol: &str,
        new_leverage: f64,
        new_size: Decimal,
    ) -> Result<(), ExecutionError> {
        match self.positions.get_mut(&symbol.to_uppercase()) {
            Some(mut entry) => {
                debug!(
                    "PAPER amplify {}: leverage {} -> {}, size {} -> {}",
                    symbol, entry.leverage, new_leverage, entry.size, new_size
                );
                entry.leverage = new_leverage;
                entry.size = new_size;
                Ok(())
            }
            None => Err(ExecutionError::Rejected {
                symbol: symbol.to_string(),
                reason: "no open position".to_string(),
            }),
        }
    }
}
