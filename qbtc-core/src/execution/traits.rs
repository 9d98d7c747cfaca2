// qbtc-core/src/execution/traits.rs

use async_trait::async_trait;
use qbtc_common::Position;
use rust_decimal::Decimal;

use crate::execution::errors::{ExecutionError, ProviderError};

#[async_trait]
pub trait PositionProvider: Send + Sync {
    /// Snapshot of the currently open positions
    async fn get_active_positions(&self) -> Result<Vec<Position>, ProviderError>;
}

#[async_trait]
pub trait ExecutionSink: Send + Sync {
    /// Pushes new leverage/size for one position to the execution path
    async fn execute_amplification(
        &self,
        symbol: &str,
        new_leverage: f64,
        new_size: Decimal,
    ) -> Result<(), ExecutionError>;
}
