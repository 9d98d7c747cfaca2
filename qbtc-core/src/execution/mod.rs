// qbtc-core/src/execution/mod.rs
// Ports to the position-tracking and order-execution side

pub mod errors;
pub mod http;
pub mod paper;
pub mod traits;

pub use errors::{ExecutionError, ProviderError};
pub use http::HttpExecutionSink;
pub use paper::PaperPositionBook;
pub use traits::{ExecutionSink, PositionProvider};
