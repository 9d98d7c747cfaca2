// qbtc-common/src/lib.rs
// QBTC - Shared domain model and signal primitives (no I/O)

pub mod clock;
pub mod duration;
pub mod entropy;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use duration::{compute_duration, DurationWindow};
pub use entropy::{EntropyOracle, RandomSource, SignalSource, SineHashSource};
pub use types::*;
