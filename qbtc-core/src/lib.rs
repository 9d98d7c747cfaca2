// qbtc-core/src/lib.rs
// QBTC - Leverage & Big Bang engines, execution plumbing, control surface

pub mod archive;
pub mod bigbang;
pub mod config;
pub mod execution;
pub mod leverage;
pub mod server;
pub mod service;

// Re-export qbtc-common for convenience
pub use qbtc_common::{clock, duration, entropy, types};
