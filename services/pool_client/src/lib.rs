//! # Tidepool Pool Client
//!
//! EVM-backed settlement gateway, periodic refresh and terminal rendering
//! for the `tidepool` binary.

pub mod evm_gateway;
pub mod logging;
pub mod notice;
pub mod refresh;

pub use evm_gateway::EvmGateway;
pub use notice::Symbols;
pub use refresh::{run_refresh_loop, RefreshStats};
