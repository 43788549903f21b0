//! # Tidepool AMM Library - Pool Quoting Engine
//!
//! ## Purpose
//!
//! Client-side quoting for a two-asset constant-product pool: swap outputs,
//! ratio-preserving deposits, fees, withdrawal previews, and liquidity
//! provider share and fee entitlement. Figures come from the ledger whenever
//! it answers; a local recomputation over the last snapshot covers transient
//! outages and is always tagged approximate.
//!
//! ## Integration Points
//!
//! - **Input Sources**: a [`SettlementGateway`] implementation (the EVM
//!   client in `services/pool_client`, or an in-memory mock in tests)
//! - **Output Destinations**: CLI panels and anything else that displays
//!   quotes; nothing here submits transactions
//! - **Precision**: 256-bit integers of 10^-18 units, truncating like the
//!   ledger's own integer math
//!
//! ## Architecture Role
//!
//! ```text
//! QuotingEngine ──refresh──▶ SnapshotStore ◀──load── ApproximateSource
//!       │                                                 │
//!       ├── RetryPolicy ──▶ AuthoritativeSource ──▶ SettlementGateway
//!       │                                                 │
//!       └──────────── QuoteSource (both tiers) ◀──────────┘
//! ```
//!
//! [`ConstantProduct`] and the reward functions are pure over explicit
//! inputs; the only shared state is the snapshot, replaced wholesale on each
//! refresh.

pub mod constant_product;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod gateway;
pub mod rewards;
pub mod snapshot;
pub mod source;

pub use constant_product::{ConstantProduct, SwapOutcome};
pub use engine::{EngineSettings, PoolOverview, QuotingEngine, RetryPolicy};
pub use error::{ErrorClass, QuoteError, QuoteResult};
pub use fallback::FallbackCalculator;
pub use gateway::{GatewayError, GatewayResult, SettlementGateway};
pub use rewards::{compute_entitlement, compute_share, HolderRewards};
pub use snapshot::SnapshotStore;
pub use source::{ApproximateSource, AuthoritativeSource, QuoteSource};

/// Shared data model
pub use tidepool_types as types;
