//! Settlement Gateway capability consumed by the quoting engine
//!
//! The gateway is the ledger: it owns balances and runs the pool's own quote
//! functions. Only its reads and computed-quote calls appear here; approvals,
//! swaps, deposits and withdrawals are executed elsewhere.

use crate::error::QuoteError;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tidepool_types::{
    AccumulatedFees, Address, Amount, Entitlement, HolderBalances, PairAmounts, TokenSide,
};

/// Result type alias for gateway calls
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Failures reported by a gateway implementation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Transport failure or timeout
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// The node has not caught up with the requested block
    #[error("ledger block not yet synchronized")]
    NotSynchronized,

    /// The call reverted or was otherwise refused
    #[error("call rejected: {0}")]
    Rejected(String),

    /// The response did not decode into the expected values
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl GatewayError {
    /// Check if a retry (or the fallback) may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Unavailable(_) | GatewayError::NotSynchronized)
    }

    /// Attach the engine operation that issued the call
    pub fn into_quote_error(self, operation: &'static str) -> QuoteError {
        match self {
            GatewayError::Unavailable(message) => QuoteError::Unavailable { operation, message },
            GatewayError::NotSynchronized => QuoteError::NotSynchronized { operation },
            GatewayError::Rejected(reason) => QuoteError::Rejected { operation, reason },
            GatewayError::Malformed(message) => QuoteError::Malformed { operation, message },
        }
    }
}

/// Reads and computed-quote calls offered by the ledger
#[async_trait]
pub trait SettlementGateway: Send + Sync {
    /// Current pool reserves of both assets
    async fn read_reserves(&self) -> GatewayResult<PairAmounts>;

    /// Total LP-token supply
    async fn read_total_supply(&self) -> GatewayResult<Amount>;

    /// Fees collected since inception, per asset
    async fn read_accumulated_fees(&self) -> GatewayResult<AccumulatedFees>;

    /// LP-token balance of one account
    async fn read_lp_balance(&self, holder: Address) -> GatewayResult<Amount>;

    /// Wallet balances of one account
    async fn read_balances(&self, holder: Address) -> GatewayResult<HolderBalances>;

    /// Output the pool itself computes for a trade
    async fn authoritative_quote_swap(
        &self,
        token_in: TokenSide,
        amount_in: Amount,
        token_out: TokenSide,
    ) -> GatewayResult<Amount>;

    /// Token1 the pool will require alongside `amount0`
    async fn authoritative_required_paired(&self, amount0: Amount) -> GatewayResult<Amount>;

    /// Fee the pool will charge on `amount_in`
    async fn authoritative_fee(&self, amount_in: Amount) -> GatewayResult<Amount>;

    /// Fees the pool attributes to `holder`
    async fn authoritative_entitlement(&self, holder: Address) -> GatewayResult<Entitlement>;
}

#[async_trait]
impl<G: SettlementGateway + ?Sized> SettlementGateway for Arc<G> {
    async fn read_reserves(&self) -> GatewayResult<PairAmounts> {
        (**self).read_reserves().await
    }

    async fn read_total_supply(&self) -> GatewayResult<Amount> {
        (**self).read_total_supply().await
    }

    async fn read_accumulated_fees(&self) -> GatewayResult<AccumulatedFees> {
        (**self).read_accumulated_fees().await
    }

    async fn read_lp_balance(&self, holder: Address) -> GatewayResult<Amount> {
        (**self).read_lp_balance(holder).await
    }

    async fn read_balances(&self, holder: Address) -> GatewayResult<HolderBalances> {
        (**self).read_balances(holder).await
    }

    async fn authoritative_quote_swap(
        &self,
        token_in: TokenSide,
        amount_in: Amount,
        token_out: TokenSide,
    ) -> GatewayResult<Amount> {
        (**self)
            .authoritative_quote_swap(token_in, amount_in, token_out)
            .await
    }

    async fn authoritative_required_paired(&self, amount0: Amount) -> GatewayResult<Amount> {
        (**self).authoritative_required_paired(amount0).await
    }

    async fn authoritative_fee(&self, amount_in: Amount) -> GatewayResult<Amount> {
        (**self).authoritative_fee(amount_in).await
    }

    async fn authoritative_entitlement(&self, holder: Address) -> GatewayResult<Entitlement> {
        (**self).authoritative_entitlement(holder).await
    }
}
