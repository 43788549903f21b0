//! Quote sources: the ledger's own figures and the local fallback
//!
//! Both tiers implement [`QuoteSource`] so the engine can run the same
//! operation against either one.

use crate::error::{QuoteError, QuoteResult};
use crate::fallback::FallbackCalculator;
use crate::gateway::SettlementGateway;
use crate::snapshot::SnapshotStore;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tidepool_types::{Amount, Entitlement, Fidelity, Fraction, HolderPosition, Quote, TokenSide};
use tracing::warn;

/// Unified interface over the two quoting tiers
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Fidelity tag attached to everything this source returns
    fn fidelity(&self) -> Fidelity;

    /// Output and fee for selling `amount_in` of `token_in`
    async fn quote_swap(&self, token_in: TokenSide, amount_in: Amount) -> QuoteResult<Quote>;

    /// Token1 needed next to `amount0` for a ratio-preserving deposit
    async fn required_paired_amount(&self, amount0: Amount) -> QuoteResult<Amount>;

    /// Fee charged on `amount_in`
    async fn fee(&self, amount_in: Amount) -> QuoteResult<Amount>;

    /// Fees attributed to a liquidity provider
    async fn entitlement(&self, holder: HolderPosition) -> QuoteResult<Entitlement>;
}

/// Forwards every call to the ledger's computed-quote functions
pub struct AuthoritativeSource<G> {
    gateway: G,
}

impl<G: SettlementGateway> AuthoritativeSource<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

#[async_trait]
impl<G: SettlementGateway> QuoteSource for AuthoritativeSource<G> {
    fn fidelity(&self) -> Fidelity {
        Fidelity::Authoritative
    }

    async fn quote_swap(&self, token_in: TokenSide, amount_in: Amount) -> QuoteResult<Quote> {
        let token_out = token_in.other();
        let (amount_out, fee_amount) = futures::try_join!(
            self.gateway
                .authoritative_quote_swap(token_in, amount_in, token_out),
            self.gateway.authoritative_fee(amount_in),
        )
        .map_err(|e| e.into_quote_error("quote_swap"))?;

        Ok(Quote {
            token_in,
            amount_in,
            token_out,
            amount_out,
            fee_amount,
        })
    }

    async fn required_paired_amount(&self, amount0: Amount) -> QuoteResult<Amount> {
        self.gateway
            .authoritative_required_paired(amount0)
            .await
            .map_err(|e| e.into_quote_error("quote_paired_deposit"))
    }

    async fn fee(&self, amount_in: Amount) -> QuoteResult<Amount> {
        self.gateway
            .authoritative_fee(amount_in)
            .await
            .map_err(|e| e.into_quote_error("quote_fee"))
    }

    async fn entitlement(&self, holder: HolderPosition) -> QuoteResult<Entitlement> {
        self.gateway
            .authoritative_entitlement(holder.account)
            .await
            .map_err(|e| e.into_quote_error("holder_rewards"))
    }
}

/// Recomputes from whatever snapshot the store holds at call time
pub struct ApproximateSource {
    store: Arc<SnapshotStore>,
    accumulated_fee_estimate_rate: Fraction,
    max_snapshot_age: Duration,
}

impl ApproximateSource {
    pub fn new(
        store: Arc<SnapshotStore>,
        accumulated_fee_estimate_rate: Fraction,
        max_snapshot_age: Duration,
    ) -> Self {
        Self {
            store,
            accumulated_fee_estimate_rate,
            max_snapshot_age,
        }
    }

    /// Calculator over the current snapshot, warning when it has aged
    pub fn calculator(&self) -> QuoteResult<FallbackCalculator> {
        let snapshot = self.store.load().ok_or(QuoteError::NoSnapshot)?;
        if snapshot.is_older_than(self.max_snapshot_age) {
            warn!(
                age_secs = snapshot.age().as_secs(),
                max_age_secs = self.max_snapshot_age.as_secs(),
                "⚠️ Pool snapshot is stale, approximate figures may be off"
            );
        }
        Ok(FallbackCalculator::new(
            snapshot,
            self.accumulated_fee_estimate_rate,
        ))
    }
}

#[async_trait]
impl QuoteSource for ApproximateSource {
    fn fidelity(&self) -> Fidelity {
        Fidelity::Approximate
    }

    async fn quote_swap(&self, token_in: TokenSide, amount_in: Amount) -> QuoteResult<Quote> {
        self.calculator()?.quote_swap(token_in, amount_in)
    }

    async fn required_paired_amount(&self, amount0: Amount) -> QuoteResult<Amount> {
        self.calculator()?.required_paired_amount(amount0)
    }

    async fn fee(&self, amount_in: Amount) -> QuoteResult<Amount> {
        self.calculator()?.fee(amount_in)
    }

    async fn entitlement(&self, holder: HolderPosition) -> QuoteResult<Entitlement> {
        Ok(self.calculator()?.entitlement(holder.lp_balance))
    }
}
