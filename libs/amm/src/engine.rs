//! Quoting engine: snapshot refresh and two-tier quote resolution
//!
//! Every quote first goes to the ledger. When that call fails with a
//! transient error the engine makes exactly one attempt through the local
//! fallback and tags the result approximate. Anything else surfaces
//! unchanged.

use crate::error::{QuoteError, QuoteResult};
use crate::fallback::FallbackCalculator;
use crate::gateway::SettlementGateway;
use crate::rewards::{compute_share, HolderRewards};
use crate::snapshot::SnapshotStore;
use crate::source::{ApproximateSource, AuthoritativeSource, QuoteSource};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tidepool_types::{
    AccumulatedFees, Address, Amount, Estimate, FeeSchedule, Fraction, HolderBalances,
    HolderPosition, PairAmounts, PoolSnapshot, Quote, TokenSide,
};
use tracing::{debug, info, warn};

/// How the engine chooses between the ledger and the local fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Transient ledger errors surface directly
    AuthoritativeOnly,
    /// One fallback attempt after a transient ledger error
    #[default]
    FallbackOnce,
    /// Offline mode; computed-quote calls are never made
    ApproximateOnly,
}

/// Engine parameters, normally derived from the client configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub schedule: FeeSchedule,
    pub policy: RetryPolicy,
    /// Reserve multiplier standing in for unreadable accumulated fees
    pub accumulated_fee_estimate_rate: Fraction,
    /// Snapshots older than this are re-read before share and overview
    /// figures; the fallback still runs on them but warns
    pub max_snapshot_age: Duration,
}

/// Pool figures shown in the overview panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolOverview {
    pub reserves: PairAmounts,
    pub total_supply: Amount,
    pub schedule: FeeSchedule,
    pub accumulated_fees: Estimate<AccumulatedFees>,
    pub snapshot_age_secs: u64,
}

/// Entry point for every quote, share and entitlement the client shows
pub struct QuotingEngine<G> {
    authoritative: AuthoritativeSource<G>,
    approximate: ApproximateSource,
    store: Arc<SnapshotStore>,
    settings: EngineSettings,
}

impl<G: SettlementGateway> QuotingEngine<G> {
    pub fn new(gateway: G, settings: EngineSettings) -> Self {
        let store = Arc::new(SnapshotStore::new());
        Self {
            authoritative: AuthoritativeSource::new(gateway),
            approximate: ApproximateSource::new(
                Arc::clone(&store),
                settings.accumulated_fee_estimate_rate,
                settings.max_snapshot_age,
            ),
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn gateway(&self) -> &G {
        self.authoritative.gateway()
    }

    /// Most recent snapshot, if any refresh has succeeded
    pub fn snapshot(&self) -> Option<Arc<PoolSnapshot>> {
        self.store.load()
    }

    /// Read reserves, supply and accumulated fees into a new snapshot
    ///
    /// Reserves and supply are required. A failed accumulated-fee read
    /// leaves that field empty so the fallback estimates it instead.
    pub async fn refresh(&self) -> QuoteResult<Arc<PoolSnapshot>> {
        let gateway = self.gateway();
        let (reserves, total_supply, accumulated_fees) = futures::join!(
            gateway.read_reserves(),
            gateway.read_total_supply(),
            gateway.read_accumulated_fees(),
        );
        let reserves = reserves.map_err(|e| e.into_quote_error("refresh"))?;
        let total_supply = total_supply.map_err(|e| e.into_quote_error("refresh"))?;
        let accumulated_fees = match accumulated_fees {
            Ok(fees) => Some(fees),
            // a pool without the fee getter fails the same way every cycle
            Err(e) if !e.is_transient() => {
                debug!(error = %e, "Accumulated fees not exposed, estimating from reserves");
                None
            }
            Err(e) => {
                warn!(error = %e, "Accumulated fees unreadable, estimating from reserves");
                None
            }
        };

        let snapshot =
            PoolSnapshot::new(reserves, total_supply, accumulated_fees, self.settings.schedule)?;
        info!(
            reserve0 = %reserves.token0,
            reserve1 = %reserves.token1,
            %total_supply,
            "🔄 Pool snapshot refreshed"
        );
        Ok(self.store.store(snapshot))
    }

    pub async fn quote_swap(
        &self,
        token_in: TokenSide,
        amount_in: Amount,
    ) -> QuoteResult<Estimate<Quote>> {
        // never sent to the ledger, so not authoritative even though exact
        if amount_in.is_zero() {
            return Ok(Estimate::approximate(Quote {
                token_in,
                amount_in,
                token_out: token_in.other(),
                amount_out: Amount::ZERO,
                fee_amount: Amount::ZERO,
            }));
        }
        let quote = self
            .resolve("quote_swap", move |source| {
                source.quote_swap(token_in, amount_in)
            })
            .await?;
        debug!(
            %token_in, %amount_in,
            amount_out = %quote.value.amount_out,
            fidelity = ?quote.fidelity,
            "swap quoted"
        );
        Ok(quote)
    }

    /// Token1 required alongside `amount0` for a ratio-preserving deposit
    pub async fn quote_paired_deposit(&self, amount0: Amount) -> QuoteResult<Estimate<Amount>> {
        if self.store.load().is_some_and(|snapshot| snapshot.is_empty()) {
            return Err(QuoteError::EmptyPool);
        }
        self.resolve("quote_paired_deposit", move |source| {
            source.required_paired_amount(amount0)
        })
        .await
    }

    pub async fn quote_fee(&self, amount_in: Amount) -> QuoteResult<Estimate<Amount>> {
        self.resolve("quote_fee", move |source| source.fee(amount_in))
            .await
    }

    /// Withdrawal preview, always computed from the local snapshot
    pub async fn quote_withdraw(&self, lp_amount: Amount) -> QuoteResult<Estimate<PairAmounts>> {
        let calculator = self.local_calculator().await?;
        calculator.withdraw(lp_amount).map(Estimate::approximate)
    }

    /// A holder's pool share and fee entitlement
    pub async fn holder_rewards(&self, account: Address) -> QuoteResult<HolderRewards> {
        let snapshot = self.current_or_refresh().await?;
        let lp_balance = self
            .gateway()
            .read_lp_balance(account)
            .await
            .map_err(|e| e.into_quote_error("holder_rewards"))?;
        let position = HolderPosition {
            account,
            lp_balance,
        };

        let share = compute_share(lp_balance, snapshot.total_supply());
        let entitlement = self
            .resolve("holder_rewards", move |source| source.entitlement(position))
            .await?;

        Ok(HolderRewards {
            position,
            share,
            entitlement,
        })
    }

    pub async fn holder_balances(&self, account: Address) -> QuoteResult<HolderBalances> {
        self.gateway()
            .read_balances(account)
            .await
            .map_err(|e| e.into_quote_error("holder_balances"))
    }

    pub async fn pool_overview(&self) -> QuoteResult<PoolOverview> {
        let calculator = self.local_calculator().await?;
        let snapshot = calculator.snapshot();
        Ok(PoolOverview {
            reserves: snapshot.reserves(),
            total_supply: snapshot.total_supply(),
            schedule: snapshot.schedule(),
            accumulated_fees: calculator.accumulated_fees(),
            snapshot_age_secs: snapshot.age().as_secs(),
        })
    }

    /// Price impact of `quote` against the current snapshot's spot rate
    pub fn price_impact(&self, quote: &Quote) -> QuoteResult<Fraction> {
        let snapshot = self.store.load().ok_or(QuoteError::NoSnapshot)?;
        FallbackCalculator::new(snapshot, self.settings.accumulated_fee_estimate_rate)
            .price_impact(quote)
    }

    /// Stored snapshot, re-read first once it is older than `max_snapshot_age`
    ///
    /// An aged snapshot is only served when the re-read fails transiently.
    async fn current_or_refresh(&self) -> QuoteResult<Arc<PoolSnapshot>> {
        let stale = match self.store.load() {
            Some(snapshot) if !snapshot.is_older_than(self.settings.max_snapshot_age) => {
                return Ok(snapshot)
            }
            Some(snapshot) => snapshot,
            None => return self.refresh().await,
        };
        match self.refresh().await {
            Ok(fresh) => Ok(fresh),
            Err(error) if error.is_transient() => {
                warn!(
                    age_secs = stale.age().as_secs(),
                    error = %error,
                    "⚠️ Pool snapshot is stale and could not be re-read"
                );
                Ok(stale)
            }
            Err(error) => Err(error),
        }
    }

    async fn local_calculator(&self) -> QuoteResult<FallbackCalculator> {
        let snapshot = self.current_or_refresh().await?;
        Ok(FallbackCalculator::new(
            snapshot,
            self.settings.accumulated_fee_estimate_rate,
        ))
    }

    /// Run `call` against the sources the retry policy allows
    async fn resolve<T, F>(&self, operation: &'static str, call: F) -> QuoteResult<Estimate<T>>
    where
        F: for<'a> Fn(&'a dyn QuoteSource) -> BoxFuture<'a, QuoteResult<T>>,
    {
        let approximate: &dyn QuoteSource = &self.approximate;
        if self.settings.policy == RetryPolicy::ApproximateOnly {
            return tagged(approximate, &call).await;
        }

        let authoritative: &dyn QuoteSource = &self.authoritative;
        match tagged(authoritative, &call).await {
            Ok(estimate) => Ok(estimate),
            Err(error)
                if error.is_transient() && self.settings.policy == RetryPolicy::FallbackOnce =>
            {
                warn!(
                    operation,
                    error = %error,
                    "⚠️ Authoritative quote failed, using local fallback"
                );
                tagged(approximate, &call)
                    .await
                    .map_err(|fallback| QuoteError::FallbackFailed {
                        authoritative: Box::new(error),
                        fallback: Box::new(fallback),
                    })
            }
            Err(error) => Err(error),
        }
    }
}

async fn tagged<'a, T, F>(source: &'a dyn QuoteSource, call: &F) -> QuoteResult<Estimate<T>>
where
    F: for<'b> Fn(&'b dyn QuoteSource) -> BoxFuture<'b, QuoteResult<T>>,
{
    let fidelity = source.fidelity();
    let value = call(source).await?;
    Ok(Estimate { value, fidelity })
}
