//! Refresh loop against a scripted in-memory ledger

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tidepool_amm::{
    EngineSettings, GatewayError, GatewayResult, QuotingEngine, RetryPolicy, SettlementGateway,
};
use tidepool_client::run_refresh_loop;
use tidepool_types::{
    AccumulatedFees, Address, Amount, Entitlement, FeeSchedule, Fraction, HolderBalances,
    PairAmounts, TokenSide,
};
use tokio::sync::oneshot;

/// Serves fixed reserves, failing every reserve read after the first `healthy_reads`
struct ScriptedGateway {
    healthy_reads: u64,
    reads: AtomicU64,
}

impl ScriptedGateway {
    fn new(healthy_reads: u64) -> Self {
        Self {
            healthy_reads,
            reads: AtomicU64::new(0),
        }
    }
}

/// Computed calls always hit a node that is behind
fn unsynchronized<T>() -> GatewayResult<T> {
    Err(GatewayError::NotSynchronized)
}

#[async_trait]
impl SettlementGateway for ScriptedGateway {
    async fn read_reserves(&self) -> GatewayResult<PairAmounts> {
        let read = self.reads.fetch_add(1, Ordering::SeqCst);
        if read >= self.healthy_reads {
            return Err(GatewayError::Unavailable("node went away".to_string()));
        }
        Ok(PairAmounts::new(Amount::from_whole(1_000), Amount::from_whole(10_000)))
    }

    async fn read_total_supply(&self) -> GatewayResult<Amount> {
        Ok(Amount::from_whole(10_000))
    }

    async fn read_accumulated_fees(&self) -> GatewayResult<AccumulatedFees> {
        Ok(PairAmounts::new(Amount::from_whole(40), Amount::from_whole(400)))
    }

    async fn read_lp_balance(&self, _holder: Address) -> GatewayResult<Amount> {
        unsynchronized()
    }

    async fn read_balances(&self, _holder: Address) -> GatewayResult<HolderBalances> {
        unsynchronized()
    }

    async fn authoritative_quote_swap(
        &self,
        _token_in: TokenSide,
        _amount_in: Amount,
        _token_out: TokenSide,
    ) -> GatewayResult<Amount> {
        unsynchronized()
    }

    async fn authoritative_required_paired(&self, _amount0: Amount) -> GatewayResult<Amount> {
        unsynchronized()
    }

    async fn authoritative_fee(&self, _amount_in: Amount) -> GatewayResult<Amount> {
        unsynchronized()
    }

    async fn authoritative_entitlement(&self, _holder: Address) -> GatewayResult<Entitlement> {
        unsynchronized()
    }
}

fn engine(healthy_reads: u64) -> QuotingEngine<ScriptedGateway> {
    let settings = EngineSettings {
        schedule: FeeSchedule::new(
            Fraction::from_decimal_str("0.003").unwrap(),
            Fraction::from_decimal_str("0.7").unwrap(),
        )
        .unwrap(),
        policy: RetryPolicy::FallbackOnce,
        accumulated_fee_estimate_rate: Fraction::from_decimal_str("0.05").unwrap(),
        max_snapshot_age: Duration::from_secs(30),
    };
    QuotingEngine::new(ScriptedGateway::new(healthy_reads), settings)
}

#[tokio::test]
async fn test_reports_every_refresh_until_shutdown() {
    let engine = engine(u64::MAX);
    let (stop, stopped) = oneshot::channel::<()>();
    let mut stop = Some(stop);
    let mut reports = 0;

    let stats = run_refresh_loop(
        &engine,
        Duration::from_millis(10),
        async move {
            let _ = stopped.await;
        },
        |overview| {
            assert_eq!(overview.reserves.token0, Amount::from_whole(1_000));
            assert!(!overview.accumulated_fees.is_approximate());
            reports += 1;
            if reports == 3 {
                if let Some(stop) = stop.take() {
                    let _ = stop.send(());
                }
            }
        },
    )
    .await;

    assert!(stats.succeeded >= 3);
    assert_eq!(stats.failed, 0);
    assert_eq!(reports as u64, stats.succeeded);
}

#[tokio::test]
async fn test_failed_refresh_keeps_last_snapshot() {
    let engine = engine(1);

    let stats = run_refresh_loop(
        &engine,
        Duration::from_millis(10),
        tokio::time::sleep(Duration::from_millis(100)),
        |_| {},
    )
    .await;

    assert_eq!(stats.succeeded, 1);
    assert!(stats.failed >= 1);

    let snapshot = engine.snapshot().expect("first refresh should be kept");
    assert_eq!(snapshot.reserves().token1, Amount::from_whole(10_000));

    // the fallback still quotes from the kept snapshot
    let fee = tokio_test::assert_ok!(engine.quote_fee(Amount::from_whole(100)).await);
    assert!(fee.is_approximate());
    assert_eq!(fee.value, Amount::from_decimal_str("0.3").unwrap());
}
