//! In-memory settlement gateway for engine tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;
use tidepool_amm::{
    EngineSettings, GatewayError, GatewayResult, QuotingEngine, RetryPolicy, SettlementGateway,
};
use tidepool_types::{
    AccumulatedFees, Address, Amount, Entitlement, FeeSchedule, Fraction, HolderBalances,
    PairAmounts, TokenSide,
};

pub fn amount(s: &str) -> Amount {
    Amount::from_decimal_str(s).unwrap()
}

pub fn fraction(s: &str) -> Fraction {
    Fraction::from_decimal_str(s).unwrap()
}

/// Which computed-quote calls currently fail, and how
#[derive(Debug, Clone, Default)]
pub struct Failures {
    pub quotes: Option<GatewayError>,
    pub accumulated_fees: Option<GatewayError>,
    pub reserves: Option<GatewayError>,
}

/// Pool state served by [`MockGateway`]
#[derive(Debug, Clone)]
pub struct MockPool {
    pub reserves: PairAmounts,
    pub total_supply: Amount,
    pub accumulated_fees: AccumulatedFees,
    pub lp_balance: Amount,
    pub entitlement: Entitlement,
    pub swap_output: Amount,
    pub fee: Amount,
    pub paired: Amount,
}

impl Default for MockPool {
    fn default() -> Self {
        Self {
            reserves: PairAmounts::new(amount("1000"), amount("10000")),
            total_supply: amount("10000"),
            accumulated_fees: PairAmounts::new(amount("40"), amount("400")),
            lp_balance: amount("2500"),
            entitlement: PairAmounts::new(amount("6.5"), amount("65")),
            swap_output: amount("906"),
            fee: amount("0.3"),
            paired: amount("500"),
        }
    }
}

#[derive(Default)]
pub struct MockGateway {
    pub pool: Mutex<MockPool>,
    pub failures: Mutex<Failures>,
    pub computed_calls: Mutex<u32>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_quotes(&self, error: GatewayError) {
        self.failures.lock().quotes = Some(error);
    }

    pub fn fail_accumulated_fees(&self, error: GatewayError) {
        self.failures.lock().accumulated_fees = Some(error);
    }

    pub fn fail_reserves(&self, error: GatewayError) {
        self.failures.lock().reserves = Some(error);
    }

    pub fn set_total_supply(&self, supply: Amount) {
        self.pool.lock().total_supply = supply;
    }

    pub fn computed_calls(&self) -> u32 {
        *self.computed_calls.lock()
    }

    fn computed<T>(&self, value: T) -> GatewayResult<T> {
        *self.computed_calls.lock() += 1;
        match self.failures.lock().quotes.clone() {
            Some(error) => Err(error),
            None => Ok(value),
        }
    }
}

#[async_trait]
impl SettlementGateway for MockGateway {
    async fn read_reserves(&self) -> GatewayResult<PairAmounts> {
        match self.failures.lock().reserves.clone() {
            Some(error) => Err(error),
            None => Ok(self.pool.lock().reserves),
        }
    }

    async fn read_total_supply(&self) -> GatewayResult<Amount> {
        Ok(self.pool.lock().total_supply)
    }

    async fn read_accumulated_fees(&self) -> GatewayResult<AccumulatedFees> {
        match self.failures.lock().accumulated_fees.clone() {
            Some(error) => Err(error),
            None => Ok(self.pool.lock().accumulated_fees),
        }
    }

    async fn read_lp_balance(&self, _holder: Address) -> GatewayResult<Amount> {
        Ok(self.pool.lock().lp_balance)
    }

    async fn read_balances(&self, _holder: Address) -> GatewayResult<HolderBalances> {
        let pool = self.pool.lock();
        Ok(HolderBalances {
            token0: amount("12"),
            token1: amount("34"),
            lp: pool.lp_balance,
        })
    }

    async fn authoritative_quote_swap(
        &self,
        _token_in: TokenSide,
        _amount_in: Amount,
        _token_out: TokenSide,
    ) -> GatewayResult<Amount> {
        let output = self.pool.lock().swap_output;
        self.computed(output)
    }

    async fn authoritative_required_paired(&self, _amount0: Amount) -> GatewayResult<Amount> {
        let paired = self.pool.lock().paired;
        self.computed(paired)
    }

    async fn authoritative_fee(&self, _amount_in: Amount) -> GatewayResult<Amount> {
        let fee = self.pool.lock().fee;
        self.computed(fee)
    }

    async fn authoritative_entitlement(&self, _holder: Address) -> GatewayResult<Entitlement> {
        let entitlement = self.pool.lock().entitlement;
        self.computed(entitlement)
    }
}

pub fn settings(policy: RetryPolicy) -> EngineSettings {
    EngineSettings {
        schedule: FeeSchedule::new(fraction("0.003"), fraction("0.7")).unwrap(),
        policy,
        accumulated_fee_estimate_rate: fraction("0.05"),
        max_snapshot_age: Duration::from_secs(30),
    }
}

pub fn engine(policy: RetryPolicy) -> QuotingEngine<MockGateway> {
    QuotingEngine::new(MockGateway::new(), settings(policy))
}

pub fn engine_with_max_age(policy: RetryPolicy, max_age: Duration) -> QuotingEngine<MockGateway> {
    let settings = EngineSettings {
        max_snapshot_age: max_age,
        ..settings(policy)
    };
    QuotingEngine::new(MockGateway::new(), settings)
}
