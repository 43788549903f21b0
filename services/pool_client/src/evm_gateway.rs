//! Settlement gateway over an EVM JSON-RPC endpoint
//!
//! Reads and computed quotes go to the deployed pool and token contracts.
//! Every call is bounded by the configured request timeout; an elapsed
//! timeout is reported the same way as a transport failure.

use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::contract::{abigen, ContractError};
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{Address, U256};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tidepool_amm::{GatewayError, GatewayResult, SettlementGateway};
use tidepool_config::ClientConfig;
use tidepool_types::{
    AccumulatedFees, Amount, Entitlement, HolderBalances, PairAmounts, TokenSide,
};
use tokio::time::timeout;
use tracing::{debug, info};
use url::Url;

abigen!(
    PoolContract,
    r#"[
        function getAmountOut(address tokenIn, uint256 amountIn, address tokenOut) external view returns (uint256)
        function getRequiredAmount1(uint256 amount0) external view returns (uint256)
        function calculateFee(uint256 amountIn) external view returns (uint256)
        function estimateRewards(address user) external view returns (uint256, uint256)
        function getAccumulatedFees() external view returns (uint256, uint256)
        function totalSupply() external view returns (uint256)
        function balanceOf(address account) external view returns (uint256)
    ]"#
);

abigen!(
    Erc20Token,
    r#"[
        function balanceOf(address account) external view returns (uint256)
    ]"#
);

/// Node error text for a block the node has not imported yet
const NOT_SYNCHRONIZED_MARKER: &str = "invalid block tag";

type Client = Provider<Http>;

/// [`SettlementGateway`] backed by the pool's deployed contracts
pub struct EvmGateway {
    pool: PoolContract<Client>,
    token0: Erc20Token<Client>,
    token1: Erc20Token<Client>,
    pool_address: Address,
    request_timeout: Duration,
}

impl EvmGateway {
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let url: Url = config
            .network
            .rpc_url
            .parse()
            .context("Invalid RPC URL")?;
        let provider = Arc::new(Provider::new(Http::new(url)));

        info!(
            "🌐 Connecting to pool {:?} via {}",
            config.contracts.pool, config.network.rpc_url
        );

        Ok(Self {
            pool: PoolContract::new(config.contracts.pool, Arc::clone(&provider)),
            token0: Erc20Token::new(config.contracts.token0, Arc::clone(&provider)),
            token1: Erc20Token::new(config.contracts.token1, provider),
            pool_address: config.contracts.pool,
            request_timeout: config.request_timeout(),
        })
    }

    fn token_address(&self, side: TokenSide) -> Address {
        match side {
            TokenSide::Token0 => self.token0.address(),
            TokenSide::Token1 => self.token1.address(),
        }
    }

    /// Await a contract call under the request timeout
    async fn bounded<T, F>(&self, call: &'static str, future: F) -> GatewayResult<T>
    where
        F: Future<Output = std::result::Result<T, ContractError<Client>>>,
    {
        match timeout(self.request_timeout, future).await {
            Ok(result) => result.map_err(|e| {
                let error = classify_contract_error(e);
                debug!(call, %error, "contract call failed");
                error
            }),
            Err(_) => Err(GatewayError::Unavailable(format!(
                "{call} timed out after {}s",
                self.request_timeout.as_secs()
            ))),
        }
    }

    async fn token_balance(&self, side: TokenSide, holder: Address) -> GatewayResult<Amount> {
        let token = match side {
            TokenSide::Token0 => &self.token0,
            TokenSide::Token1 => &self.token1,
        };
        let call = token.balance_of(holder);
        self.bounded("balanceOf", call.call())
            .await
            .map(Amount::from_raw)
    }
}

#[async_trait]
impl SettlementGateway for EvmGateway {
    async fn read_reserves(&self) -> GatewayResult<PairAmounts> {
        let (reserve0, reserve1) = futures::try_join!(
            self.token_balance(TokenSide::Token0, self.pool_address),
            self.token_balance(TokenSide::Token1, self.pool_address),
        )?;
        Ok(PairAmounts::new(reserve0, reserve1))
    }

    async fn read_total_supply(&self) -> GatewayResult<Amount> {
        let call = self.pool.total_supply();
        self.bounded("totalSupply", call.call())
            .await
            .map(Amount::from_raw)
    }

    async fn read_accumulated_fees(&self) -> GatewayResult<AccumulatedFees> {
        let call = self.pool.get_accumulated_fees();
        let (fees0, fees1) = self.bounded("getAccumulatedFees", call.call()).await?;
        Ok(PairAmounts::new(Amount::from_raw(fees0), Amount::from_raw(fees1)))
    }

    async fn read_lp_balance(&self, holder: Address) -> GatewayResult<Amount> {
        let call = self.pool.balance_of(holder);
        self.bounded("balanceOf", call.call())
            .await
            .map(Amount::from_raw)
    }

    async fn read_balances(&self, holder: Address) -> GatewayResult<HolderBalances> {
        let (token0, token1, lp) = futures::try_join!(
            self.token_balance(TokenSide::Token0, holder),
            self.token_balance(TokenSide::Token1, holder),
            self.read_lp_balance(holder),
        )?;
        Ok(HolderBalances { token0, token1, lp })
    }

    async fn authoritative_quote_swap(
        &self,
        token_in: TokenSide,
        amount_in: Amount,
        token_out: TokenSide,
    ) -> GatewayResult<Amount> {
        let call = self.pool.get_amount_out(
            self.token_address(token_in),
            amount_in.raw(),
            self.token_address(token_out),
        );
        self.bounded("getAmountOut", call.call())
            .await
            .map(Amount::from_raw)
    }

    async fn authoritative_required_paired(&self, amount0: Amount) -> GatewayResult<Amount> {
        // by name: generated identifiers for trailing digits vary between abigen releases
        let call = self
            .pool
            .method::<_, U256>("getRequiredAmount1", amount0.raw())
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;
        self.bounded("getRequiredAmount1", call.call())
            .await
            .map(Amount::from_raw)
    }

    async fn authoritative_fee(&self, amount_in: Amount) -> GatewayResult<Amount> {
        let call = self.pool.calculate_fee(amount_in.raw());
        self.bounded("calculateFee", call.call())
            .await
            .map(Amount::from_raw)
    }

    async fn authoritative_entitlement(&self, holder: Address) -> GatewayResult<Entitlement> {
        let call = self.pool.estimate_rewards(holder);
        let (reward0, reward1) = self.bounded("estimateRewards", call.call()).await?;
        Ok(PairAmounts::new(
            Amount::from_raw(reward0),
            Amount::from_raw(reward1),
        ))
    }
}

/// Map a contract call failure onto the gateway taxonomy
pub fn classify_contract_error<M: Middleware>(error: ContractError<M>) -> GatewayError {
    let reverted = matches!(error, ContractError::Revert(_));
    let malformed = matches!(
        error,
        ContractError::DecodingError(_)
            | ContractError::DetokenizationError(_)
            | ContractError::AbiError(_)
    );
    classify_message(error.to_string(), reverted, malformed)
}

/// Classification on the rendered error, for failures with no typed variant
pub fn classify_message(message: String, reverted: bool, malformed: bool) -> GatewayError {
    if message.contains(NOT_SYNCHRONIZED_MARKER) {
        GatewayError::NotSynchronized
    } else if reverted {
        GatewayError::Rejected(message)
    } else if malformed {
        GatewayError::Malformed(message)
    } else {
        GatewayError::Unavailable(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::Bytes;

    #[test]
    fn test_block_tag_error_is_not_synchronized() {
        let error = classify_message(
            "(code: -32000, message: invalid block tag 0x1f, data: None)".to_string(),
            false,
            false,
        );
        assert_eq!(error, GatewayError::NotSynchronized);
        assert!(error.is_transient());
    }

    #[test]
    fn test_revert_is_rejected() {
        let error = classify_contract_error(ContractError::<Client>::Revert(Bytes::default()));
        assert!(matches!(error, GatewayError::Rejected(_)));
        assert!(!error.is_transient());
    }

    #[test]
    fn test_transport_failure_is_unavailable() {
        let error = classify_message("connection refused".to_string(), false, false);
        assert_eq!(
            error,
            GatewayError::Unavailable("connection refused".to_string())
        );
    }

    #[test]
    fn test_decode_failure_is_malformed() {
        let error = classify_message("bad output".to_string(), false, true);
        assert!(matches!(error, GatewayError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_unreachable_node_reports_unavailable() {
        let mut config = ClientConfig::default();
        // reserved port, nothing listens there
        config.network.rpc_url = "http://127.0.0.1:9".to_string();
        config.network.request_timeout_secs = 2;

        let gateway = EvmGateway::connect(&config).unwrap();
        let error = gateway.read_total_supply().await.unwrap_err();
        assert!(error.is_transient());
    }
}
