use std::{sync::Arc, time::Duration};

use ethers::{
    providers::Middleware,
    types::{Address, BlockNumber, U256},
};
use eyre::{eyre, Result};
use gammaswap_addresses::PoolRecord;
use gammaswap_create2::{pool_key, TokenPair};
use gammaswap_wrappers::wrappers::{
    erc20::ERC20,
    gamma_pool::GammaPool,
    gamma_pool_factory::{CreatePoolParams, GammaPoolFactory, PoolCreatedFilter},
    position_manager::{
        DepositNoPullFilter, DepositReserveFilter, DepositReservesParams, DepositWithdrawParams,
        PositionManager, WithdrawNoPullFilter, WithdrawReserveFilter, WithdrawReservesParams,
    },
    uniswap_v2_factory::{PairCreatedFilter, UniswapV2Factory},
    uniswap_v2_pair::UniswapV2Pair,
};
use tracing::info;

use crate::chain::{find_event, send_and_confirm};

/// An account that drives the AMM and the GammaSwap periphery. Every action
/// waits for its receipt and reads its result from the emitted event.
pub struct Agent<M> {
    client: Arc<M>,
    address: Address,
    deadline_secs: u64,
    wait: Duration,
}

impl<M: Middleware + 'static> Agent<M> {
    pub fn new(client: Arc<M>, address: Address, deadline_secs: u64, wait: Duration) -> Self {
        Self {
            client,
            address,
            deadline_secs,
            wait,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Periphery calls expire `deadline_secs` after the latest block.
    async fn deadline(&self) -> Result<U256> {
        let block = self
            .client
            .get_block(BlockNumber::Latest)
            .await?
            .ok_or_else(|| eyre!("the node didn't return the latest block"))?;
        Ok(block.timestamp + U256::from(self.deadline_secs))
    }

    /// AMM ///

    pub async fn create_pair(&self, factory: Address, pair: &TokenPair) -> Result<Address> {
        let receipt = send_and_confirm(
            "create pair",
            UniswapV2Factory::new(factory, self.client.clone())
                .create_pair(pair.token0(), pair.token1()),
            self.wait,
        )
        .await?;
        let event = find_event::<PairCreatedFilter>(&receipt, factory)?;
        info!(cfmm = ?event.pair, token0 = ?event.token_0, token1 = ?event.token_1, "created pair");
        Ok(event.pair)
    }

    /// Transfers both tokens into the pair and mints the liquidity to the
    /// agent. Returns the agent's LP token balance.
    pub async fn seed_reserves(
        &self,
        cfmm: Address,
        pair: &TokenPair,
        amounts: [U256; 2],
    ) -> Result<U256> {
        for (token, amount) in [pair.token0(), pair.token1()].into_iter().zip(amounts) {
            send_and_confirm(
                "transfer reserves",
                ERC20::new(token, self.client.clone()).transfer(cfmm, amount),
                self.wait,
            )
            .await?;
        }
        let cfmm_contract = UniswapV2Pair::new(cfmm, self.client.clone());
        send_and_confirm("mint liquidity", cfmm_contract.mint(self.address), self.wait).await?;
        let liquidity = cfmm_contract.balance_of(self.address).call().await?;
        info!(?cfmm, %liquidity, "seeded reserves");
        Ok(liquidity)
    }

    /// Pools ///

    pub async fn create_pool(
        &self,
        pool_factory: Address,
        protocol_id: u32,
        cfmm: Address,
        pair: &TokenPair,
    ) -> Result<PoolRecord> {
        let params = CreatePoolParams {
            cfmm,
            protocol_id,
            tokens: pair.to_vec(),
        };
        let receipt = send_and_confirm(
            "create pool",
            GammaPoolFactory::new(pool_factory, self.client.clone()).create_pool(params),
            self.wait,
        )
        .await?;
        let event = find_event::<PoolCreatedFilter>(&receipt, pool_factory)?;
        info!(pool = ?event.pool, ?cfmm, protocol_id, "created pool");
        Ok(PoolRecord {
            key: pool_key(cfmm, protocol_id)?,
            cfmm,
            protocol_id,
            pool: event.pool,
        })
    }

    /// Deposits reserve tokens through the position manager. Returns the
    /// pool shares minted.
    pub async fn deposit_reserves(
        &self,
        position_manager: Address,
        cfmm: Address,
        pair: &TokenPair,
        protocol_id: u32,
        amounts: [U256; 2],
    ) -> Result<U256> {
        for (token, amount) in [pair.token0(), pair.token1()].into_iter().zip(amounts) {
            send_and_confirm(
                "approve reserves",
                ERC20::new(token, self.client.clone()).approve(position_manager, amount),
                self.wait,
            )
            .await?;
        }
        let params = DepositReservesParams {
            cfmm,
            amounts_desired: amounts.to_vec(),
            amounts_min: vec![U256::zero(); 2],
            to: self.address,
            protocol_id,
            deadline: self.deadline().await?,
        };
        let receipt = send_and_confirm(
            "deposit reserves",
            PositionManager::new(position_manager, self.client.clone()).deposit_reserves(params),
            self.wait,
        )
        .await?;
        let event = find_event::<DepositReserveFilter>(&receipt, position_manager)?;
        info!(pool = ?event.pool, shares = %event.shares, "deposited reserves");
        Ok(event.shares)
    }

    /// Redeems pool shares for reserve tokens. Returns the assets withdrawn.
    pub async fn withdraw_reserves(
        &self,
        position_manager: Address,
        pool: Address,
        cfmm: Address,
        protocol_id: u32,
        shares: U256,
    ) -> Result<U256> {
        send_and_confirm(
            "approve shares",
            GammaPool::new(pool, self.client.clone()).approve(position_manager, shares),
            self.wait,
        )
        .await?;
        let params = WithdrawReservesParams {
            cfmm,
            amount: shares,
            amounts_min: vec![U256::zero(); 2],
            to: self.address,
            protocol_id,
            deadline: self.deadline().await?,
        };
        let receipt = send_and_confirm(
            "withdraw reserves",
            PositionManager::new(position_manager, self.client.clone()).withdraw_reserves(params),
            self.wait,
        )
        .await?;
        let event = find_event::<WithdrawReserveFilter>(&receipt, position_manager)?;
        info!(?pool, assets = %event.assets, "withdrew reserves");
        Ok(event.assets)
    }

    /// Sends LP tokens to the pool and deposits them without an allowance.
    /// Returns the pool shares minted.
    pub async fn deposit_lp_tokens(
        &self,
        position_manager: Address,
        pool: Address,
        cfmm: Address,
        protocol_id: u32,
        lp_tokens: U256,
    ) -> Result<U256> {
        send_and_confirm(
            "transfer lp tokens",
            UniswapV2Pair::new(cfmm, self.client.clone()).transfer(pool, lp_tokens),
            self.wait,
        )
        .await?;
        let params = DepositWithdrawParams {
            cfmm,
            lp_tokens,
            to: self.address,
            protocol_id,
            deadline: self.deadline().await?,
        };
        let receipt = send_and_confirm(
            "deposit lp tokens",
            PositionManager::new(position_manager, self.client.clone()).deposit_no_pull(params),
            self.wait,
        )
        .await?;
        let event = find_event::<DepositNoPullFilter>(&receipt, position_manager)?;
        info!(?pool, shares = %event.shares, "deposited lp tokens");
        Ok(event.shares)
    }

    /// Sends pool shares back to the pool and withdraws them as LP tokens.
    /// Returns the LP tokens withdrawn.
    pub async fn withdraw_lp_tokens(
        &self,
        position_manager: Address,
        pool: Address,
        cfmm: Address,
        protocol_id: u32,
        shares: U256,
    ) -> Result<U256> {
        send_and_confirm(
            "transfer shares",
            GammaPool::new(pool, self.client.clone()).transfer(pool, shares),
            self.wait,
        )
        .await?;
        let params = DepositWithdrawParams {
            cfmm,
            lp_tokens: shares,
            to: self.address,
            protocol_id,
            deadline: self.deadline().await?,
        };
        let receipt = send_and_confirm(
            "withdraw lp tokens",
            PositionManager::new(position_manager, self.client.clone()).withdraw_no_pull(params),
            self.wait,
        )
        .await?;
        let event = find_event::<WithdrawNoPullFilter>(&receipt, position_manager)?;
        info!(?pool, assets = %event.assets, "withdrew lp tokens");
        Ok(event.assets)
    }
}
