use std::sync::Arc;

use async_trait::async_trait;
use ethers::{
    providers::Middleware,
    types::{Address, Bytes, H256, U256},
};
use gammaswap_wrappers::wrappers::{
    balancer_vault::BalancerVault, erc20::ERC20, uniswap_v2_pair::UniswapV2Pair,
    weighted_pool::WeightedPool,
};

use crate::error::{Result, ValidationError};

/// The configuration a weighted pool reports about itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WeightedPoolState {
    pub vault: Address,
    pub pool_id: H256,
    pub weights: Vec<U256>,
    pub swap_fee: U256,
}

/// The read-only chain queries the validators depend on.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// The runtime bytecode at an address. Empty if nothing is deployed.
    async fn code_at(&self, address: Address) -> Result<Bytes>;

    /// The `(token0, token1)` a constant product pair reports.
    async fn pair_tokens(&self, cfmm: Address) -> Result<(Address, Address)>;

    async fn decimals(&self, token: Address) -> Result<u8>;

    async fn weighted_pool(&self, pool: Address) -> Result<WeightedPoolState>;

    /// The tokens a vault holds for a pool id, in the vault's order.
    async fn vault_pool_tokens(&self, vault: Address, pool_id: H256) -> Result<Vec<Address>>;
}

/// A [`ChainReader`] backed by an ethers middleware.
#[derive(Debug)]
pub struct RpcReader<M> {
    client: Arc<M>,
}

impl<M> Clone for RpcReader<M> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

impl<M: Middleware + 'static> RpcReader<M> {
    pub fn new(client: Arc<M>) -> Self {
        Self { client }
    }
}

fn rpc<E: std::fmt::Display>(error: E) -> ValidationError {
    ValidationError::Rpc(error.to_string())
}

#[async_trait]
impl<M: Middleware + 'static> ChainReader for RpcReader<M> {
    async fn code_at(&self, address: Address) -> Result<Bytes> {
        self.client.get_code(address, None).await.map_err(rpc)
    }

    async fn pair_tokens(&self, cfmm: Address) -> Result<(Address, Address)> {
        let pair = UniswapV2Pair::new(cfmm, self.client.clone());
        let token0 = pair.token_0().call().await.map_err(rpc)?;
        let token1 = pair.token_1().call().await.map_err(rpc)?;
        Ok((token0, token1))
    }

    async fn decimals(&self, token: Address) -> Result<u8> {
        ERC20::new(token, self.client.clone())
            .decimals()
            .call()
            .await
            .map_err(rpc)
    }

    async fn weighted_pool(&self, pool: Address) -> Result<WeightedPoolState> {
        let pool = WeightedPool::new(pool, self.client.clone());
        Ok(WeightedPoolState {
            vault: pool.get_vault().call().await.map_err(rpc)?,
            pool_id: H256(pool.get_pool_id().call().await.map_err(rpc)?),
            weights: pool.get_normalized_weights().call().await.map_err(rpc)?,
            swap_fee: pool.get_swap_fee_percentage().call().await.map_err(rpc)?,
        })
    }

    async fn vault_pool_tokens(&self, vault: Address, pool_id: H256) -> Result<Vec<Address>> {
        let (tokens, _, _) = BalancerVault::new(vault, self.client.clone())
            .get_pool_tokens(pool_id.0)
            .call()
            .await
            .map_err(rpc)?;
        Ok(tokens)
    }
}

#[async_trait]
impl<R: ChainReader + ?Sized> ChainReader for Arc<R> {
    async fn code_at(&self, address: Address) -> Result<Bytes> {
        (**self).code_at(address).await
    }

    async fn pair_tokens(&self, cfmm: Address) -> Result<(Address, Address)> {
        (**self).pair_tokens(cfmm).await
    }

    async fn decimals(&self, token: Address) -> Result<u8> {
        (**self).decimals(token).await
    }

    async fn weighted_pool(&self, pool: Address) -> Result<WeightedPoolState> {
        (**self).weighted_pool(pool).await
    }

    async fn vault_pool_tokens(&self, vault: Address, pool_id: H256) -> Result<Vec<Address>> {
        (**self).vault_pool_tokens(vault, pool_id).await
    }
}
