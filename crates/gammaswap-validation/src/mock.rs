//! An in-memory chain for exercising the validators without a node.

use std::collections::HashMap;

use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256};
use gammaswap_create2::{pair_address, TokenPair};

use crate::{
    error::{Result, ValidationError},
    reader::{ChainReader, WeightedPoolState},
};

#[derive(Default)]
pub struct MockChain {
    code: HashMap<Address, Bytes>,
    pairs: HashMap<Address, (Address, Address)>,
    decimals: HashMap<Address, u8>,
    weighted_pools: HashMap<Address, WeightedPoolState>,
    vault_tokens: HashMap<(Address, H256), Vec<Address>>,
}

impl MockChain {
    pub fn add_token(&mut self, token: Address, decimals: u8) {
        self.code.insert(token, Bytes::from(vec![0x60, 0x80]));
        self.decimals.insert(token, decimals);
    }

    /// Creates a pair the way a constant product factory would and returns
    /// its address.
    pub fn create_pair(&mut self, factory: Address, init_code_hash: H256, pair: TokenPair) -> Address {
        let address = pair_address(factory, &pair, init_code_hash);
        self.code.insert(address, Bytes::from(vec![0x60, 0x80]));
        self.pairs.insert(address, (pair.token0(), pair.token1()));
        address
    }

    /// Registers a contract at an arbitrary address that reports the given
    /// tokens.
    pub fn add_impostor_pair(&mut self, address: Address, token0: Address, token1: Address) {
        self.code.insert(address, Bytes::from(vec![0x60, 0x80]));
        self.pairs.insert(address, (token0, token1));
    }

    pub fn add_weighted_pool(&mut self, pool: Address, state: WeightedPoolState, tokens: Vec<Address>) {
        self.code.insert(pool, Bytes::from(vec![0x60, 0x80]));
        self.vault_tokens.insert((state.vault, state.pool_id), tokens);
        self.weighted_pools.insert(pool, state);
    }
}

fn reverted() -> ValidationError {
    ValidationError::Rpc("execution reverted".to_string())
}

#[async_trait]
impl ChainReader for MockChain {
    async fn code_at(&self, address: Address) -> Result<Bytes> {
        Ok(self.code.get(&address).cloned().unwrap_or_default())
    }

    async fn pair_tokens(&self, cfmm: Address) -> Result<(Address, Address)> {
        self.pairs.get(&cfmm).copied().ok_or_else(reverted)
    }

    async fn decimals(&self, token: Address) -> Result<u8> {
        self.decimals.get(&token).copied().ok_or_else(reverted)
    }

    async fn weighted_pool(&self, pool: Address) -> Result<WeightedPoolState> {
        self.weighted_pools.get(&pool).cloned().ok_or_else(reverted)
    }

    async fn vault_pool_tokens(&self, vault: Address, pool_id: H256) -> Result<Vec<Address>> {
        self.vault_tokens
            .get(&(vault, pool_id))
            .cloned()
            .ok_or_else(reverted)
    }
}
