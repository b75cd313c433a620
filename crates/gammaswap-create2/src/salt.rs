use ethers::{
    abi::{encode, Token},
    types::{Address, H256, U256},
    utils::keccak256,
};

use crate::{
    constants::MAX_PROTOCOL_ID,
    derive::calc_address,
    error::{Create2Error, Result},
    pair::TokenPair,
};

/// Identifies a GammaSwap pool. It is both the registry key in the pool
/// factory and the CREATE2 salt the factory deploys the pool with.
pub type PoolKey = H256;

/// `keccak256(abi.encode(cfmm, protocolId))`.
pub fn pool_key(cfmm: Address, protocol_id: u32) -> Result<PoolKey> {
    if protocol_id > MAX_PROTOCOL_ID {
        return Err(Create2Error::ProtocolIdOverflow(protocol_id));
    }
    let encoded = encode(&[Token::Address(cfmm), Token::Uint(U256::from(protocol_id))]);
    Ok(H256(keccak256(encoded)))
}

/// `keccak256(abi.encodePacked(token0, token1))`, the salt a constant
/// product factory uses in `createPair`.
pub fn pair_salt(pair: &TokenPair) -> H256 {
    H256(keccak256(
        [pair.token0().as_bytes(), pair.token1().as_bytes()].concat(),
    ))
}

/// The address a constant product factory assigns to `pair`.
pub fn pair_address(factory: Address, pair: &TokenPair, init_code_hash: H256) -> Address {
    calc_address(factory, pair_salt(pair), init_code_hash)
}

/// The address a pool factory assigns to the pool for `(cfmm, protocol_id)`.
pub fn pool_address(
    factory: Address,
    cfmm: Address,
    protocol_id: u32,
    init_code_hash: H256,
) -> Result<Address> {
    Ok(calc_address(
        factory,
        pool_key(cfmm, protocol_id)?,
        init_code_hash,
    ))
}
