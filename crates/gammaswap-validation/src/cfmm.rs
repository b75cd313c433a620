use ethers::types::{Address, H256};
use gammaswap_create2::{calc_address, pair_salt, pool_key, TokenPair, UNISWAP_V2_INIT_CODE_HASH};
use tracing::{debug, warn};

use crate::{
    error::{Result, ValidationError},
    reader::ChainReader,
};

/// How a protocol's factory salts the CREATE2 deployment of a CFMM.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SaltRule {
    /// `keccak256(abi.encodePacked(token0, token1))`, as constant product
    /// factories do.
    #[default]
    TokenPair,
    /// `keccak256(abi.encode(cfmm, protocolId))`.
    PoolKey,
}

/// The trusted description of an AMM protocol that claimed CFMMs are checked
/// against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CfmmProtocol {
    pub protocol_id: u32,
    pub factory: Address,
    pub init_code_hash: H256,
    pub salt_rule: SaltRule,
}

impl CfmmProtocol {
    pub fn new(protocol_id: u32, factory: Address, init_code_hash: H256) -> Self {
        Self {
            protocol_id,
            factory,
            init_code_hash,
            salt_rule: SaltRule::default(),
        }
    }

    /// A Uniswap V2 style protocol using the canonical pair init code hash.
    pub fn uniswap_v2(protocol_id: u32, factory: Address) -> Self {
        Self::new(protocol_id, factory, UNISWAP_V2_INIT_CODE_HASH)
    }

    pub fn with_salt_rule(mut self, salt_rule: SaltRule) -> Self {
        self.salt_rule = salt_rule;
        self
    }

    pub fn salt(&self, pair: &TokenPair, cfmm: Address) -> Result<H256> {
        match self.salt_rule {
            SaltRule::TokenPair => Ok(pair_salt(pair)),
            SaltRule::PoolKey => Ok(pool_key(cfmm, self.protocol_id)?),
        }
    }

    /// The address this protocol's factory would have given the CFMM.
    pub fn expected_address(&self, pair: &TokenPair, cfmm: Address) -> Result<Address> {
        Ok(calc_address(
            self.factory,
            self.salt(pair, cfmm)?,
            self.init_code_hash,
        ))
    }
}

/// A CFMM that passed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidatedCfmm {
    pub cfmm: Address,
    pub tokens: TokenPair,
    pub decimals: [u8; 2],
}

/// Validates caller-supplied CFMMs by re-deriving their address from the
/// protocol's factory and init code hash instead of trusting it.
pub struct CfmmValidator<R> {
    reader: R,
    protocol: CfmmProtocol,
}

impl<R: ChainReader> CfmmValidator<R> {
    pub fn new(reader: R, protocol: CfmmProtocol) -> Self {
        Self { reader, protocol }
    }

    pub fn protocol(&self) -> &CfmmProtocol {
        &self.protocol
    }

    /// Checks that `cfmm` is the pair the protocol's factory creates for
    /// `expected_tokens`. The tokens may be given in any order.
    pub async fn validate(
        &self,
        expected_tokens: &[Address],
        cfmm: Address,
    ) -> Result<ValidatedCfmm> {
        if self.reader.code_at(cfmm).await?.is_empty() {
            warn!(?cfmm, "cfmm has no code");
            return Err(ValidationError::NotContract(cfmm));
        }

        let (token_a, token_b) = match expected_tokens {
            [token_a, token_b] => (*token_a, *token_b),
            _ => {
                return Err(ValidationError::IncorrectTokenLength {
                    expected: 2,
                    actual: expected_tokens.len(),
                })
            }
        };
        let tokens = TokenPair::new(token_a, token_b)?;

        // The address is checked before anything is called on the contract,
        // which may not be a pair at all.
        let expected = self.protocol.expected_address(&tokens, cfmm)?;
        if expected != cfmm {
            warn!(
                ?cfmm,
                ?expected,
                factory = ?self.protocol.factory,
                init_code_hash = ?self.protocol.init_code_hash,
                "cfmm doesn't match the protocol"
            );
            return Err(ValidationError::BadProtocol(cfmm));
        }
        let pool_tokens = self.reader.pair_tokens(cfmm).await?;
        if pool_tokens != (tokens.token0(), tokens.token1()) {
            warn!(?cfmm, reported = ?pool_tokens, "cfmm reports other tokens");
            return Err(ValidationError::BadProtocol(cfmm));
        }

        let decimals = [
            self.reader.decimals(tokens.token0()).await?,
            self.reader.decimals(tokens.token1()).await?,
        ];
        debug!(?cfmm, token0 = ?tokens.token0(), token1 = ?tokens.token1(), "validated cfmm");

        Ok(ValidatedCfmm {
            cfmm,
            tokens,
            decimals,
        })
    }
}
