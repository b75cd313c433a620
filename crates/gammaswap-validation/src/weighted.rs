use ethers::types::{Address, H256, U256};
use tracing::{debug, warn};

use crate::{
    error::{Result, ValidationError},
    reader::ChainReader,
};

/// What the caller believes a weighted pool is configured with. Weights are
/// listed in the pool's token order, which is ascending by address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightedPoolParams {
    pub vault: Address,
    pub pool_id: H256,
    pub weights: Vec<U256>,
    pub swap_fee: U256,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedWeightedPool {
    pub pool: Address,
    pub tokens: Vec<Address>,
    pub decimals: Vec<u8>,
}

fn mismatch(pool: Address, error: ValidationError) -> ValidationError {
    warn!(?pool, %error, "weighted pool doesn't match its metadata");
    error
}

/// Validates weighted pools by comparing caller-supplied metadata with the
/// configuration read from the pool and its vault.
pub struct WeightedPoolValidator<R> {
    reader: R,
}

impl<R: ChainReader> WeightedPoolValidator<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub async fn validate(
        &self,
        expected_tokens: &[Address],
        pool: Address,
        params: &WeightedPoolParams,
    ) -> Result<ValidatedWeightedPool> {
        if self.reader.code_at(pool).await?.is_empty() {
            return Err(ValidationError::NotContract(pool));
        }

        let state = self.reader.weighted_pool(pool).await?;
        if state.vault != params.vault {
            return Err(mismatch(pool, ValidationError::IncorrectVault));
        }
        if state.pool_id != params.pool_id {
            return Err(mismatch(pool, ValidationError::IncorrectPoolId));
        }

        let tokens = self
            .reader
            .vault_pool_tokens(state.vault, state.pool_id)
            .await?;
        if tokens.len() != expected_tokens.len() {
            return Err(mismatch(
                pool,
                ValidationError::IncorrectTokenLength {
                    expected: expected_tokens.len(),
                    actual: tokens.len(),
                },
            ));
        }
        let mut sorted = expected_tokens.to_vec();
        sorted.sort();
        if sorted != tokens {
            return Err(mismatch(pool, ValidationError::IncorrectTokens));
        }

        if state.weights != params.weights {
            return Err(mismatch(pool, ValidationError::IncorrectWeights));
        }
        if state.swap_fee != params.swap_fee {
            return Err(mismatch(pool, ValidationError::IncorrectSwapFee));
        }

        let mut decimals = Vec::with_capacity(tokens.len());
        for token in &tokens {
            decimals.push(self.reader.decimals(*token).await?);
        }
        debug!(?pool, pool_id = ?state.pool_id, "validated weighted pool");

        Ok(ValidatedWeightedPool {
            pool,
            tokens,
            decimals,
        })
    }
}
