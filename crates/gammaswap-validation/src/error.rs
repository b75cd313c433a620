use ethers::types::Address;
use gammaswap_create2::Create2Error;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no contract is deployed at {0:?}")]
    NotContract(Address),

    #[error("{0:?} was not created by the expected factory for these tokens")]
    BadProtocol(Address),

    #[error("expected {expected} tokens, got {actual}")]
    IncorrectTokenLength { expected: usize, actual: usize },

    #[error("pool tokens don't match the expected tokens")]
    IncorrectTokens,

    #[error("pool id doesn't match")]
    IncorrectPoolId,

    #[error("pool is registered with a different vault")]
    IncorrectVault,

    #[error("swap fee doesn't match")]
    IncorrectSwapFee,

    #[error("normalized weights don't match")]
    IncorrectWeights,

    #[error(transparent)]
    InvalidInput(#[from] Create2Error),

    #[error("rpc error: {0}")]
    Rpc(String),
}

pub type Result<T> = std::result::Result<T, ValidationError>;
