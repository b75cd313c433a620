use ethers::types::Address;
use thiserror::Error;

/// Errors raised while deriving pool addresses or canonicalizing their
/// inputs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Create2Error {
    #[error("invalid {field} length: expected {expected} bytes, got {actual}")]
    InvalidInputLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid hex in {field}: {reason}")]
    InvalidHex { field: &'static str, reason: String },

    #[error("token pair contains the zero address")]
    ZeroAddress,

    #[error("token pair contains identical addresses: {0:?}")]
    IdenticalAddresses(Address),

    #[error("protocol id {0} does not fit in 24 bits")]
    ProtocolIdOverflow(u32),
}

pub type Result<T> = std::result::Result<T, Create2Error>;
