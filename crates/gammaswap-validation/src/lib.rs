//! Validation of caller-supplied pools.
//!
//! Nothing a caller says about a pool's identity is trusted: constant product
//! CFMMs are checked by re-deriving their CREATE2 address from the protocol's
//! factory and init code hash, and weighted pools by re-reading their
//! configuration from the chain.

mod cfmm;
mod error;
#[cfg(test)]
mod mock;
mod reader;
mod weighted;

pub use cfmm::{CfmmProtocol, CfmmValidator, SaltRule, ValidatedCfmm};
pub use error::{Result, ValidationError};
pub use reader::{ChainReader, RpcReader, WeightedPoolState};
pub use weighted::{ValidatedWeightedPool, WeightedPoolParams, WeightedPoolValidator};
