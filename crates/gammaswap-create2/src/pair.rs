use ethers::types::Address;

use crate::error::{Create2Error, Result};

/// Two distinct, non-zero token addresses in canonical order, i.e.
/// `token0 < token1` when compared as big-endian integers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenPair {
    token0: Address,
    token1: Address,
}

impl TokenPair {
    /// Canonicalizes an unordered pair of tokens.
    pub fn new(token_a: Address, token_b: Address) -> Result<Self> {
        if token_a == token_b {
            return Err(Create2Error::IdenticalAddresses(token_a));
        }
        // `H160` orders byte-wise, which is numeric order for big-endian
        // addresses.
        let (token0, token1) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        if token0.is_zero() {
            return Err(Create2Error::ZeroAddress);
        }
        Ok(Self { token0, token1 })
    }

    pub fn token0(&self) -> Address {
        self.token0
    }

    pub fn token1(&self) -> Address {
        self.token1
    }

    pub fn to_vec(&self) -> Vec<Address> {
        vec![self.token0, self.token1]
    }

    pub fn contains(&self, token: Address) -> bool {
        self.token0 == token || self.token1 == token
    }
}

/// Sorts two tokens the way a constant-product factory does.
pub fn sort_tokens(token_a: Address, token_b: Address) -> Result<(Address, Address)> {
    let pair = TokenPair::new(token_a, token_b)?;
    Ok((pair.token0, pair.token1))
}
