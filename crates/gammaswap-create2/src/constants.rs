use ethers::types::{Address, H160, H256};
use hex_literal::hex;

/// The leading byte of every CREATE2 preimage.
pub const CREATE2_PREFIX: u8 = 0xff;

/// Protocol ids are `uint24` on chain.
pub const MAX_PROTOCOL_ID: u32 = 0x00ff_ffff;

// The init code hashes below are the keccak256 of the pair creation code that
// each factory deploys with CREATE2. They are constant for a given factory
// version and act as the trust anchor when validating a claimed pair.

/// Uniswap V2 pair init code hash.
pub const UNISWAP_V2_INIT_CODE_HASH: H256 = H256(hex!(
    "96e8ac4277198ff8b6f785478aa9a39f403cb768dd02cbee326c3e7da348845f"
));

/// SushiSwap pair init code hash.
pub const SUSHISWAP_INIT_CODE_HASH: H256 = H256(hex!(
    "e18a34eb0e04b04f7a0ac29a6e80748dca96319b42c54d679cb821dca90c6303"
));

/// The Uniswap V2 factory on Ethereum mainnet.
pub const UNISWAP_V2_FACTORY: Address = H160(hex!("5c69bee701ef814a2b6a3edd4b1652cb9cc5aa6f"));

// EIP-1167 minimal proxy creation code, split around the 20 byte
// implementation address.
pub(crate) const MINIMAL_PROXY_PREFIX: [u8; 20] =
    hex!("3d602d80600a3d3981f3363d3d373d3d3d363d73");
pub(crate) const MINIMAL_PROXY_SUFFIX: [u8; 15] = hex!("5af43d82803e903d91602b57fd5bf3");
