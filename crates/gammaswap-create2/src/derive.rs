use ethers::{
    types::{Address, H256},
    utils::{hex, keccak256, to_checksum},
};

use crate::{
    constants::{CREATE2_PREFIX, MINIMAL_PROXY_PREFIX, MINIMAL_PROXY_SUFFIX},
    error::{Create2Error, Result},
};

const ADDRESS_LENGTH: usize = 20;
const WORD_LENGTH: usize = 32;

/// Computes the address that `factory` assigns to a contract created with
/// CREATE2 from `salt` and creation code hashing to `init_code_hash`.
///
/// The preimage is `0xff ++ factory ++ salt ++ init_code_hash` and the
/// address is the low 20 bytes of its keccak256 hash. Every input must have
/// its exact width.
pub fn derive_address(factory: &[u8], salt: &[u8], init_code_hash: &[u8]) -> Result<Address> {
    check_length("factory", factory, ADDRESS_LENGTH)?;
    check_length("salt", salt, WORD_LENGTH)?;
    check_length("init code hash", init_code_hash, WORD_LENGTH)?;

    let mut preimage = [0u8; 1 + ADDRESS_LENGTH + 2 * WORD_LENGTH];
    preimage[0] = CREATE2_PREFIX;
    preimage[1..21].copy_from_slice(factory);
    preimage[21..53].copy_from_slice(salt);
    preimage[53..85].copy_from_slice(init_code_hash);

    Ok(Address::from_slice(&keccak256(preimage)[12..]))
}

/// Typed form of [`derive_address`]. The widths are enforced by the types, so
/// this can't fail.
pub fn calc_address(factory: Address, salt: H256, init_code_hash: H256) -> Address {
    let mut preimage = Vec::with_capacity(85);
    preimage.push(CREATE2_PREFIX);
    preimage.extend_from_slice(factory.as_bytes());
    preimage.extend_from_slice(salt.as_bytes());
    preimage.extend_from_slice(init_code_hash.as_bytes());
    Address::from_slice(&keccak256(preimage)[12..])
}

/// Hex entry point for [`derive_address`]. Accepts inputs with or without a
/// `0x` prefix.
pub fn derive_address_hex(factory: &str, salt: &str, init_code_hash: &str) -> Result<Address> {
    derive_address(
        &decode_hex("factory", factory)?,
        &decode_hex("salt", salt)?,
        &decode_hex("init code hash", init_code_hash)?,
    )
}

/// Renders an address in EIP-55 mixed-case checksum form.
pub fn checksum(address: Address) -> String {
    to_checksum(&address, None)
}

/// Hashes contract creation code.
pub fn init_code_hash(creation_code: &[u8]) -> H256 {
    H256(keccak256(creation_code))
}

/// The init code hash of an EIP-1167 minimal proxy pointing at
/// `implementation`. Factories that deploy pools with a deterministic clone
/// use this as the CREATE2 init code hash.
pub fn minimal_proxy_init_code_hash(implementation: Address) -> H256 {
    let mut code = Vec::with_capacity(55);
    code.extend_from_slice(&MINIMAL_PROXY_PREFIX);
    code.extend_from_slice(implementation.as_bytes());
    code.extend_from_slice(&MINIMAL_PROXY_SUFFIX);
    init_code_hash(&code)
}

/// Parses a 32 byte hex string such as an init code hash.
pub fn parse_hash(value: &str) -> Result<H256> {
    let bytes = decode_hex("hash", value)?;
    check_length("hash", &bytes, WORD_LENGTH)?;
    Ok(H256::from_slice(&bytes))
}

fn decode_hex(field: &'static str, value: &str) -> Result<Vec<u8>> {
    let value = value.trim();
    let value = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(value).map_err(|e| Create2Error::InvalidHex {
        field,
        reason: e.to_string(),
    })
}

fn check_length(field: &'static str, bytes: &[u8], expected: usize) -> Result<()> {
    if bytes.len() != expected {
        return Err(Create2Error::InvalidInputLength {
            field,
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}
