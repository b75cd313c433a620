//! Checks that `GAMMASWAP_CFMM` is the pair the configured factory creates
//! for `GAMMASWAP_TOKENS` and prints the ordered tokens and their decimals.
//!
//! The factory and init code hash come from `GAMMASWAP_CFMM_FACTORY` and
//! `GAMMASWAP_CFMM_INIT_CODE_HASH`, or else from the address book at
//! `GAMMASWAP_ADDRESSES_URL` or `GAMMASWAP_ADDRESSES_FILE`.

use std::{env, process, sync::Arc};

use dotenvy::dotenv;
use ethers::types::{Address, H256};
use eyre::{eyre, Result};
use gammaswap_addresses::Addresses;
use gammaswap_create2::{checksum, parse_hash};
use gammaswap_validation::{CfmmProtocol, CfmmValidator, RpcReader};
use test_utils::{chain::Chain, constants::MAYBE_ETHEREUM_URL, infra::AddressBookSource};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn parse_address(name: &str, value: &str) -> Result<Address> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|e| eyre!("{} isn't an address ({}): {}", name, value, e))
}

async fn address_book() -> Result<Addresses> {
    if let Ok(url) = env::var("GAMMASWAP_ADDRESSES_URL") {
        return AddressBookSource::new(url)?.fetch().await;
    }
    let path = env::var("GAMMASWAP_ADDRESSES_FILE")
        .map_err(|_| eyre!("set GAMMASWAP_CFMM_FACTORY or point at an address book"))?;
    Addresses::load(path)
}

async fn protocol() -> Result<CfmmProtocol> {
    let protocol_id = match env::var("GAMMASWAP_PROTOCOL_ID") {
        Ok(id) => id.parse()?,
        Err(_) => 1,
    };
    let (factory, init_code_hash) = match env::var("GAMMASWAP_CFMM_FACTORY") {
        Ok(factory) => {
            let factory = parse_address("GAMMASWAP_CFMM_FACTORY", &factory)?;
            let init_code_hash = env::var("GAMMASWAP_CFMM_INIT_CODE_HASH")
                .map_err(|_| eyre!("GAMMASWAP_CFMM_INIT_CODE_HASH is required with a factory"))?;
            (factory, parse_hash(&init_code_hash)?)
        }
        Err(_) => {
            let addresses = address_book().await?;
            (addresses.cfmm_factory, addresses.cfmm_init_code_hash)
        }
    };
    if init_code_hash == H256::zero() {
        return Err(eyre!("the init code hash is unset"));
    }
    Ok(CfmmProtocol::new(protocol_id, factory, init_code_hash))
}

async fn run() -> Result<()> {
    let cfmm = parse_address("GAMMASWAP_CFMM", &env::var("GAMMASWAP_CFMM")?)?;
    let tokens = env::var("GAMMASWAP_TOKENS")?
        .split(',')
        .map(|token| parse_address("GAMMASWAP_TOKENS", token))
        .collect::<Result<Vec<_>>>()?;
    let protocol = protocol().await?;

    let rpc_url = MAYBE_ETHEREUM_URL
        .clone()
        .ok_or_else(|| eyre!("GAMMASWAP_ETHEREUM_URL must be set"))?;
    let chain = Chain::connect(Some(rpc_url)).await?;
    let validator = CfmmValidator::new(RpcReader::new(Arc::new(chain.provider())), protocol);
    let validated = validator.validate(&tokens, cfmm).await?;
    info!(cfmm = %checksum(cfmm), "cfmm is valid");

    println!("cfmm:   {}", checksum(validated.cfmm));
    println!(
        "token0: {} ({} decimals)",
        checksum(validated.tokens.token0()),
        validated.decimals[0]
    );
    println!(
        "token1: {} ({} decimals)",
        checksum(validated.tokens.token1()),
        validated.decimals[1]
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(error) = run().await {
        error!(?error, "validation failed");
        process::exit(1);
    }
}
