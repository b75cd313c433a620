//! Deploys the AMM, the GammaSwap protocol and a pool for every token pair,
//! then writes the address book to `GAMMASWAP_ADDRESSES_FILE`.

use std::{env, process};

use dotenvy::dotenv;
use ethers::signers::{LocalWallet, Signer};
use eyre::{eyre, Result};
use test_utils::{
    chain::{ArtifactStore, Chain, DeployConfig},
    constants::{ARTIFACTS_DIR, MAYBE_ETHEREUM_URL},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDRESSES_FILE: &str = "./artifacts/addresses.json";

async fn run() -> Result<()> {
    let config = DeployConfig::from_env()?;
    let rpc_url = MAYBE_ETHEREUM_URL
        .clone()
        .ok_or_else(|| eyre!("GAMMASWAP_ETHEREUM_URL must be set"))?;
    let chain = Chain::connect(Some(rpc_url)).await?;
    let signer = env::var("GAMMASWAP_PRIVATE_KEY")?.parse::<LocalWallet>()?;
    info!(deployer = ?signer.address(), "deploying");

    let addresses = chain
        .full_deploy(signer, config, &ArtifactStore::new(&*ARTIFACTS_DIR))
        .await?;

    let path = env::var("GAMMASWAP_ADDRESSES_FILE")
        .unwrap_or_else(|_| DEFAULT_ADDRESSES_FILE.to_string());
    addresses.save(&path)?;
    info!(%path, pools = addresses.pools.len(), "wrote address book");

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(error) = run().await {
        error!(?error, "deployment failed");
        process::exit(1);
    }
}
