use std::sync::Arc;

use ethers::{
    providers::Middleware,
    signers::{coins_bip39::English, LocalWallet, MnemonicBuilder, Signer},
    types::U256,
};
use eyre::{eyre, Result};
use gammaswap_addresses::Addresses;
use tracing::info;

use super::{ArtifactStore, Chain, ChainClient, DeployConfig};
use crate::constants::{ARTIFACTS_DIR, MAYBE_ETHEREUM_URL};

pub const MNEMONIC: &str =
    "shed present manage school gym spatial sure put tongue dragon left bless share chair element";

/// A chain with funded accounts and, once deployed, the address book of the
/// deployment. Tests pass this around instead of sharing global fixtures.
pub struct TestChain {
    chain: Chain,
    accounts: Vec<LocalWallet>,
    addresses: Addresses,
}

impl TestChain {
    /// Connects to `GAMMASWAP_ETHEREUM_URL` (or a fresh anvil node) and funds
    /// `num_accounts` accounts derived from the test mnemonic.
    pub async fn connect(num_accounts: usize) -> Result<Self> {
        if num_accounts == 0 {
            return Err(eyre!("a test chain needs at least one account"));
        }
        let chain = Chain::connect(MAYBE_ETHEREUM_URL.clone()).await?;
        let chain_id = chain.provider().get_chainid().await?.as_u64();

        let mut accounts = Vec::with_capacity(num_accounts);
        for index in 0..num_accounts {
            let wallet = MnemonicBuilder::<English>::default()
                .phrase(MNEMONIC)
                .index(index as u32)?
                .build()?
                .with_chain_id(chain_id);
            if chain.is_anvil() {
                chain
                    .deal(wallet.address(), U256::from(100_000) * U256::exp10(18))
                    .await?;
            }
            accounts.push(wallet);
        }

        Ok(Self {
            chain,
            accounts,
            addresses: Addresses::default(),
        })
    }

    /// Connects and deploys everything from the artifacts under
    /// `GAMMASWAP_ARTIFACTS_DIR`, using the first account as the owner.
    pub async fn deploy(num_accounts: usize, config: DeployConfig) -> Result<Self> {
        let mut test_chain = Self::connect(num_accounts).await?;
        let artifacts = ArtifactStore::new(&*ARTIFACTS_DIR);
        test_chain.addresses = test_chain
            .chain
            .full_deploy(test_chain.owner().clone(), config, &artifacts)
            .await?;
        info!(pools = test_chain.addresses.pools.len(), "deployed test chain");
        Ok(test_chain)
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn accounts(&self) -> &[LocalWallet] {
        &self.accounts
    }

    /// The account that owns the deployment.
    pub fn owner(&self) -> &LocalWallet {
        &self.accounts[0]
    }

    pub fn addresses(&self) -> &Addresses {
        &self.addresses
    }

    pub async fn client(&self, signer: LocalWallet) -> Result<Arc<ChainClient<LocalWallet>>> {
        self.chain.client(signer).await
    }
}
