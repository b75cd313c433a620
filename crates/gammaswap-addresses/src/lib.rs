// TODO: Add a lookup of the canonical deployment by chain id once the
// protocol has addresses on a public network worth hard-coding.

use std::{
    fs::{create_dir_all, File},
    path::Path,
};

use ethers::types::{Address, H256};
use eyre::Result;
use serde::{Deserialize, Serialize};

/// A pool created through the pool factory. The key is the CREATE2 salt the
/// factory used and the registry key it stores the pool under.
#[derive(Default, Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolRecord {
    pub key: H256,
    pub cfmm: Address,
    pub protocol_id: u32,
    pub pool: Address,
}

/// The contracts of a GammaSwap deployment. Deployments on shared networks
/// aren't predictable ahead of time, so operators persist these between
/// runs.
#[derive(Default, Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Addresses {
    pub tokens: Vec<Address>,
    pub cfmm_factory: Address,
    pub cfmm_init_code_hash: H256,
    pub cfmms: Vec<Address>,
    pub pool_factory: Address,
    pub long_strategy: Address,
    pub short_strategy: Address,
    pub liquidation_strategy: Address,
    pub pool_implementation: Address,
    pub position_manager: Address,
    pub pools: Vec<PoolRecord>,
}

impl Addresses {
    /// Reads an address book written by [`Addresses::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    /// Writes the address book as JSON, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Finds the pool created for a CFMM under a protocol id.
    pub fn pool(&self, cfmm: Address, protocol_id: u32) -> Option<&PoolRecord> {
        self.pools
            .iter()
            .find(|record| record.cfmm == cfmm && record.protocol_id == protocol_id)
    }
}
