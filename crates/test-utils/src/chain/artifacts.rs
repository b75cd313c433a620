//! Compiled contract artifacts loaded at runtime. Both the Hardhat layout
//! (`{"abi": [...], "bytecode": "0x..."}`) and the Foundry layout
//! (`{"abi": [...], "bytecode": {"object": "0x..."}}`) are accepted.

use std::{
    fs,
    path::{Path, PathBuf},
};

use ethers::{
    abi::Abi,
    types::{Bytes, H256},
};
use eyre::{eyre, Result};
use gammaswap_create2::init_code_hash;
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum BytecodeField {
    Hex(Bytes),
    Object { object: Bytes },
}

#[derive(Deserialize)]
struct ArtifactFile {
    abi: Abi,
    bytecode: BytecodeField,
}

#[derive(Clone, Debug)]
pub struct Artifact {
    pub name: String,
    pub abi: Abi,
    pub bytecode: Bytes,
}

impl Artifact {
    pub fn from_json(name: &str, json: &str) -> Result<Self> {
        let file: ArtifactFile = serde_json::from_str(json)
            .map_err(|e| eyre!("malformed artifact for {}: {}", name, e))?;
        let bytecode = match file.bytecode {
            BytecodeField::Hex(bytecode) => bytecode,
            BytecodeField::Object { object } => object,
        };
        if bytecode.is_empty() {
            return Err(eyre!(
                "artifact for {} has no creation code; is it abstract?",
                name
            ));
        }
        Ok(Self {
            name: name.to_string(),
            abi: file.abi,
            bytecode,
        })
    }

    /// The hash of the creation code, which is the init code hash of
    /// contracts without constructor arguments.
    pub fn init_code_hash(&self) -> H256 {
        init_code_hash(&self.bytecode)
    }
}

/// A directory of compiled artifacts. Artifacts are found by file name
/// (`<Contract>.json`) anywhere below the root, so both `out/` and
/// `artifacts/contracts/` trees work.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, name: &str) -> Result<Artifact> {
        let path = find_file(&self.root, &format!("{}.json", name))?.ok_or_else(|| {
            eyre!(
                "couldn't find an artifact for {} under {}",
                name,
                self.root.display()
            )
        })?;
        Artifact::from_json(name, &fs::read_to_string(path)?)
    }
}

fn find_file(dir: &Path, file_name: &str) -> Result<Option<PathBuf>> {
    let mut subdirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if path.file_name().and_then(|name| name.to_str()) == Some(file_name) {
            return Ok(Some(path));
        }
    }
    subdirs.sort();
    for subdir in subdirs {
        if let Some(path) = find_file(&subdir, file_name)? {
            return Ok(Some(path));
        }
    }
    Ok(None)
}
