//! Deployable bytecode from Hardhat compilation artifacts.
//!
//! Layout: `<dir>/contracts/<Name>.sol/<Name>.json`, with the creation code
//! in the `bytecode` field.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{RaffleError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardhatArtifact {
    #[serde(default)]
    contract_name: Option<String>,
    bytecode: String,
}

#[derive(Debug, Clone)]
pub struct ArtifactDir {
    root: PathBuf,
}

impl ArtifactDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root
            .join("contracts")
            .join(format!("{name}.sol"))
            .join(format!("{name}.json"))
    }

    /// Creation bytecode for contract `name`.
    pub fn bytecode(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_for(name);
        let err = |reason: String| RaffleError::Artifact {
            path: path.display().to_string(),
            reason,
        };
        let data = std::fs::read_to_string(&path).map_err(|e| err(e.to_string()))?;
        let artifact: HardhatArtifact =
            serde_json::from_str(&data).map_err(|e| err(e.to_string()))?;
        if let Some(contract) = &artifact.contract_name {
            if contract != name {
                return Err(err(format!("contains '{contract}', expected '{name}'")));
            }
        }
        let code = evm_client::types::decode_hex(&artifact.bytecode)
            .map_err(|e| err(e.to_string()))?;
        if code.is_empty() {
            return Err(err("bytecode is empty (abstract contract or interface?)".into()));
        }
        Ok(code)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
pub(crate) fn write_artifact(dir: &Path, name: &str, bytecode: &str) {
    let path = ArtifactDir::new(dir).path_for(name);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(
        path,
        serde_json::json!({
            "_format": "hh-sol-artifact-1",
            "contractName": name,
            "bytecode": bytecode,
        })
        .to_string(),
    )
    .unwrap();
}
