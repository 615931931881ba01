//! Component descriptors and the deploy-or-attach resolver.
//!
//! Every component ends up as a [`Handle`] of the same shape whether it was
//! freshly deployed or bound to a preset address, so nothing downstream
//! branches on provenance.

use std::fmt;

use evm_client::abi::{self, Token};
use evm_client::Address;
use serde::{Deserialize, Serialize};

use crate::actor::Actor;
use crate::artifact::ArtifactDir;
use crate::config::Config;
use crate::contracts::Collection;
use crate::error::{RaffleError, Result};
use crate::ledger::Ledger;

// ---------------------------------------------------------------------------
// ComponentKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Collection,
    Manager,
    Randomness,
    Checker,
}

impl ComponentKind {
    /// Resolution order.
    pub fn all() -> &'static [ComponentKind] {
        &[
            ComponentKind::Collection,
            ComponentKind::Manager,
            ComponentKind::Randomness,
            ComponentKind::Checker,
        ]
    }

    /// Key under `components:` in the config file.
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentKind::Collection => "collection",
            ComponentKind::Manager => "manager",
            ComponentKind::Randomness => "randomness",
            ComponentKind::Checker => "checker",
        }
    }

    /// Contract name, also the default artifact name.
    pub fn contract_name(self) -> &'static str {
        match self {
            ComponentKind::Collection => "NFTCollection",
            ComponentKind::Manager => "RaffleManager",
            ComponentKind::Randomness => "RandomGenerator",
            ComponentKind::Checker => "RaffleChecker",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.contract_name())
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Deployed,
    Attached,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provenance::Deployed => "deployed",
            Provenance::Attached => "attached",
        })
    }
}

/// A live, resolved component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Handle {
    pub kind: ComponentKind,
    pub address: Address,
    pub provenance: Provenance,
}

/// The four resolved components of a run.
#[derive(Debug, Clone, Serialize)]
pub struct Components {
    pub collection: Handle,
    pub manager: Handle,
    pub randomness: Handle,
    pub checker: Handle,
}

impl Components {
    pub fn iter(&self) -> impl Iterator<Item = &Handle> {
        [&self.collection, &self.manager, &self.randomness, &self.checker].into_iter()
    }
}

// ---------------------------------------------------------------------------
// ComponentDescriptor
// ---------------------------------------------------------------------------

/// What the resolver needs to know about one component before the run.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDescriptor {
    pub kind: ComponentKind,
    pub deploy: bool,
    pub preset_address: Option<Address>,
    pub artifact: String,
    pub constructor_args: Vec<Token>,
}

impl ComponentDescriptor {
    /// Descriptors for all four components, in resolution order.
    pub fn from_config(config: &Config) -> Vec<ComponentDescriptor> {
        ComponentKind::all()
            .iter()
            .map(|&kind| {
                let c = config.components.get(kind);
                let constructor_args = match kind {
                    ComponentKind::Collection => Collection::constructor_args(
                        &config.collection.metadata_uri,
                        &config.collection.name,
                        &config.collection.symbol,
                    ),
                    _ => Vec::new(),
                };
                ComponentDescriptor {
                    kind,
                    deploy: c.deploy,
                    preset_address: c.address,
                    artifact: c
                        .artifact
                        .clone()
                        .unwrap_or_else(|| kind.contract_name().to_string()),
                    constructor_args,
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

pub struct Resolver<'a, L> {
    ledger: &'a L,
    deployer: &'a Actor,
    artifacts: &'a ArtifactDir,
    explorer_url: Option<&'a str>,
}

impl<'a, L: Ledger> Resolver<'a, L> {
    pub fn new(ledger: &'a L, deployer: &'a Actor, artifacts: &'a ArtifactDir) -> Self {
        Self {
            ledger,
            deployer,
            artifacts,
            explorer_url: None,
        }
    }

    /// Base URL of a block explorer; resolved addresses are logged as links.
    pub fn with_explorer(mut self, url: Option<&'a str>) -> Self {
        self.explorer_url = url;
        self
    }

    pub async fn resolve(&self, desc: &ComponentDescriptor) -> Result<Handle> {
        let handle = if desc.deploy {
            let mut init_code = self.artifacts.bytecode(&desc.artifact)?;
            init_code.extend(abi::encode(&desc.constructor_args));
            let address = self
                .ledger
                .deploy(self.deployer, init_code)
                .await
                .map_err(|source| RaffleError::Deploy {
                    component: desc.kind.to_string(),
                    source,
                })?;
            Handle {
                kind: desc.kind,
                address,
                provenance: Provenance::Deployed,
            }
        } else {
            let address = desc.preset_address.ok_or_else(|| RaffleError::MissingAddress {
                component: desc.kind.to_string(),
            })?;
            Handle {
                kind: desc.kind,
                address,
                provenance: Provenance::Attached,
            }
        };

        match self.explorer_url {
            Some(base) => tracing::info!(
                component = %handle.kind,
                address = %handle.address,
                link = %format!("{}/address/{}", base.trim_end_matches('/'), handle.address),
                "{}", handle.provenance
            ),
            None => tracing::info!(
                component = %handle.kind,
                address = %handle.address,
                "{}", handle.provenance
            ),
        }
        Ok(handle)
    }

    /// Resolve `descriptors` in order. All four kinds must be present.
    pub async fn resolve_all(&self, descriptors: &[ComponentDescriptor]) -> Result<Components> {
        let mut resolved = Vec::with_capacity(descriptors.len());
        for desc in descriptors {
            resolved.push(self.resolve(desc).await?);
        }
        let take = |kind: ComponentKind| {
            resolved
                .iter()
                .find(|h| h.kind == kind)
                .copied()
                .ok_or_else(|| RaffleError::Config(format!("component '{}' is not described", kind.as_str())))
        };
        Ok(Components {
            collection: take(ComponentKind::Collection)?,
            manager: take(ComponentKind::Manager)?,
            randomness: take(ComponentKind::Randomness)?,
            checker: take(ComponentKind::Checker)?,
        })
    }
}
