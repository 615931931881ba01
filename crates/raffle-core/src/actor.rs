//! Role-keyed registry of signing identities.
//!
//! The registry is populated once at startup. Steps look actors up by
//! [`Role`]; the positional index is kept only for log output.

use std::fmt;
use std::str::FromStr;

use evm_client::{Address, Wallet};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::ActorConfig;
use crate::error::{RaffleError, Result};

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Owner,
    /// `participant-N`, N starting at 1.
    Participant(u8),
}

impl Role {
    pub fn is_participant(self) -> bool {
        matches!(self, Role::Participant(_))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Owner => f.write_str("owner"),
            Role::Participant(n) => write!(f, "participant-{n}"),
        }
    }
}

impl FromStr for Role {
    type Err = RaffleError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "owner" {
            return Ok(Role::Owner);
        }
        s.strip_prefix("participant-")
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|n| *n > 0)
            .map(Role::Participant)
            .ok_or_else(|| RaffleError::InvalidRole(s.to_string()))
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// A registered signing identity. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub index: usize,
    pub role: Role,
    pub address: Address,
}

// ---------------------------------------------------------------------------
// ActorRegistry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ActorRegistry {
    actors: Vec<Actor>,
}

impl ActorRegistry {
    /// Register `(role, address)` pairs in order. Duplicate roles are rejected.
    pub fn new(entries: impl IntoIterator<Item = (Role, Address)>) -> Result<Self> {
        let mut actors: Vec<Actor> = Vec::new();
        for (index, (role, address)) in entries.into_iter().enumerate() {
            if actors.iter().any(|a| a.role == role) {
                return Err(RaffleError::DuplicateActor(role.to_string()));
            }
            actors.push(Actor {
                index,
                role,
                address,
            });
        }
        Ok(Self { actors })
    }

    pub fn from_wallets(wallets: &[(Role, Wallet)]) -> Result<Self> {
        Self::new(wallets.iter().map(|(role, w)| (*role, w.address())))
    }

    pub fn get(&self, role: Role) -> Result<&Actor> {
        self.actors
            .iter()
            .find(|a| a.role == role)
            .ok_or_else(|| RaffleError::UnknownActor(role.to_string()))
    }

    pub fn owner(&self) -> Result<&Actor> {
        self.get(Role::Owner)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter()
    }
}

/// Resolve each configured actor's private key through `lookup` (normally
/// `std::env::var`) and build its wallet.
pub fn load_wallets<F>(actors: &[ActorConfig], lookup: F) -> Result<Vec<(Role, Wallet)>>
where
    F: Fn(&str) -> Option<String>,
{
    actors
        .iter()
        .map(|cfg| {
            let key = lookup(&cfg.key_env)
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| RaffleError::MissingEnv(cfg.key_env.clone()))?;
            let wallet = Wallet::from_hex(&key).map_err(|source| RaffleError::InvalidKey {
                role: cfg.role.to_string(),
                source,
            })?;
            Ok((cfg.role, wallet))
        })
        .collect()
}
