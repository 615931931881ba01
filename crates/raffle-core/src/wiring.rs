//! Cross-registration of resolved component addresses.

use evm_client::TxHash;
use serde::Serialize;

use crate::actor::Actor;
use crate::component::Components;
use crate::config::WiringConfig;
use crate::contracts::{EligibilityChecker, RaffleManager, RandomnessSource};
use crate::error::{RaffleError, Result};
use crate::ledger::Ledger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Link {
    /// Manager learns the randomness source.
    RandomnessInManager,
    /// Randomness source learns the manager.
    ManagerInRandomness,
    /// Manager learns the eligibility checker.
    CheckerInManager,
    /// Eligibility checker learns the manager.
    ManagerInChecker,
}

impl Link {
    pub fn all() -> &'static [Link] {
        &[
            Link::RandomnessInManager,
            Link::ManagerInRandomness,
            Link::CheckerInManager,
            Link::ManagerInChecker,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Link::RandomnessInManager => "randomness_in_manager",
            Link::ManagerInRandomness => "manager_in_randomness",
            Link::CheckerInManager => "checker_in_manager",
            Link::ManagerInChecker => "manager_in_checker",
        }
    }

    fn enabled(self, config: &WiringConfig) -> bool {
        match self {
            Link::RandomnessInManager => config.randomness_in_manager,
            Link::ManagerInRandomness => config.manager_in_randomness,
            Link::CheckerInManager => config.checker_in_manager,
            Link::ManagerInChecker => config.manager_in_checker,
        }
    }
}

impl std::fmt::Display for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WiredLink {
    pub link: Link,
    pub tx: TxHash,
}

/// Issue one owner call per enabled link, in [`Link::all`] order.
pub async fn wire<L: Ledger>(
    ledger: &L,
    owner: &Actor,
    components: &Components,
    config: &WiringConfig,
) -> Result<Vec<WiredLink>> {
    let manager = RaffleManager::at(&components.manager);
    let randomness = RandomnessSource::at(&components.randomness);
    let checker = EligibilityChecker::at(&components.checker);

    let mut wired = Vec::new();
    for &link in Link::all().iter().filter(|l| l.enabled(config)) {
        let receipt = match link {
            Link::RandomnessInManager => {
                manager
                    .update_random_generator(ledger, owner, components.randomness.address)
                    .await
            }
            Link::ManagerInRandomness => {
                randomness
                    .update_raffle_manager(ledger, owner, components.manager.address)
                    .await
            }
            Link::CheckerInManager => {
                manager
                    .update_raffle_checker(ledger, owner, components.checker.address)
                    .await
            }
            Link::ManagerInChecker => {
                checker
                    .update_raffle_manager(ledger, owner, components.manager.address)
                    .await
            }
        }
        .map_err(|source| RaffleError::Wiring {
            link: link.to_string(),
            source,
        })?;
        tracing::info!(link = %link, tx = %receipt.transaction_hash, "linked");
        wired.push(WiredLink {
            link,
            tx: receipt.transaction_hash,
        });
    }
    Ok(wired)
}
