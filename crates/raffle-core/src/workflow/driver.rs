use std::time::Duration;

use evm_client::{TxHash, U256};
use serde::Serialize;

use crate::actor::{Actor, ActorRegistry, Role};
use crate::component::Components;
use crate::config::{Config, MintConfig};
use crate::contracts::{Collection, RaffleManager};
use crate::error::{RaffleError, Result};
use crate::ledger::Ledger;

use super::phase::{Phase, PhaseTracker};
use super::plan::{Plan, StepKind};

// ---------------------------------------------------------------------------
// RaffleParams
// ---------------------------------------------------------------------------

/// Values the steps are parameterised with, fixed before the run.
#[derive(Debug, Clone)]
pub struct RaffleParams {
    pub ticket_price: U256,
    pub max_participants: u64,
    /// Used by StartRaffle unless replaced by ResolveTokenId.
    pub token_id: U256,
    /// Used by Participate unless replaced by ResolveRaffleId.
    pub raffle_id: U256,
    pub mint: MintConfig,
    pub participant_delay: Duration,
}

impl RaffleParams {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            ticket_price: U256::from(config.raffle.ticket_price_wei()?),
            max_participants: config.raffle.max_participants,
            token_id: U256::from(config.raffle.token_id),
            raffle_id: U256::from(config.raffle.raffle_id),
            mint: config.mint.clone(),
            participant_delay: config.participant_delay(),
        })
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub name: String,
    pub actor: Role,
    pub executed: bool,
    pub txs: Vec<TxHash>,
    /// Id produced by a resolve step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<U256>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DriveOutcome {
    pub steps: Vec<StepOutcome>,
    pub token_id: U256,
    pub raffle_id: U256,
    pub phase: Phase,
}

impl DriveOutcome {
    pub fn executed(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(|s| s.executed)
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

pub struct Driver<'a, L> {
    ledger: &'a L,
    actors: &'a ActorRegistry,
    components: &'a Components,
    params: RaffleParams,
}

/// Result of one executed step.
#[derive(Default)]
struct Effect {
    txs: Vec<TxHash>,
    resolved: Option<U256>,
}

impl<'a, L: Ledger> Driver<'a, L> {
    pub fn new(
        ledger: &'a L,
        actors: &'a ActorRegistry,
        components: &'a Components,
        params: RaffleParams,
    ) -> Self {
        Self {
            ledger,
            actors,
            components,
            params,
        }
    }

    /// Execute the enabled steps of `plan` in order.
    ///
    /// The whole plan is validated first, so an unmet precondition is
    /// reported before any call. The first failing step aborts the rest.
    pub async fn run(&self, plan: &Plan) -> Result<DriveOutcome> {
        plan.validate()?;

        let mut tracker = PhaseTracker::new(plan.start, plan.max_participants);
        let mut token_id = self.params.token_id;
        let mut raffle_id = self.params.raffle_id;
        let mut steps = Vec::with_capacity(plan.steps.len());

        for step in &plan.steps {
            let name = step.name();
            if !step.enabled {
                tracing::debug!(step = %name, "skipped");
                steps.push(StepOutcome {
                    name,
                    actor: step.actor,
                    executed: false,
                    txs: Vec::new(),
                    resolved: None,
                });
                continue;
            }

            tracker.check(&step.kind)?;
            let actor = self.actors.get(step.actor)?;
            tracing::info!(
                step = %name,
                actor = %actor.role,
                read_only = step.kind.is_read_only(),
                "running"
            );

            let effect = self
                .execute(&step.kind, actor, token_id, raffle_id)
                .await
                .map_err(|e| match e {
                    StepError::Ledger(source) => RaffleError::Step {
                        step: name.clone(),
                        source,
                    },
                    StepError::Invalid(reason) => RaffleError::InvalidStep {
                        step: name.clone(),
                        reason,
                    },
                })?;

            match step.kind {
                StepKind::ResolveTokenId => {
                    if let Some(id) = effect.resolved {
                        token_id = id;
                        tracing::info!(token_id = %id, "token id resolved");
                    }
                }
                StepKind::ResolveRaffleId => {
                    if let Some(id) = effect.resolved {
                        raffle_id = id;
                        tracing::info!(raffle_id = %id, "raffle id resolved");
                    }
                }
                _ => {}
            }
            tracker.record(&step.kind);

            steps.push(StepOutcome {
                name,
                actor: step.actor,
                executed: true,
                txs: effect.txs,
                resolved: effect.resolved,
            });

            if matches!(step.kind, StepKind::Participate(_)) {
                tokio::time::sleep(self.params.participant_delay).await;
            }
        }

        Ok(DriveOutcome {
            steps,
            token_id,
            raffle_id,
            phase: tracker.phase(),
        })
    }

    async fn execute(
        &self,
        kind: &StepKind,
        actor: &Actor,
        token_id: U256,
        raffle_id: U256,
    ) -> std::result::Result<Effect, StepError> {
        let collection = Collection::at(&self.components.collection);
        let manager = RaffleManager::at(&self.components.manager);
        let mut effect = Effect::default();

        match kind {
            StepKind::Approve => {
                let r = collection
                    .set_approval_for_all(self.ledger, actor, self.components.manager.address, true)
                    .await?;
                effect.txs.push(r.transaction_hash);
            }
            StepKind::MintSingle => {
                let r = collection
                    .safe_mint(self.ledger, actor, actor.address, &self.params.mint.token_uri)
                    .await?;
                effect.txs.push(r.transaction_hash);
            }
            StepKind::MintBatch => {
                let mint = &self.params.mint;
                for i in mint.min_token_id..=mint.max_token_id {
                    let uri = mint.batch_uri(i);
                    let r = collection
                        .safe_mint(self.ledger, actor, actor.address, &uri)
                        .await?;
                    tracing::debug!(%uri, tx = %r.transaction_hash, "minted");
                    effect.txs.push(r.transaction_hash);
                }
            }
            StepKind::ResolveTokenId => {
                let supply = collection.current_supply(self.ledger).await?;
                let id = supply
                    .checked_dec()
                    .ok_or_else(|| StepError::Invalid("collection has no minted tokens".into()))?;
                effect.resolved = Some(id);
            }
            StepKind::StartRaffle => {
                let r = manager
                    .start_raffle(
                        self.ledger,
                        actor,
                        self.params.ticket_price,
                        U256::from(self.params.max_participants),
                        self.components.collection.address,
                        token_id,
                    )
                    .await?;
                effect.txs.push(r.transaction_hash);
            }
            StepKind::ResolveRaffleId => {
                let counter = manager.raffle_counter(self.ledger).await?;
                let id = counter
                    .checked_dec()
                    .ok_or_else(|| StepError::Invalid("manager reports no raffles".into()))?;
                effect.resolved = Some(id);
            }
            StepKind::Participate(_) => {
                let r = manager
                    .participate(self.ledger, actor, raffle_id, self.params.ticket_price)
                    .await?;
                effect.txs.push(r.transaction_hash);
            }
        }
        Ok(effect)
    }
}

enum StepError {
    Ledger(evm_client::EvmError),
    Invalid(String),
}

impl From<evm_client::EvmError> for StepError {
    fn from(e: evm_client::EvmError) -> Self {
        StepError::Ledger(e)
    }
}
