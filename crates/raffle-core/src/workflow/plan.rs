use serde::Serialize;

use crate::actor::Role;
use crate::config::Config;
use crate::error::Result;

use super::phase::{Phase, PhaseTracker};

// ---------------------------------------------------------------------------
// StepKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "role", rename_all = "snake_case")]
pub enum StepKind {
    Approve,
    MintSingle,
    MintBatch,
    ResolveTokenId,
    StartRaffle,
    ResolveRaffleId,
    Participate(Role),
}

impl StepKind {
    pub fn name(&self) -> String {
        match self {
            StepKind::Approve => "approve".to_string(),
            StepKind::MintSingle => "mint_single".to_string(),
            StepKind::MintBatch => "mint_batch".to_string(),
            StepKind::ResolveTokenId => "resolve_token_id".to_string(),
            StepKind::StartRaffle => "start_raffle".to_string(),
            StepKind::ResolveRaffleId => "resolve_raffle_id".to_string(),
            StepKind::Participate(role) => format!("participate:{role}"),
        }
    }

    /// Minimum phase the step needs.
    pub fn requires(&self) -> Phase {
        match self {
            StepKind::Approve => Phase::Unapproved,
            StepKind::MintSingle | StepKind::MintBatch => Phase::Approved,
            StepKind::ResolveTokenId | StepKind::StartRaffle => Phase::Minted,
            StepKind::ResolveRaffleId | StepKind::Participate(_) => Phase::RaffleOpen,
        }
    }

    /// `true` for steps that only read ledger state.
    pub fn is_read_only(&self) -> bool {
        matches!(self, StepKind::ResolveTokenId | StepKind::ResolveRaffleId)
    }
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// One entry of the fixed-order workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub kind: StepKind,
    pub enabled: bool,
    /// The actor that issues the step's calls.
    pub actor: Role,
}

impl Step {
    pub fn name(&self) -> String {
        self.kind.name()
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// The full step list in execution order, disabled steps included.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub start: Phase,
    pub max_participants: u64,
    pub steps: Vec<Step>,
}

impl Plan {
    pub fn from_config(config: &Config) -> Self {
        let wf = &config.workflow;
        let raffle = &config.raffle;
        let owner_step = |kind: StepKind, enabled: bool| Step {
            kind,
            enabled,
            actor: Role::Owner,
        };

        let mut steps = vec![
            owner_step(StepKind::Approve, wf.approve),
            owner_step(StepKind::MintSingle, wf.mint_single),
            owner_step(StepKind::MintBatch, wf.mint_batch),
            owner_step(StepKind::ResolveTokenId, raffle.automate_token_id),
            owner_step(StepKind::StartRaffle, wf.start_raffle),
            owner_step(StepKind::ResolveRaffleId, raffle.automate_raffle_id),
        ];

        // One entry step per configured participant, in role order.
        let mut participants: Vec<Role> = config
            .actors
            .iter()
            .map(|a| a.role)
            .filter(|r| r.is_participant())
            .collect();
        participants.sort();
        participants.dedup();
        for role in participants {
            steps.push(Step {
                kind: StepKind::Participate(role),
                enabled: wf.participants.contains(&role),
                actor: role,
            });
        }

        Self {
            start: wf.assume_phase,
            max_participants: raffle.max_participants,
            steps,
        }
    }

    pub fn enabled(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter().filter(|s| s.enabled)
    }

    /// Simulate every enabled step from `start`; the first unmet precondition
    /// is returned. Returns the phase the plan ends in.
    pub fn validate(&self) -> Result<Phase> {
        let mut tracker = PhaseTracker::new(self.start, self.max_participants);
        for step in self.enabled() {
            tracker.check(&step.kind)?;
            tracker.record(&step.kind);
        }
        Ok(tracker.phase())
    }
}
