use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RaffleError, Result};

use super::plan::StepKind;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Logical stage of the collection/raffle pair, in lifecycle order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Unapproved,
    Approved,
    Minted,
    RaffleOpen,
    ParticipantsJoining,
    AwaitingDraw,
}

impl Phase {
    pub fn all() -> &'static [Phase] {
        &[
            Phase::Unapproved,
            Phase::Approved,
            Phase::Minted,
            Phase::RaffleOpen,
            Phase::ParticipantsJoining,
            Phase::AwaitingDraw,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Unapproved => "unapproved",
            Phase::Approved => "approved",
            Phase::Minted => "minted",
            Phase::RaffleOpen => "raffle_open",
            Phase::ParticipantsJoining => "participants_joining",
            Phase::AwaitingDraw => "awaiting_draw",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = RaffleError;

    fn from_str(s: &str) -> Result<Self> {
        Phase::all()
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| RaffleError::InvalidPhase(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// PhaseTracker
// ---------------------------------------------------------------------------

/// Tracks the phase reached by successful steps.
///
/// Used twice per run: once to simulate the plan before execution, and
/// again by the driver as steps actually complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseTracker {
    phase: Phase,
    joined: u64,
    max_participants: u64,
}

impl PhaseTracker {
    pub fn new(start: Phase, max_participants: u64) -> Self {
        Self {
            phase: start,
            joined: 0,
            max_participants,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Participants entered since the raffle was opened in this run.
    pub fn joined(&self) -> u64 {
        self.joined
    }

    /// Check that `step` may run from the current phase.
    pub fn check(&self, step: &StepKind) -> Result<()> {
        let required = step.requires();
        if self.phase < required {
            return Err(RaffleError::Precondition {
                step: step.name(),
                required,
                actual: self.phase,
            });
        }
        if matches!(step, StepKind::Participate(_)) && self.phase >= Phase::AwaitingDraw {
            return Err(RaffleError::InvalidStep {
                step: step.name(),
                reason: format!(
                    "raffle already holds its maximum of {} participants",
                    self.max_participants
                ),
            });
        }
        Ok(())
    }

    /// Advance after `step` succeeded.
    pub fn record(&mut self, step: &StepKind) {
        self.phase = match step {
            StepKind::Approve => self.phase.max(Phase::Approved),
            StepKind::MintSingle | StepKind::MintBatch => self.phase.max(Phase::Minted),
            StepKind::StartRaffle => {
                self.joined = 0;
                Phase::RaffleOpen
            }
            StepKind::Participate(_) => {
                self.joined += 1;
                if self.joined >= self.max_participants {
                    Phase::AwaitingDraw
                } else {
                    Phase::ParticipantsJoining
                }
            }
            StepKind::ResolveTokenId | StepKind::ResolveRaffleId => self.phase,
        };
    }
}
