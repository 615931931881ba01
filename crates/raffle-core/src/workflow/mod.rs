//! Raffle lifecycle: the ordered step plan, the phase model used to check
//! step preconditions, and the driver that executes enabled steps.
//!
//! Steps always run in the declared order. Before any ledger call the plan
//! is simulated from the configured starting phase so that a toggle set
//! which skips a required phase is reported up front instead of failing
//! half way through a run.

pub mod driver;
pub mod phase;
pub mod plan;

pub use driver::{DriveOutcome, Driver, RaffleParams, StepOutcome};
pub use phase::{Phase, PhaseTracker};
pub use plan::{Plan, Step, StepKind};
