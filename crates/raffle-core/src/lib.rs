pub mod actor;
pub mod artifact;
pub mod component;
pub mod config;
pub mod contracts;
pub mod error;
pub mod io;
pub mod ledger;
pub mod report;
pub mod run;
pub mod status;
pub mod wiring;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use actor::{Actor, ActorRegistry, Role};
pub use component::{ComponentKind, Components, Handle, Provenance};
pub use config::Config;
pub use error::{RaffleError, Result};
pub use ledger::{Ledger, RpcLedger};
pub use report::RunReport;
