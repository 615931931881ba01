use evm_client::EvmError;
use thiserror::Error;

use crate::workflow::Phase;

#[derive(Debug, Error)]
pub enum RaffleError {
    #[error("failed to deploy {component}: {source}")]
    Deploy {
        component: String,
        #[source]
        source: EvmError,
    },

    #[error("cannot attach {component}: no preset address configured")]
    MissingAddress { component: String },

    #[error("wiring '{link}' failed: {source}")]
    Wiring {
        link: String,
        #[source]
        source: EvmError,
    },

    #[error("step '{step}' failed: {source}")]
    Step {
        step: String,
        #[source]
        source: EvmError,
    },

    #[error("query '{query}' failed: {source}")]
    Query {
        query: String,
        #[source]
        source: EvmError,
    },

    #[error("step '{step}' requires phase {required}, but the raffle is {actual}")]
    Precondition {
        step: String,
        required: Phase,
        actual: Phase,
    },

    #[error("step '{step}' cannot run: {reason}")]
    InvalidStep { step: String, reason: String },

    #[error("invalid config: {0}")]
    Config(String),

    #[error("config not found at {0}: run 'raffle init'")]
    ConfigNotFound(String),

    #[error("artifact {path}: {reason}")]
    Artifact { path: String, reason: String },

    #[error("unknown actor role: {0}")]
    UnknownActor(String),

    #[error("actor role registered twice: {0}")]
    DuplicateActor(String),

    #[error("invalid role '{0}': expected 'owner' or 'participant-N'")]
    InvalidRole(String),

    #[error("invalid phase: {0}")]
    InvalidPhase(String),

    #[error("environment variable {0} is not set")]
    MissingEnv(String),

    #[error("invalid private key for {role}: {source}")]
    InvalidKey {
        role: String,
        #[source]
        source: EvmError,
    },

    #[error(transparent)]
    Evm(#[from] EvmError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RaffleError>;
