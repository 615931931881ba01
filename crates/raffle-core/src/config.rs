use crate::actor::Role;
use crate::component::ComponentKind;
use crate::error::{RaffleError, Result};
use crate::workflow::Phase;
use evm_client::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "raffle.yaml";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// NetworkConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Environment variable holding the JSON-RPC endpoint URL.
    #[serde(default = "default_rpc_url_env")]
    pub rpc_url_env: String,
    /// Skip the `eth_chainId` round trip when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Block explorer base URL used to print address links.
    #[serde(default = "default_explorer_url", skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
    /// Hardhat artifacts directory holding deployable bytecode.
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
}

fn default_rpc_url_env() -> String {
    "API_URL_AMOY".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_explorer_url() -> Option<String> {
    Some("https://amoy.polygonscan.com".to_string())
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("src/artifacts")
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url_env: default_rpc_url_env(),
            chain_id: None,
            poll_interval_ms: default_poll_interval_ms(),
            explorer_url: default_explorer_url(),
            artifacts_dir: default_artifacts_dir(),
        }
    }
}

// ---------------------------------------------------------------------------
// ActorConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorConfig {
    pub role: Role,
    /// Environment variable holding this actor's private key.
    pub key_env: String,
}

fn default_actors() -> Vec<ActorConfig> {
    let mut actors = vec![ActorConfig {
        role: Role::Owner,
        key_env: "PRIVATE_KEY_00".to_string(),
    }];
    for n in 1..=5u8 {
        actors.push(ActorConfig {
            role: Role::Participant(n),
            key_env: format!("PRIVATE_KEY_{n:02}"),
        });
    }
    actors
}

// ---------------------------------------------------------------------------
// ComponentsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentConfig {
    #[serde(default)]
    pub deploy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// Artifact (contract) name; defaults to the component's contract name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
}

impl ComponentConfig {
    fn attached(address: &str) -> Self {
        Self {
            deploy: false,
            address: address.parse().ok(),
            artifact: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentsConfig {
    #[serde(default = "default_collection_component")]
    pub collection: ComponentConfig,
    #[serde(default = "default_manager_component")]
    pub manager: ComponentConfig,
    #[serde(default = "default_randomness_component")]
    pub randomness: ComponentConfig,
    #[serde(default = "default_checker_component")]
    pub checker: ComponentConfig,
}

fn default_collection_component() -> ComponentConfig {
    ComponentConfig::attached("0xaDcaD1b3F5e16a3D59A9ba8BdB936391B3770c7C")
}

fn default_manager_component() -> ComponentConfig {
    ComponentConfig::attached("0xF395e5c42d46a16eE2726De9BEf26A1F8a3396b9")
}

fn default_randomness_component() -> ComponentConfig {
    ComponentConfig::attached("0x4659F7241d827F9cd4EDCb494D5ddC78b80fe6B7")
}

fn default_checker_component() -> ComponentConfig {
    ComponentConfig::attached("0x53dF38b479899F54b8EA8bda3cB562196f1dFA8d")
}

impl Default for ComponentsConfig {
    fn default() -> Self {
        Self {
            collection: default_collection_component(),
            manager: default_manager_component(),
            randomness: default_randomness_component(),
            checker: default_checker_component(),
        }
    }
}

impl ComponentsConfig {
    pub fn get(&self, kind: ComponentKind) -> &ComponentConfig {
        match kind {
            ComponentKind::Collection => &self.collection,
            ComponentKind::Manager => &self.manager,
            ComponentKind::Randomness => &self.randomness,
            ComponentKind::Checker => &self.checker,
        }
    }
}

// ---------------------------------------------------------------------------
// CollectionConfig
// ---------------------------------------------------------------------------

/// Constructor parameters for a freshly deployed collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    #[serde(default = "default_collection_name")]
    pub name: String,
    #[serde(default = "default_collection_symbol")]
    pub symbol: String,
    #[serde(default = "default_collection_metadata_uri")]
    pub metadata_uri: String,
}

fn default_collection_name() -> String {
    "Collection #0001".to_string()
}

fn default_collection_symbol() -> String {
    "NFT1".to_string()
}

fn default_collection_metadata_uri() -> String {
    "https://raw.githubusercontent.com/andreatedesco/Utilities/master/Metadata/collection"
        .to_string()
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            name: default_collection_name(),
            symbol: default_collection_symbol(),
            metadata_uri: default_collection_metadata_uri(),
        }
    }
}

// ---------------------------------------------------------------------------
// WiringConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WiringConfig {
    #[serde(default)]
    pub randomness_in_manager: bool,
    #[serde(default)]
    pub manager_in_randomness: bool,
    #[serde(default)]
    pub checker_in_manager: bool,
    #[serde(default)]
    pub manager_in_checker: bool,
}

// ---------------------------------------------------------------------------
// RaffleConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaffleConfig {
    /// Ticket price in ether, as a decimal string (e.g. "0.01").
    #[serde(default = "default_ticket_price")]
    pub ticket_price: String,
    #[serde(default = "default_max_participants")]
    pub max_participants: u64,
    #[serde(default)]
    pub token_id: u64,
    /// Use `currentSupply() - 1` instead of `token_id`.
    #[serde(default)]
    pub automate_token_id: bool,
    #[serde(default)]
    pub raffle_id: u64,
    /// Use `getRaffleCounter() - 1` instead of `raffle_id`.
    #[serde(default)]
    pub automate_raffle_id: bool,
}

fn default_ticket_price() -> String {
    "0".to_string()
}

fn default_max_participants() -> u64 {
    3
}

impl Default for RaffleConfig {
    fn default() -> Self {
        Self {
            ticket_price: default_ticket_price(),
            max_participants: default_max_participants(),
            token_id: 0,
            automate_token_id: false,
            raffle_id: 0,
            automate_raffle_id: false,
        }
    }
}

impl RaffleConfig {
    pub fn ticket_price_wei(&self) -> Result<u128> {
        evm_client::parse_ether(&self.ticket_price)
            .map_err(|e| RaffleError::Config(format!("raffle.ticket_price: {e}")))
    }
}

// ---------------------------------------------------------------------------
// MintConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintConfig {
    /// Metadata URI for the single-token mint.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    /// Batch mint URIs are `batch_base_uri` + two-digit zero-padded index.
    #[serde(default = "default_batch_base_uri")]
    pub batch_base_uri: String,
    #[serde(default)]
    pub min_token_id: u64,
    #[serde(default = "default_max_token_id")]
    pub max_token_id: u64,
}

fn default_token_uri() -> String {
    "https://raw.githubusercontent.com/andreatedesco/Utilities/master/Metadata/token-0000"
        .to_string()
}

fn default_batch_base_uri() -> String {
    "https://raw.githubusercontent.com/andreatedesco/Utilities/master/Metadata/token-00"
        .to_string()
}

fn default_max_token_id() -> u64 {
    13
}

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            token_uri: default_token_uri(),
            batch_base_uri: default_batch_base_uri(),
            min_token_id: 0,
            max_token_id: default_max_token_id(),
        }
    }
}

impl MintConfig {
    /// URI for batch index `i`: base + index padded to at least two digits.
    pub fn batch_uri(&self, i: u64) -> String {
        format!("{}{i:02}", self.batch_base_uri)
    }
}

// ---------------------------------------------------------------------------
// WorkflowConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Phase the raffle is known to be in before this run (e.g. `minted` when
    /// a previous run already approved and minted).
    #[serde(default)]
    pub assume_phase: Phase,
    #[serde(default)]
    pub approve: bool,
    #[serde(default)]
    pub mint_single: bool,
    #[serde(default)]
    pub mint_batch: bool,
    #[serde(default)]
    pub start_raffle: bool,
    /// Participant roles that enter the raffle; entries run in role order.
    #[serde(default)]
    pub participants: Vec<Role>,
    #[serde(default = "default_participant_delay_ms")]
    pub participant_delay_ms: u64,
}

fn default_participant_delay_ms() -> u64 {
    2500
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            assume_phase: Phase::default(),
            approve: false,
            mint_single: false,
            mint_batch: false,
            start_raffle: false,
            participants: Vec::new(),
            participant_delay_ms: default_participant_delay_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// StatusConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    #[serde(default = "default_raffle_info")]
    pub raffle_info: bool,
}

fn default_raffle_info() -> bool {
    true
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            raffle_info: default_raffle_info(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default = "default_actors")]
    pub actors: Vec<ActorConfig>,
    #[serde(default)]
    pub components: ComponentsConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub wiring: WiringConfig,
    #[serde(default)]
    pub raffle: RaffleConfig,
    #[serde(default)]
    pub mint: MintConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub status: StatusConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            network: NetworkConfig::default(),
            actors: default_actors(),
            components: ComponentsConfig::default(),
            collection: CollectionConfig::default(),
            wiring: WiringConfig::default(),
            raffle: RaffleConfig::default(),
            mint: MintConfig::default(),
            workflow: WorkflowConfig::default(),
            status: StatusConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RaffleError::ConfigNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        Self::from_yaml(&data)
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(data)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        crate::io::write_config(path, self)
    }

    pub fn participant_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.workflow.participant_delay_ms)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut error = |message: String| {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message,
            })
        };

        if self.raffle.max_participants == 0 {
            error("raffle.max_participants must be positive".to_string());
        }
        if let Err(e) = self.raffle.ticket_price_wei() {
            error(e.to_string());
        }
        if self.mint.min_token_id > self.mint.max_token_id {
            error(format!(
                "mint.min_token_id ({}) is greater than mint.max_token_id ({})",
                self.mint.min_token_id, self.mint.max_token_id
            ));
        }

        // Actors: unique roles, an owner, and every entering participant configured.
        let mut seen = HashSet::new();
        for actor in &self.actors {
            if !seen.insert(actor.role) {
                error(format!("actor role '{}' is configured twice", actor.role));
            }
        }
        if !seen.contains(&Role::Owner) {
            error("actors must include an 'owner'".to_string());
        }
        for role in &self.workflow.participants {
            if !role.is_participant() {
                error(format!("workflow.participants: '{role}' is not a participant role"));
            } else if !seen.contains(role) {
                error(format!("workflow.participants: '{role}' has no entry in actors"));
            }
        }

        for kind in ComponentKind::all() {
            let c = self.components.get(*kind);
            if !c.deploy && c.address.is_none() {
                error(format!(
                    "components.{}: attach requires an address (or set deploy: true)",
                    kind.as_str()
                ));
            }
        }

        warnings.extend(self.warnings());
        warnings
    }

    fn warnings(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut warn = |message: String| {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message,
            })
        };

        for kind in ComponentKind::all() {
            let c = self.components.get(*kind);
            if c.deploy && c.address.is_some() {
                warn(format!(
                    "components.{}: deploy is set, preset address will be ignored",
                    kind.as_str()
                ));
            }
        }

        let unique: HashSet<_> = self.workflow.participants.iter().collect();
        if unique.len() != self.workflow.participants.len() {
            warn("workflow.participants lists a role more than once; it enters once".to_string());
        }

        if self.workflow.participant_delay_ms == 0 && !self.workflow.participants.is_empty() {
            warn("workflow.participant_delay_ms is 0; entries are submitted back to back".to_string());
        }

        warnings
    }

    /// Fail on the first error-level validation finding.
    pub fn ensure_valid(&self) -> Result<()> {
        match self
            .validate()
            .into_iter()
            .find(|w| w.level == WarnLevel::Error)
        {
            Some(w) => Err(RaffleError::Config(w.message)),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
