//! One orchestrated run: validate, connect, resolve, wire, drive, poll.

use chrono::Utc;
use evm_client::Provider;

use crate::actor::{load_wallets, ActorRegistry};
use crate::artifact::ArtifactDir;
use crate::component::{ComponentDescriptor, Resolver};
use crate::config::Config;
use crate::error::{RaffleError, Result};
use crate::ledger::{Ledger, RpcLedger};
use crate::report::RunReport;
use crate::status::StatusPoller;
use crate::wiring;
use crate::workflow::{Driver, Plan, RaffleParams};

/// Everything that can be checked without touching the network.
///
/// Returns the validated step plan.
pub fn prepare(config: &Config) -> Result<Plan> {
    config.ensure_valid()?;
    let plan = Plan::from_config(config);
    let end = plan.validate()?;
    tracing::debug!(steps = plan.enabled().count(), end = %end, "plan validated");
    Ok(plan)
}

/// Build the RPC ledger and the actor registry from `config`, resolving the
/// RPC URL and private keys through `lookup`.
pub async fn connect<F>(config: &Config, lookup: F) -> Result<(RpcLedger, ActorRegistry)>
where
    F: Fn(&str) -> Option<String>,
{
    let env = &config.network.rpc_url_env;
    let url = lookup(env)
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| RaffleError::MissingEnv(env.clone()))?;
    let wallets = load_wallets(&config.actors, &lookup)?;
    let actors = ActorRegistry::from_wallets(&wallets)?;
    let poll = std::time::Duration::from_millis(config.network.poll_interval_ms);
    let provider = Provider::connect(url, config.network.chain_id, poll).await?;
    tracing::info!(chain_id = provider.chain_id(), actors = actors.iter().count(), "connected");
    Ok((RpcLedger::new(provider, wallets.into_iter().map(|(_, w)| w)), actors))
}

/// Execute a prepared plan against `ledger`.
pub async fn execute<L: Ledger>(
    config: &Config,
    plan: &Plan,
    ledger: &L,
    actors: &ActorRegistry,
) -> Result<RunReport> {
    let started_at = Utc::now();
    let owner = actors.owner()?;
    for actor in actors.iter() {
        tracing::debug!(index = actor.index, actor = %actor.role, address = %actor.address, "actor");
    }

    let artifacts = ArtifactDir::new(&config.network.artifacts_dir);
    tracing::debug!(dir = %artifacts.root().display(), "artifacts");
    let descriptors = ComponentDescriptor::from_config(config);
    let components = Resolver::new(ledger, owner, &artifacts)
        .with_explorer(config.network.explorer_url.as_deref())
        .resolve_all(&descriptors)
        .await?;

    let wired = wiring::wire(ledger, owner, &components, &config.wiring).await?;

    let params = RaffleParams::from_config(config)?;
    let drive = Driver::new(ledger, actors, &components, params)
        .run(plan)
        .await?;

    let status = if config.status.raffle_info {
        Some(
            StatusPoller::new(ledger, &components)
                .poll(drive.raffle_id, drive.token_id)
                .await?,
        )
    } else {
        None
    };

    Ok(RunReport::new(
        started_at,
        components.iter().copied().collect(),
        wired,
        drive,
        status,
    ))
}
