use crate::output::print_json;
use anyhow::Context;
use raffle_core::{run, Config};
use std::path::Path;

pub fn run(path: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(path).context("failed to load config")?;
    for w in config
        .validate()
        .iter()
        .filter(|w| w.level == raffle_core::config::WarnLevel::Warning)
    {
        tracing::warn!("{}", w.message);
    }
    // Nothing below this point runs for an invalid config or plan.
    let plan = run::prepare(&config)?;

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(async {
        let (ledger, actors) = run::connect(&config, |name| std::env::var(name).ok())
            .await
            .context("failed to connect to the ledger")?;
        if !json {
            println!("=== START ===");
        }
        let report = run::execute(&config, &plan, &ledger, &actors).await?;
        anyhow::Ok(report)
    })?;

    if json {
        print_json(&report)?;
    } else {
        for line in report.lines() {
            println!("{line}");
        }
        println!("=== END ===");
    }
    Ok(())
}
