use crate::output::{print_json, print_table};
use anyhow::Context;
use raffle_core::workflow::Plan;
use raffle_core::{ComponentKind, Config};
use std::path::Path;

/// Print the step plan with each step's phase requirement, then fail if the
/// enabled steps cannot run in order.
pub fn run(path: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(path).context("failed to load config")?;
    config.ensure_valid()?;
    let plan = Plan::from_config(&config);

    if json {
        let end = plan.validate();
        let value = serde_json::json!({
            "plan": plan,
            "valid": end.is_ok(),
            "end_phase": end.as_ref().ok().map(|p| p.as_str()),
            "error": end.as_ref().err().map(|e| e.to_string()),
        });
        print_json(&value)?;
        end?;
        return Ok(());
    }

    let components = ComponentKind::all()
        .iter()
        .map(|kind| {
            let c = config.components.get(*kind);
            let action = if c.deploy { "deploy" } else { "attach" };
            let address = c
                .address
                .filter(|_| !c.deploy)
                .map(|a| a.to_string())
                .unwrap_or_else(|| "-".to_string());
            vec![kind.to_string(), action.to_string(), address]
        })
        .collect();
    print_table(&["COMPONENT", "ACTION", "ADDRESS"], components);
    println!();

    let end = plan.validate();
    let rows = plan
        .steps
        .iter()
        .map(|step| {
            vec![
                step.name(),
                step.actor.to_string(),
                step.kind.requires().to_string(),
                if step.enabled { "run" } else { "skip" }.to_string(),
            ]
        })
        .collect();
    print_table(&["STEP", "ACTOR", "REQUIRES", "STATE"], rows);
    println!();
    println!("start phase: {}", plan.start);
    println!("end phase:   {}", end?);
    Ok(())
}
