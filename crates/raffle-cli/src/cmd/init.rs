use anyhow::Context;
use raffle_core::{io, Config};
use std::path::Path;

pub fn run(path: &Path, force: bool) -> anyhow::Result<()> {
    let written = io::init_config(path, &Config::default(), force)
        .with_context(|| format!("failed to write {}", path.display()))?;
    if written {
        println!("  created: {}", path.display());
    } else {
        println!("  exists:  {}", path.display());
    }
    Ok(())
}
