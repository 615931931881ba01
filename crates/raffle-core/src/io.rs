//! Config file writes for `raffle init` and [`Config::save`].

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::config::Config;
use crate::error::Result;

/// Serialize `config` into `path` through a sibling tempfile and a rename, so
/// an interrupted write never leaves half a YAML file behind.
pub fn write_config(path: &Path, config: &Config) -> Result<()> {
    let yaml = config.to_yaml()?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(yaml.as_bytes())?;
    tmp.persist(path).map_err(|e| e.error)?;
    tracing::debug!(path = %path.display(), "config written");
    Ok(())
}

/// Write the starter config unless the user already has one at `path`.
/// `force` overwrites. Returns `false` when the existing file was kept.
pub fn init_config(path: &Path, config: &Config, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    write_config(path, config)?;
    Ok(true)
}
