//! Configuration loading for the history directory

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use note_history::HistoryConfig;

const CONFIG_FILE: &str = "config.json";

/// Load `config.json` from the history directory.
///
/// A missing file yields the defaults, which are also written out so they
/// can be edited. Anything other than a JSON object is rejected.
pub fn load(dir: &Path) -> Result<HistoryConfig> {
    let path = dir.join(CONFIG_FILE);

    if !path.exists() {
        let config = HistoryConfig::default();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create history directory {:?}", dir))?;
        std::fs::write(&path, serde_json::to_string_pretty(&config)?)
            .with_context(|| format!("Failed to write {:?}", path))?;
        tracing::info!("Wrote default history config to {:?}", path);
        return Ok(config);
    }

    let raw =
        std::fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("{:?} is not valid JSON", path))?;
    if !value.is_object() {
        bail!("{:?} must contain a JSON object", path);
    }
    let config = HistoryConfig::deserialize(value)
        .with_context(|| format!("Invalid settings in {:?}", path))?;
    tracing::debug!("Loaded history config from {:?}", path);
    Ok(config)
}

/// Resolve the `--dir` argument, where a leading `~` stands for the home
/// directory. Paths are returned unchanged when no home directory is known.
pub fn history_dir(arg: &str) -> PathBuf {
    let home_relative = match arg {
        "~" => Some(""),
        _ => arg.strip_prefix("~/"),
    };
    match (home_relative, dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(arg),
    }
}
