use anyhow::{anyhow, Result};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

const DEFAULT_FILTER: &str = "info";

/// Route `log` output to a file; the terminal belongs to the UI.
pub fn init(filter: Option<&str>) -> Result<PathBuf> {
    let path = log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    env_logger::Builder::new()
        .parse_filters(filter.unwrap_or(DEFAULT_FILTER))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()?;

    Ok(path)
}

fn log_path() -> Result<PathBuf> {
    let dir = dirs::data_local_dir()
        .or_else(dirs::config_dir)
        .ok_or_else(|| anyhow!("Could not determine a directory for the log file"))?;

    Ok(dir.join("agentchat").join("agentchat.log"))
}
