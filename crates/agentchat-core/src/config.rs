use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::mode::EndpointMode;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_RUNTIME_URL: &str = "http://localhost:8080";

pub const ENV_REGION: &str = "AGENTCHAT_REGION";
pub const ENV_RUNTIME_ARN: &str = "AGENTCHAT_RUNTIME_ARN";
pub const ENV_LOCAL_DEV: &str = "AGENTCHAT_LOCAL_DEV";
pub const ENV_RUNTIME_URL: &str = "AGENTCHAT_RUNTIME_URL";
pub const ENV_ENDPOINT_URL: &str = "AGENTCHAT_ENDPOINT_URL";
pub const ENV_ACCESS_TOKEN: &str = "AGENTCHAT_ACCESS_TOKEN";
pub const ENV_LOG: &str = "AGENTCHAT_LOG";

/// Process-wide settings, resolved once at startup and never mutated after.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub local_dev: bool,
    pub region: String,
    pub runtime_arn: Option<String>,
    /// Base URL of a locally running agent; `/invocations` is appended
    pub runtime_url: String,
    /// Replaces `https://bedrock-agentcore.<region>.amazonaws.com`
    pub endpoint_url: Option<String>,
    pub access_token: Option<String>,
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            local_dev: false,
            region: DEFAULT_REGION.to_string(),
            runtime_arn: None,
            runtime_url: DEFAULT_RUNTIME_URL.to_string(),
            endpoint_url: None,
            access_token: None,
            log_filter: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config file (if any) with environment variables layered on top
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::get_config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::new(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(region) = get(ENV_REGION) {
            self.region = region;
        }
        if let Some(arn) = get(ENV_RUNTIME_ARN) {
            self.runtime_arn = Some(arn);
        }
        if let Some(flag) = get(ENV_LOCAL_DEV) {
            self.local_dev = flag.trim().eq_ignore_ascii_case("true");
        }
        if let Some(url) = get(ENV_RUNTIME_URL) {
            self.runtime_url = url;
        }
        if let Some(url) = get(ENV_ENDPOINT_URL) {
            self.endpoint_url = Some(url);
        }
        if let Some(token) = get(ENV_ACCESS_TOKEN) {
            self.access_token = Some(token);
        }
        if let Some(filter) = get(ENV_LOG) {
            self.log_filter = Some(filter);
        }
    }

    pub fn mode(&self) -> EndpointMode {
        if self.local_dev {
            EndpointMode::Local
        } else {
            EndpointMode::Production
        }
    }

    /// Runtime ARN, treating a blank value as missing
    pub fn runtime_arn(&self) -> Option<&str> {
        self.runtime_arn
            .as_deref()
            .map(str::trim)
            .filter(|arn| !arn.is_empty())
    }

    pub fn production_endpoint(&self) -> String {
        match &self.endpoint_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://bedrock-agentcore.{}.amazonaws.com", self.region),
        }
    }

    pub fn local_invocations_url(&self) -> String {
        format!("{}/invocations", self.runtime_url.trim_end_matches('/'))
    }

    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("agentchat").join("config.json"))
    }
}
