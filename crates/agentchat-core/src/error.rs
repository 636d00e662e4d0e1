use thiserror::Error;

/// Failures inside a single agent invocation
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{label} invocation failed: {status} {reason} - {body}")]
    Transport {
        label: &'static str,
        status: u16,
        reason: String,
        body: String,
    },

    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid JSON response from {label}: {body}")]
    Decoding { label: &'static str, body: String },
}

/// The one error shape callers of the agent client ever see
#[derive(Debug, Error)]
#[error("Failed to invoke agent: {source}")]
pub struct InvocationError {
    #[from]
    source: AgentError,
}

impl InvocationError {
    pub fn kind(&self) -> &AgentError {
        &self.source
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("Invalid access token: {0}")]
    InvalidToken(String),
}

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Clipboard not available")]
    Unavailable,

    #[error("Failed to write to clipboard: {0}")]
    Write(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}
