#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointMode {
    Local,
    Production,
}

impl EndpointMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointMode::Local => "local",
            EndpointMode::Production => "production",
        }
    }

    /// Label used in invocation error messages
    pub fn error_label(&self) -> &'static str {
        match self {
            EndpointMode::Local => "Local AgentCore",
            EndpointMode::Production => "AgentCore",
        }
    }
}
