use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::auth::AuthProvider;
use crate::config::Config;
use crate::error::{AgentError, InvocationError};
use crate::mode::EndpointMode;

pub const SESSION_ID_HEADER: &str = "X-Amzn-Bedrock-AgentCore-Runtime-Session-Id";
pub const TRACE_ID_HEADER: &str = "X-Amzn-Trace-Id";
pub const NO_RESPONSE: &str = "No response from agent";

/// Reply fields checked in priority order
pub const RESPONSE_FIELDS: [&str; 5] = ["response", "content", "text", "message", "output"];

#[derive(Serialize)]
struct InvokeRequest<'a> {
    prompt: &'a str,
}

/// Anything that can answer a prompt. One call, one reply, no session state.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<String, InvocationError>;
}

#[derive(Clone)]
pub struct AgentClient {
    client: Client,
    config: Config,
    auth: Arc<dyn AuthProvider>,
}

impl AgentClient {
    pub fn new(config: Config, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            client: Client::new(),
            config,
            auth,
        }
    }

    async fn try_invoke(&self, prompt: &str) -> Result<String, AgentError> {
        let mode = self.config.mode();
        let label = mode.error_label();

        let request = match mode {
            EndpointMode::Local => {
                let url = self.config.local_invocations_url();
                log::debug!("Invoking local AgentCore: {}", url);
                self.client.post(&url)
            }
            EndpointMode::Production => self.production_request().await?,
        };
        log::debug!("Request payload: {} chars", prompt.len());

        let response = request.json(&InvokeRequest { prompt }).send().await?;
        let status = response.status();
        log::info!("{} response status: {}", label, status);

        let body = response.text().await?;

        if !status.is_success() {
            log::error!("{} error response: {}", label, body);
            return Err(AgentError::Transport {
                label,
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            });
        }

        let data: Value = serde_json::from_str(&body).map_err(|e| {
            log::error!("Failed to parse JSON response: {}", e);
            AgentError::Decoding {
                label,
                body: body.clone(),
            }
        })?;

        let text = normalize_response(&data);
        log::debug!("Final response text: {} chars", text.len());
        Ok(text)
    }

    /// Fails before any network I/O when the ARN or token is missing.
    async fn production_request(&self) -> Result<RequestBuilder, AgentError> {
        let arn = self.config.runtime_arn().ok_or_else(|| {
            AgentError::Configuration(
                "AgentCore Runtime ARN not configured. Please check deployment.".to_string(),
            )
        })?;

        let token = self.auth.access_token().await.ok_or_else(|| {
            AgentError::Authentication("Not authenticated - no access token available".to_string())
        })?;

        let url = runtime_url(&self.config.production_endpoint(), arn);
        log::debug!("Invoking AgentCore: {} ({})", url, self.config.region);

        Ok(self
            .client
            .post(&url)
            .bearer_auth(token)
            .header(SESSION_ID_HEADER, session_id())
            .header(TRACE_ID_HEADER, trace_id()))
    }
}

#[async_trait]
impl Agent for AgentClient {
    async fn invoke(&self, prompt: &str) -> Result<String, InvocationError> {
        self.try_invoke(prompt).await.map_err(|e| {
            log::error!("AgentCore invocation error: {}", e);
            InvocationError::from(e)
        })
    }
}

pub fn runtime_url(endpoint: &str, runtime_arn: &str) -> String {
    format!(
        "{}/runtimes/{}/invocations?qualifier=DEFAULT",
        endpoint.trim_end_matches('/'),
        urlencoding::encode(runtime_arn)
    )
}

/// New per call, so the runtime treats every turn as its own session.
pub fn session_id() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "testsession{}{}",
        chrono::Utc::now().timestamp_millis(),
        &suffix[..13]
    )
}

pub fn trace_id() -> String {
    format!("trace-{}", chrono::Utc::now().timestamp_millis())
}

/// Collapse whatever the agent sent back into display text.
pub fn normalize_response(data: &Value) -> String {
    match data {
        Value::String(text) => text.clone(),
        Value::Object(fields) => RESPONSE_FIELDS
            .iter()
            .find_map(|name| fields.get(*name).and_then(field_text))
            .unwrap_or_else(|| data.to_string()),
        Value::Array(_) => data.to_string(),
        _ => NO_RESPONSE.to_string(),
    }
}

/// Null, empty, false and zero don't count as present
fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_string_verbatim() {
        assert_eq!(normalize_response(&json!("  hi there ")), "  hi there ");
    }

    #[test]
    fn test_normalize_response_field_wins() {
        let data = json!({"output": "o", "content": "c", "response": "r"});
        assert_eq!(normalize_response(&data), "r");
    }

    #[test]
    fn test_normalize_content_only() {
        assert_eq!(normalize_response(&json!({"content": "from content"})), "from content");
    }

    #[test]
    fn test_normalize_priority_order() {
        assert_eq!(normalize_response(&json!({"message": "m", "text": "t"})), "t");
        assert_eq!(normalize_response(&json!({"output": "o", "message": "m"})), "m");
        assert_eq!(normalize_response(&json!({"output": "o", "other": 1})), "o");
    }

    #[test]
    fn test_normalize_skips_empty_fields() {
        let data = json!({"response": "", "content": null, "text": "t"});
        assert_eq!(normalize_response(&data), "t");
    }

    #[test]
    fn test_normalize_serializes_non_string_field() {
        assert_eq!(normalize_response(&json!({"output": {"a": 1}})), r#"{"a":1}"#);
    }

    #[test]
    fn test_normalize_unknown_object_serialized() {
        assert_eq!(normalize_response(&json!({"answer": 42})), r#"{"answer":42}"#);
    }

    #[test]
    fn test_normalize_other_shapes() {
        assert_eq!(normalize_response(&json!(null)), NO_RESPONSE);
        assert_eq!(normalize_response(&json!(12)), NO_RESPONSE);
        assert_eq!(normalize_response(&json!(true)), NO_RESPONSE);
        assert_eq!(normalize_response(&json!(["a", "b"])), r#"["a","b"]"#);
    }

    #[test]
    fn test_runtime_url_encodes_arn() {
        let url = runtime_url(
            "https://bedrock-agentcore.us-east-1.amazonaws.com",
            "arn:aws:bedrock-agentcore:us-east-1:123456789012:runtime/my_agent-abc",
        );
        assert_eq!(
            url,
            "https://bedrock-agentcore.us-east-1.amazonaws.com/runtimes/\
             arn%3Aaws%3Abedrock-agentcore%3Aus-east-1%3A123456789012%3Aruntime%2Fmy_agent-abc\
             /invocations?qualifier=DEFAULT"
        );
    }

    #[test]
    fn test_session_ids_are_long_and_distinct() {
        let a = session_id();
        let b = session_id();
        assert!(a.starts_with("testsession"));
        assert!(a.len() >= 33);
        assert_ne!(a, b);
    }

    #[test]
    fn test_trace_id_format() {
        let id = trace_id();
        let millis = id.strip_prefix("trace-").unwrap();
        assert!(millis.parse::<i64>().is_ok());
    }
}
