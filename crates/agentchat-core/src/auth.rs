//! Authentication collaborator contract
//!
//! The chat client never talks to an identity service itself. It only needs a
//! way to ask who is signed in, fetch a bearer token for the agent runtime, and
//! sign out. [`TokenAuth`] covers the terminal case where the token is handed
//! to us (environment, config file, or pasted at the sign-in prompt).

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::sync::RwLock;

use crate::error::AuthError;

pub const LOCAL_DEV_EMAIL: &str = "local-dev@example.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub email: String,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn current_user(&self) -> Result<User, AuthError>;
    async fn access_token(&self) -> Option<String>;
    async fn sign_out(&self);
}

/// Local development: always signed in, never has a token.
pub struct LocalDevAuth;

#[async_trait]
impl AuthProvider for LocalDevAuth {
    async fn current_user(&self) -> Result<User, AuthError> {
        Ok(User {
            email: LOCAL_DEV_EMAIL.to_string(),
        })
    }

    async fn access_token(&self) -> Option<String> {
        None
    }

    async fn sign_out(&self) {}
}

/// Holds a JWT bearer token; identity comes from the token's claims.
#[derive(Default)]
pub struct TokenAuth {
    token: RwLock<Option<String>>,
}

impl TokenAuth {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token.filter(|t| !t.trim().is_empty())),
        }
    }

    /// Validate and store a token. The previous token is kept on failure.
    pub fn sign_in(&self, token: &str) -> Result<User, AuthError> {
        let token = token.trim();
        let user = user_from_token(token)?;
        match self.token.write() {
            Ok(mut guard) => *guard = Some(token.to_string()),
            Err(poisoned) => *poisoned.into_inner() = Some(token.to_string()),
        }
        log::info!("Signed in as {}", user.email);
        Ok(user)
    }

    fn token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl AuthProvider for TokenAuth {
    async fn current_user(&self) -> Result<User, AuthError> {
        let token = self.token().ok_or(AuthError::NotSignedIn)?;
        user_from_token(&token)
    }

    async fn access_token(&self) -> Option<String> {
        self.token()
    }

    async fn sign_out(&self) {
        match self.token.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
        log::info!("Signed out");
    }
}

/// Read the identity out of a JWT payload. The signature is not checked; the
/// agent runtime does that.
pub fn user_from_token(token: &str) -> Result<User, AuthError> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(AuthError::InvalidToken("expected a JWT".to_string())),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::InvalidToken(format!("payload is not base64: {}", e)))?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::InvalidToken(format!("payload is not JSON: {}", e)))?;

    if let Some(exp) = claims.get("exp").and_then(|v| v.as_i64()) {
        if exp <= chrono::Utc::now().timestamp() {
            return Err(AuthError::InvalidToken("token has expired".to_string()));
        }
    }

    let email = ["email", "username", "cognito:username", "sub"]
        .iter()
        .find_map(|claim| claims.get(*claim).and_then(|v| v.as_str()))
        .ok_or_else(|| AuthError::InvalidToken("no user claim".to_string()))?;

    Ok(User {
        email: email.to_string(),
    })
}

#[cfg(test)]
pub(crate) fn test_token(claims: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.sig", header, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_from_token_prefers_email() {
        let token = test_token(json!({"email": "ana@example.com", "username": "ana"}));
        assert_eq!(user_from_token(&token).unwrap().email, "ana@example.com");
    }

    #[test]
    fn test_user_from_token_falls_back_to_username() {
        let token = test_token(json!({"username": "ana", "sub": "abc"}));
        assert_eq!(user_from_token(&token).unwrap().email, "ana");
    }

    #[test]
    fn test_user_from_token_rejects_garbage() {
        assert!(user_from_token("not-a-jwt").is_err());
        assert!(user_from_token("a.!!!.c").is_err());
    }

    #[test]
    fn test_user_from_token_rejects_expired() {
        let token = test_token(json!({"email": "ana@example.com", "exp": 1}));
        assert!(matches!(
            user_from_token(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_token_auth_sign_in_and_out() {
        let auth = TokenAuth::new(None);
        assert!(auth.current_user().await.is_err());
        assert!(auth.access_token().await.is_none());

        let token = test_token(json!({"email": "ana@example.com"}));
        auth.sign_in(&token).unwrap();
        assert_eq!(auth.current_user().await.unwrap().email, "ana@example.com");
        assert_eq!(auth.access_token().await.as_deref(), Some(token.as_str()));

        auth.sign_out().await;
        assert!(matches!(auth.current_user().await, Err(AuthError::NotSignedIn)));
    }

    #[tokio::test]
    async fn test_failed_sign_in_keeps_previous_token() {
        let token = test_token(json!({"email": "ana@example.com"}));
        let auth = TokenAuth::new(Some(token.clone()));
        assert!(auth.sign_in("bogus").is_err());
        assert_eq!(auth.access_token().await, Some(token));
    }

    #[tokio::test]
    async fn test_local_dev_auth() {
        let auth = LocalDevAuth;
        assert_eq!(auth.current_user().await.unwrap().email, LOCAL_DEV_EMAIL);
        assert!(auth.access_token().await.is_none());
    }
}
