//! Authentication data models

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Authenticated principal issued by the auth provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Provider-issued tokens for the signed-in identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix seconds
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: Identity,
}

impl AuthSession {
    /// Treats a session as expired a little early so in-flight calls don't race the deadline
    pub fn is_expired(&self) -> bool {
        const LEEWAY_SECS: i64 = 10;
        match self.expires_at {
            Some(expires_at) => Utc::now().timestamp() + LEEWAY_SECS >= expires_at,
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Auth-state change notification published by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStateChange {
    pub event: AuthEvent,
    pub session: Option<AuthSession>,
}

/// Result of a password sign-up.
/// `session` is absent when the provider requires email confirmation first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutcome {
    pub user: Option<Identity>,
    pub session: Option<AuthSession>,
}
