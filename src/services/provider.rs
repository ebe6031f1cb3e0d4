// src/services/provider.rs
//
// Ports to the hosted backend: auth, the `profiles` relation, object storage.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::auth::models::{AuthSession, AuthStateChange, SignUpOutcome};
use crate::profile::models::{NewProfile, Profile, ProfileUpdate};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Could not decode provider response: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    /// Message safe to show in a toast
    pub fn user_message(&self) -> String {
        match self {
            ProviderError::Api { message, .. } => message.clone(),
            ProviderError::Http(_) | ProviderError::Unavailable(_) => {
                "Could not reach the server. Try again.".to_string()
            }
            _ => "Something went wrong. Try again.".to_string(),
        }
    }
}

/// Password auth plus the auth-state change feed
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Current session, if any
    async fn get_session(&self) -> Result<Option<AuthSession>, ProviderError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ProviderError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// Every receiver sees each change published after it subscribed
    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthStateChange>;
}

/// The `profiles` relation, always filtered by `user_id`
#[async_trait]
pub trait ProfileTable: Send + Sync {
    async fn select_by_user(&self, user_id: &str) -> Result<Option<Profile>, ProviderError>;

    /// Insert, or merge on `user_id` conflict. Returns the stored row.
    async fn upsert(&self, row: &NewProfile) -> Result<Option<Profile>, ProviderError>;

    /// Returns the updated row, or `None` when no row matched
    async fn update(
        &self,
        user_id: &str,
        patch: &ProfileUpdate,
    ) -> Result<Option<Profile>, ProviderError>;
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), ProviderError>;

    /// Public URL for a stored key. No network call.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}
