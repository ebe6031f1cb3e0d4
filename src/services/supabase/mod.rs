// src/services/supabase/mod.rs
//
// HTTP client for a Supabase-compatible backend. One client serves all three
// provider ports and shares the signed-in session between them.

mod auth;
mod database;
mod storage;

use reqwest::{Client, RequestBuilder, Response};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use super::provider::{AuthProvider, ProviderError};
use crate::auth::models::{AuthEvent, AuthSession, AuthStateChange};

const AUTH_EVENT_CAPACITY: usize = 32;

#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    url: String,
    anon_key: String,
    session: RwLock<Option<AuthSession>>,
    /// Serializes refresh-token exchanges so a rotated token is used once
    refresh_lock: Mutex<()>,
    session_file: Option<PathBuf>,
    events: broadcast::Sender<AuthStateChange>,
}

impl SupabaseClient {
    pub fn new(
        url: &str,
        anon_key: &str,
        timeout: Duration,
        session_file: Option<PathBuf>,
    ) -> Result<Self, ProviderError> {
        if url.is_empty() || anon_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "project URL and anon key are required".to_string(),
            ));
        }

        let http = Client::builder().timeout(timeout).build()?;
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                url: url.trim_end_matches('/').to_string(),
                anon_key: anon_key.to_string(),
                session: RwLock::new(None),
                refresh_lock: Mutex::new(()),
                session_file,
                events,
            }),
        })
    }

    /// Loads a previously persisted session. A missing or unreadable file means "signed out".
    pub async fn restore_session(&self) -> Option<AuthSession> {
        let path = self.inner.session_file.as_ref()?;

        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Failed to read session file");
                return None;
            }
        };

        match serde_json::from_slice::<AuthSession>(&raw) {
            Ok(session) => {
                debug!(user_id = %session.user.id, "Restored persisted session");
                *self.inner.session.write().await = Some(session.clone());
                Some(session)
            }
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Ignoring malformed session file");
                None
            }
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.inner.url, path)
    }

    /// Adds the project key and the caller's bearer token (anon key when
    /// signed out). An expired session is refreshed first.
    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ProviderError> {
        let token = match bearer_for(self.current_session().await.as_ref()) {
            Bearer::Anonymous => self.inner.anon_key.clone(),
            Bearer::Access(token) => token,
            Bearer::Renew => self
                .get_session()
                .await?
                .map(|s| s.access_token)
                .unwrap_or_else(|| self.inner.anon_key.clone()),
        };

        Ok(request
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(token))
    }

    async fn current_session(&self) -> Option<AuthSession> {
        self.inner.session.read().await.clone()
    }

    /// Replaces the session, persists it, then notifies subscribers
    async fn set_session(&self, session: Option<AuthSession>, event: AuthEvent) {
        *self.inner.session.write().await = session.clone();

        if let Err(e) = self.persist(session.as_ref()).await {
            error!(error = %e, "Failed to persist session");
        }

        self.emit(AuthStateChange { event, session });
    }

    async fn persist(&self, session: Option<&AuthSession>) -> Result<(), ProviderError> {
        let Some(path) = self.inner.session_file.as_ref() else {
            return Ok(());
        };

        match session {
            Some(session) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
                let raw = serde_json::to_vec_pretty(session)
                    .map_err(|e| ProviderError::Decode(e.to_string()))?;
                write_private(path, &raw).await?;
            }
            None => match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }

        Ok(())
    }

    fn emit(&self, change: AuthStateChange) {
        info!(event = ?change.event, signed_in = change.session.is_some(), "Auth state changed");
        // No receivers is fine: nothing is mounted yet
        let _ = self.inner.events.send(change);
    }
}

/// Writes the session file readable by its owner only
async fn write_private(path: &Path, raw: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(raw).await?;
    file.flush().await
}

/// Bearer token decision for the cached session
#[derive(Debug, PartialEq, Eq)]
enum Bearer {
    Anonymous,
    Access(String),
    /// Expired: go through `get_session`, which refreshes or signs out
    Renew,
}

fn bearer_for(session: Option<&AuthSession>) -> Bearer {
    match session {
        None => Bearer::Anonymous,
        Some(session) if session.is_expired() => Bearer::Renew,
        Some(session) => Bearer::Access(session.access_token.clone()),
    }
}

/// Turns a non-2xx response into a provider error, keeping the server's message
async fn check(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });

    warn!(http_status = %status, message = %message, "Provider request failed");

    Err(ProviderError::Api {
        status: status.as_u16(),
        message,
    })
}

/// GoTrue, PostgREST and Storage each name the message field differently
fn error_message(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;

    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| json.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ProviderError::Decode(e.to_string()))
}
