// src/services/supabase/auth.rs
//
// GoTrue endpoints: password grant, sign-up, logout, refresh.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{check, decode, SupabaseClient};
use crate::auth::models::{AuthEvent, AuthSession, AuthStateChange, Identity, SignUpOutcome};
use crate::common::safe_email_log;
use crate::services::provider::{AuthProvider, ProviderError};

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl From<UserPayload> for Identity {
    fn from(user: UserPayload) -> Self {
        Identity {
            id: user.id,
            email: user.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenPayload {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: UserPayload,
}

impl From<TokenPayload> for AuthSession {
    fn from(token: TokenPayload) -> Self {
        let expires_at = token
            .expires_at
            .or_else(|| token.expires_in.map(|secs| Utc::now().timestamp() + secs));

        AuthSession {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at,
            user: token.user.into(),
        }
    }
}

/// Sign-up answers with a full token payload when email confirmation is off,
/// and with the bare user otherwise
fn parse_sign_up(body: serde_json::Value) -> Result<SignUpOutcome, ProviderError> {
    if body.get("access_token").is_some() {
        let token: TokenPayload =
            serde_json::from_value(body).map_err(|e| ProviderError::Decode(e.to_string()))?;
        let session = AuthSession::from(token);
        return Ok(SignUpOutcome {
            user: Some(session.user.clone()),
            session: Some(session),
        });
    }

    let nested = body.get("user").filter(|u| !u.is_null()).cloned();
    let user = match nested {
        Some(user) => Some(user),
        None if body.get("id").is_some() => Some(body),
        None => None,
    };

    let user = user
        .map(serde_json::from_value::<UserPayload>)
        .transpose()
        .map_err(|e| ProviderError::Decode(e.to_string()))?;

    Ok(SignUpOutcome {
        user: user.map(Identity::from),
        session: None,
    })
}

impl SupabaseClient {
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, ProviderError> {
        let request = self
            .inner
            .http
            .post(self.endpoint("/auth/v1/token?grant_type=refresh_token"))
            .header("apikey", &self.inner.anon_key)
            .json(&json!({ "refresh_token": refresh_token }));

        let response = check(request.send().await?).await?;
        let token: TokenPayload = decode(response).await?;
        Ok(token.into())
    }
}

#[async_trait]
impl AuthProvider for SupabaseClient {
    async fn get_session(&self) -> Result<Option<AuthSession>, ProviderError> {
        let _refreshing = self.inner.refresh_lock.lock().await;

        let Some(session) = self.current_session().await else {
            return Ok(None);
        };

        if !session.is_expired() {
            return Ok(Some(session));
        }

        let Some(refresh_token) = session.refresh_token.clone() else {
            debug!(user_id = %session.user.id, "Session expired without refresh token");
            self.set_session(None, AuthEvent::SignedOut).await;
            return Ok(None);
        };

        match self.refresh_session(&refresh_token).await {
            Ok(refreshed) => {
                info!(user_id = %refreshed.user.id, "Session refreshed");
                self.set_session(Some(refreshed.clone()), AuthEvent::TokenRefreshed)
                    .await;
                Ok(Some(refreshed))
            }
            Err(ProviderError::Api { status, message }) if (400..500).contains(&status) => {
                warn!(http_status = status, message = %message, "Refresh token rejected, signing out");
                self.set_session(None, AuthEvent::SignedOut).await;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ProviderError> {
        debug!(email = %safe_email_log(email), "Password sign-in");

        let request = self
            .inner
            .http
            .post(self.endpoint("/auth/v1/token?grant_type=password"))
            .header("apikey", &self.inner.anon_key)
            .json(&json!({ "email": email, "password": password }));

        let response = check(request.send().await?).await?;
        let token: TokenPayload = decode(response).await?;
        let session = AuthSession::from(token);

        self.set_session(Some(session.clone()), AuthEvent::SignedIn)
            .await;
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, ProviderError> {
        debug!(email = %safe_email_log(email), "Password sign-up");

        let request = self
            .inner
            .http
            .post(self.endpoint("/auth/v1/signup"))
            .header("apikey", &self.inner.anon_key)
            .json(&json!({ "email": email, "password": password }));

        let response = check(request.send().await?).await?;
        let body: serde_json::Value = decode(response).await?;
        let outcome = parse_sign_up(body)?;

        if let Some(session) = &outcome.session {
            self.set_session(Some(session.clone()), AuthEvent::SignedIn)
                .await;
        }

        Ok(outcome)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        if self.current_session().await.is_some() {
            let request = self
                .authorized(self.inner.http.post(self.endpoint("/auth/v1/logout")))
                .await?;

            match check(request.send().await?).await {
                Ok(_) => {}
                // Token already dead server-side: still sign out locally
                Err(ProviderError::Api { status, .. }) if matches!(status, 401 | 403 | 404) => {
                    debug!(http_status = status, "Logout with stale token");
                }
                Err(e) => return Err(e),
            }
        }

        self.set_session(None, AuthEvent::SignedOut).await;
        Ok(())
    }

    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthStateChange> {
        self.inner.events.subscribe()
    }
}
