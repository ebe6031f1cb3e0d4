//! Auth context: session store + profile repository behind one handle
//!
//! Every view shares a clone of [`AuthContext`]. Provider calls go out from
//! here, and results come back through the [`SessionStore`].

use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::models::{AuthStateChange, Identity, SignUpOutcome};
use super::store::{SessionSnapshot, SessionStore};
use crate::common::{safe_email_log, AppError, ValidationResult, Validator};
use crate::profile::models::{Patch, Profile, ProfileUpdate};
use crate::profile::repository::ProfileRepository;
use crate::profile::validators::ProfileValidator;
use crate::services::AuthProvider;

#[derive(Clone)]
pub struct AuthContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    auth: Arc<dyn AuthProvider>,
    profiles: ProfileRepository,
    store: SessionStore,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for ContextInner {
    fn drop(&mut self) {
        if let Ok(listener) = self.listener.get_mut() {
            if let Some(handle) = listener.take() {
                handle.abort();
            }
        }
    }
}

impl AuthContext {
    /// Reads the current session once, loads (or creates) its profile, then
    /// keeps following auth-state changes until [`AuthContext::unmount`]
    pub async fn mount(auth: Arc<dyn AuthProvider>, profiles: ProfileRepository) -> Self {
        let ctx = Self {
            inner: Arc::new(ContextInner {
                auth,
                profiles,
                store: SessionStore::new(),
                listener: Mutex::new(None),
            }),
        };

        // Subscribe first so nothing published during initialization is missed
        let events = ctx.inner.auth.on_auth_state_change();
        ctx.initialize().await;
        ctx.spawn_listener(events);

        ctx
    }

    /// Stops following auth-state changes
    pub fn unmount(&self) {
        if let Ok(mut listener) = self.inner.listener.lock() {
            if let Some(handle) = listener.take() {
                handle.abort();
                debug!("Auth listener stopped");
            }
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.store.subscribe()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AppError> {
        info!(email = %safe_email_log(email), "Sign-in requested");

        let session = self
            .inner
            .auth
            .sign_in_with_password(email, password)
            .await
            .map_err(|e| {
                warn!(error = %e, email = %safe_email_log(email), "Sign-in failed");
                AppError::Provider(e)
            })?;

        let identity = session.user;
        self.inner.store.set_identity(Some(identity.clone()));
        self.load_into_store(&identity.id).await;
        self.inner.store.finish_loading();

        info!(user_id = %identity.id, "Signed in");
        Ok(identity)
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<SignUpOutcome, AppError> {
        let display_name = display_name.map(str::trim).filter(|name| !name.is_empty());

        if let Some(name) = display_name {
            let check = ProfileUpdate {
                display_name: Patch::Set(name.to_string()),
                ..ProfileUpdate::default()
            };
            let result = ProfileValidator.validate(&check);
            if !result.is_valid {
                return Err(AppError::Validation(result));
            }
        }

        info!(email = %safe_email_log(email), "Sign-up requested");
        let outcome = self.inner.auth.sign_up(email, password).await?;

        let Some(user) = outcome.user.clone() else {
            return Ok(outcome);
        };

        // Without a session (email confirmation pending) the row is still
        // created, but nothing is cached for an identity that isn't signed in
        let signed_in = outcome.session.is_some();
        if signed_in {
            self.inner.store.set_identity(Some(user.clone()));
        }

        let ticket = self.inner.store.ticket();
        match self.inner.profiles.create_profile(&user.id, display_name).await {
            Ok(profile) if signed_in => {
                self.inner.store.commit_profile(ticket, Some(profile));
            }
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, user_id = %user.id, "Failed to create profile after sign-up");
            }
        }

        if signed_in {
            self.inner.store.finish_loading();
        }

        Ok(outcome)
    }

    /// Clears identity and profile once the provider confirms, and
    /// invalidates any profile write still in flight
    pub async fn sign_out(&self) -> Result<(), AppError> {
        let user_id = self.snapshot().user_id().map(str::to_string);

        self.inner.auth.sign_out().await.map_err(|e| {
            error!(error = %e, "Sign-out failed");
            AppError::Provider(e)
        })?;

        self.inner.store.clear();
        info!(user_id = ?user_id, "Signed out");
        Ok(())
    }

    /// Validates and applies a partial update to the signed-in user's profile
    pub async fn update_profile(&self, patch: ProfileUpdate) -> Result<Profile, AppError> {
        let user_id = self
            .snapshot()
            .user_id()
            .map(str::to_string)
            .ok_or(AppError::Unauthenticated)?;

        if patch.is_empty() {
            let mut result = ValidationResult::new();
            result.add_error("general", "At least one field must be provided for update");
            return Err(AppError::Validation(result));
        }

        let result = ProfileValidator.validate(&patch);
        if !result.is_valid {
            return Err(AppError::Validation(result));
        }

        let ticket = self.inner.store.ticket();
        let updated = self.inner.profiles.update_profile(&user_id, &patch).await?;
        self.inner.store.commit_profile(ticket, Some(updated.clone()));

        info!(user_id = %user_id, "Profile updated");
        Ok(updated)
    }

    /// Reloads the signed-in user's profile from the provider
    pub async fn refresh_profile(&self) -> Result<Profile, AppError> {
        let user_id = self
            .snapshot()
            .user_id()
            .map(str::to_string)
            .ok_or(AppError::Unauthenticated)?;

        let ticket = self.inner.store.ticket();
        let profile = self.inner.profiles.load_profile(&user_id).await?;
        self.inner.store.commit_profile(ticket, Some(profile.clone()));

        Ok(profile)
    }

    async fn initialize(&self) {
        let session = match self.inner.auth.get_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Failed to read current session, starting signed out");
                None
            }
        };

        let identity = session.map(|s| s.user);
        self.inner.store.set_identity(identity.clone());

        if let Some(identity) = identity {
            self.load_into_store(&identity.id).await;
        }

        self.inner.store.finish_loading();
    }

    /// Background profile load: failures are logged and leave the profile empty
    async fn load_into_store(&self, user_id: &str) {
        let ticket = self.inner.store.ticket();

        match self.inner.profiles.load_profile(user_id).await {
            Ok(profile) => {
                self.inner.store.commit_profile(ticket, Some(profile));
            }
            Err(AppError::ProfileLookup(e)) => {
                warn!(error = %e, user_id = %user_id, "Failed to load profile");
            }
            Err(e) => {
                error!(error = %e, user_id = %user_id, "Failed to create default profile");
            }
        }
    }

    async fn handle_auth_change(&self, change: AuthStateChange) {
        debug!(event = ?change.event, "Processing auth state change");

        match change.session.map(|s| s.user) {
            Some(identity) => {
                self.inner.store.set_identity(Some(identity.clone()));
                self.load_into_store(&identity.id).await;
            }
            None => self.inner.store.clear(),
        }

        self.inner.store.finish_loading();
    }

    fn spawn_listener(&self, mut events: broadcast::Receiver<AuthStateChange>) {
        let weak: Weak<ContextInner> = Arc::downgrade(&self.inner);

        let handle = tokio::spawn(async move {
            loop {
                let received = events.recv().await;

                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let ctx = AuthContext { inner };

                match received {
                    Ok(change) => ctx.handle_auth_change(change).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Auth listener lagged, re-reading session");
                        ctx.initialize().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        if let Ok(mut listener) = self.inner.listener.lock() {
            *listener = Some(handle);
        }
    }
}
