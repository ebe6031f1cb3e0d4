// src/services/memory.rs
//
// In-process provider for dev mode and tests. Keeps accounts, the current
// session, profile rows and stored objects in memory, and can be told to fail
// or slow down specific operations.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use super::provider::{AuthProvider, ObjectStorage, ProfileTable, ProviderError};
use crate::auth::models::{AuthEvent, AuthSession, AuthStateChange, Identity, SignUpOutcome};
use crate::profile::models::{NewProfile, Profile, ProfileUpdate};

/// Mirrors the layout of a locally running Supabase stack
pub const MEMORY_BASE_URL: &str = "http://localhost:54321/storage/v1/object/public";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetSession,
    SignIn,
    SignUp,
    SignOut,
    SelectProfile,
    UpsertProfile,
    UpdateProfile,
    Upload,
}

#[derive(Debug, Clone)]
struct Account {
    identity: Identity,
    password: String,
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

#[derive(Clone)]
pub struct MemoryProvider {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    accounts: RwLock<HashMap<String, Account>>,
    session: RwLock<Option<AuthSession>>,
    profiles: RwLock<HashMap<String, Profile>>,
    objects: RwLock<HashMap<(String, String), StoredObject>>,
    failures: RwLock<HashMap<Operation, String>>,
    calls: RwLock<HashMap<Operation, usize>>,
    delays: RwLock<HashMap<Operation, Duration>>,
    events: broadcast::Sender<AuthStateChange>,
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(32);

        Self {
            inner: Arc::new(MemoryInner {
                accounts: RwLock::new(HashMap::new()),
                session: RwLock::new(None),
                profiles: RwLock::new(HashMap::new()),
                objects: RwLock::new(HashMap::new()),
                failures: RwLock::new(HashMap::new()),
                calls: RwLock::new(HashMap::new()),
                delays: RwLock::new(HashMap::new()),
                events,
            }),
        }
    }

    /// Registers an account without signing it in
    pub async fn add_account(&self, identity: Identity, password: &str) {
        let email = identity.email.clone().unwrap_or_else(|| identity.id.clone());
        self.inner.accounts.write().await.insert(
            email.to_lowercase(),
            Account {
                identity,
                password: password.to_string(),
            },
        );
    }

    /// Makes `identity` the current session without publishing an event,
    /// as if it had been restored from a previous run
    pub async fn restore_session(&self, identity: Identity) -> AuthSession {
        let session = issue_session(identity);
        *self.inner.session.write().await = Some(session.clone());
        session
    }

    /// Publishes an auth-state change as if it came from elsewhere (another tab, token expiry)
    pub async fn publish(&self, event: AuthEvent, identity: Option<Identity>) {
        let session = identity.map(issue_session);
        *self.inner.session.write().await = session.clone();
        self.emit(AuthStateChange { event, session });
    }

    /// Every following call of `operation` fails with `message` until cleared
    pub async fn fail(&self, operation: Operation, message: &str) {
        self.inner
            .failures
            .write()
            .await
            .insert(operation, message.to_string());
    }

    pub async fn clear_failure(&self, operation: Operation) {
        self.inner.failures.write().await.remove(&operation);
    }

    pub async fn calls(&self, operation: Operation) -> usize {
        self.inner
            .calls
            .read()
            .await
            .get(&operation)
            .copied()
            .unwrap_or(0)
    }

    /// Holds every following call of `operation` for `delay` before it runs
    pub async fn delay(&self, operation: Operation, delay: Duration) {
        self.inner.delays.write().await.insert(operation, delay);
    }

    pub async fn profile(&self, user_id: &str) -> Option<Profile> {
        self.inner.profiles.read().await.get(user_id).cloned()
    }

    pub async fn profile_count(&self) -> usize {
        self.inner.profiles.read().await.len()
    }

    pub async fn insert_profile(&self, profile: Profile) {
        self.inner
            .profiles
            .write()
            .await
            .insert(profile.user_id.clone(), profile);
    }

    pub async fn object(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        self.inner
            .objects
            .read()
            .await
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    /// Counts the call, waits out any configured delay, then fails it if a
    /// failure was injected
    async fn enter(&self, operation: Operation) -> Result<(), ProviderError> {
        *self
            .inner
            .calls
            .write()
            .await
            .entry(operation)
            .or_insert(0) += 1;

        let delay = self.inner.delays.read().await.get(&operation).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.inner.failures.read().await.get(&operation) {
            Some(message) => Err(ProviderError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn emit(&self, change: AuthStateChange) {
        debug!(event = ?change.event, "Memory provider auth event");
        let _ = self.inner.events.send(change);
    }

    async fn start_session(&self, identity: Identity) -> AuthSession {
        let session = issue_session(identity);
        *self.inner.session.write().await = Some(session.clone());
        self.emit(AuthStateChange {
            event: AuthEvent::SignedIn,
            session: Some(session.clone()),
        });
        session
    }
}

fn issue_session(identity: Identity) -> AuthSession {
    AuthSession {
        access_token: format!("memory-{}", Uuid::new_v4()),
        refresh_token: Some(format!("memory-refresh-{}", Uuid::new_v4())),
        expires_at: Some(Utc::now().timestamp() + 3600),
        user: identity,
    }
}

#[async_trait]
impl AuthProvider for MemoryProvider {
    async fn get_session(&self) -> Result<Option<AuthSession>, ProviderError> {
        self.enter(Operation::GetSession).await?;
        Ok(self.inner.session.read().await.clone())
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ProviderError> {
        self.enter(Operation::SignIn).await?;

        let account = self
            .inner
            .accounts
            .read()
            .await
            .get(&email.to_lowercase())
            .cloned();

        match account {
            Some(account) if account.password == password => {
                Ok(self.start_session(account.identity).await)
            }
            _ => Err(ProviderError::Api {
                status: 400,
                message: "Invalid login credentials".to_string(),
            }),
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, ProviderError> {
        self.enter(Operation::SignUp).await?;

        let key = email.to_lowercase();
        if self.inner.accounts.read().await.contains_key(&key) {
            return Err(ProviderError::Api {
                status: 422,
                message: "User already registered".to_string(),
            });
        }

        let identity = Identity {
            id: Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
        };
        self.add_account(identity.clone(), password).await;
        info!(user_id = %identity.id, "Memory account created");

        let session = self.start_session(identity.clone()).await;
        Ok(SignUpOutcome {
            user: Some(identity),
            session: Some(session),
        })
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.enter(Operation::SignOut).await?;

        *self.inner.session.write().await = None;
        self.emit(AuthStateChange {
            event: AuthEvent::SignedOut,
            session: None,
        });
        Ok(())
    }

    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthStateChange> {
        self.inner.events.subscribe()
    }
}

#[async_trait]
impl ProfileTable for MemoryProvider {
    async fn select_by_user(&self, user_id: &str) -> Result<Option<Profile>, ProviderError> {
        self.enter(Operation::SelectProfile).await?;
        Ok(self.inner.profiles.read().await.get(user_id).cloned())
    }

    async fn upsert(&self, row: &NewProfile) -> Result<Option<Profile>, ProviderError> {
        self.enter(Operation::UpsertProfile).await?;

        let now = Utc::now();
        let mut profiles = self.inner.profiles.write().await;
        let profile = profiles
            .entry(row.user_id.clone())
            .and_modify(|existing| {
                if let Some(name) = &row.display_name {
                    existing.display_name = Some(name.clone());
                }
                existing.role = row.role.clone();
                existing.updated_at = Some(now);
            })
            .or_insert_with(|| Profile {
                id: Some(Uuid::new_v4().to_string()),
                user_id: row.user_id.clone(),
                display_name: row.display_name.clone(),
                bio: None,
                avatar_url: None,
                role: row.role.clone(),
                created_at: Some(now),
                updated_at: Some(now),
            });

        Ok(Some(profile.clone()))
    }

    async fn update(
        &self,
        user_id: &str,
        patch: &ProfileUpdate,
    ) -> Result<Option<Profile>, ProviderError> {
        self.enter(Operation::UpdateProfile).await?;

        let mut profiles = self.inner.profiles.write().await;
        Ok(profiles.get_mut(user_id).map(|profile| {
            patch.apply_to(profile);
            profile.updated_at = Some(Utc::now());
            profile.clone()
        }))
    }
}

#[async_trait]
impl ObjectStorage for MemoryProvider {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), ProviderError> {
        self.enter(Operation::Upload).await?;

        let key = (bucket.to_string(), path.to_string());
        let mut objects = self.inner.objects.write().await;
        if objects.contains_key(&key) {
            return Err(ProviderError::Api {
                status: 409,
                message: "The resource already exists".to_string(),
            });
        }

        objects.insert(
            key,
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{}/{}", MEMORY_BASE_URL, bucket, path)
    }
}
