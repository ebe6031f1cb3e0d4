// Shared fixtures for unit tests

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AuthContext, Identity, SessionSnapshot};
use crate::profile::repository::ProfileRepository;
use crate::services::MemoryProvider;

pub fn identity(id: &str) -> Identity {
    Identity {
        id: id.to_string(),
        email: Some(format!("{}@example.com", id)),
    }
}

pub async fn mount(provider: &MemoryProvider) -> AuthContext {
    let repository = ProfileRepository::new(Arc::new(provider.clone()));
    AuthContext::mount(Arc::new(provider.clone()), repository).await
}

/// Waits (up to a second) for the store to satisfy `predicate`
pub async fn wait_until<F>(ctx: &AuthContext, predicate: F) -> SessionSnapshot
where
    F: Fn(&SessionSnapshot) -> bool,
{
    let mut rx = ctx.subscribe();

    tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            {
                let snapshot = rx.borrow_and_update();
                if predicate(&snapshot) {
                    return snapshot.clone();
                }
            }
            rx.changed().await.expect("session store dropped");
        }
    })
    .await
    .expect("session store never reached the expected state")
}
