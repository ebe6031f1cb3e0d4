//! Session store: the single writer for the in-memory (identity, profile, loading) state
//!
//! Views read snapshots or subscribe to changes; only the auth context writes.
//! Profile writes carry a [`WriteTicket`] taken before the provider call, so a
//! response that lands after a newer write (or after the identity changed) is
//! dropped instead of overwriting fresher state, unless the row it carries
//! was written after the cached one.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::debug;

use super::models::Identity;
use crate::profile::models::Profile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub identity: Option<Identity>,
    pub profile: Option<Profile>,
    pub loading: bool,
    /// Bumped on every published change
    pub version: u64,
    epoch: u64,
    profile_seq: u64,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.id.as_str())
    }

    pub fn email(&self) -> Option<&str> {
        self.identity.as_ref().and_then(|i| i.email.as_deref())
    }
}

/// Tags one profile write: the identity epoch it was issued under and its order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteTicket {
    epoch: u64,
    seq: u64,
}

pub struct SessionStore {
    tx: watch::Sender<SessionSnapshot>,
    next_seq: AtomicU64,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SessionSnapshot {
            identity: None,
            profile: None,
            loading: true,
            version: 0,
            epoch: 0,
            profile_seq: 0,
        });

        Self {
            tx,
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// Ticket for a profile write that is about to start
    pub fn ticket(&self) -> WriteTicket {
        WriteTicket {
            epoch: self.tx.borrow().epoch,
            seq: self.next_seq.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }

    /// Replaces the identity. A different user (or none) starts a new epoch
    /// and drops the cached profile.
    pub(crate) fn set_identity(&self, identity: Option<Identity>) {
        self.tx.send_if_modified(|state| {
            if state.identity == identity {
                return false;
            }

            let same_user = state.user_id() == identity.as_ref().map(|i| i.id.as_str());
            if !same_user {
                state.epoch += 1;
                state.profile = None;
            }

            state.identity = identity;
            state.version += 1;
            true
        });
    }

    /// Applies a profile result if its ticket is still current.
    /// Returns whether the ticket was accepted.
    pub(crate) fn commit_profile(&self, ticket: WriteTicket, profile: Option<Profile>) -> bool {
        let mut accepted = false;

        self.tx.send_if_modified(|state| {
            if ticket.epoch != state.epoch {
                return false;
            }
            if ticket.seq <= state.profile_seq && !is_newer_row(&profile, &state.profile) {
                return false;
            }

            accepted = true;
            state.profile_seq = state.profile_seq.max(ticket.seq);

            if state.profile == profile {
                return false;
            }

            state.profile = profile;
            state.version += 1;
            true
        });

        if !accepted {
            debug!(
                ticket_epoch = ticket.epoch,
                ticket_seq = ticket.seq,
                "Discarded stale profile write"
            );
        }

        accepted
    }

    pub(crate) fn finish_loading(&self) {
        self.tx.send_if_modified(|state| {
            if !state.loading {
                return false;
            }
            state.loading = false;
            state.version += 1;
            true
        });
    }

    /// Drops identity and profile and invalidates every outstanding ticket
    pub(crate) fn clear(&self) {
        self.tx.send_modify(|state| {
            state.identity = None;
            state.profile = None;
            state.epoch += 1;
            state.version += 1;
        });
    }
}

/// A late response still wins when the row it carries was written after
/// the cached one
fn is_newer_row(incoming: &Option<Profile>, cached: &Option<Profile>) -> bool {
    let written = |p: &Option<Profile>| p.as_ref().and_then(|p| p.updated_at);
    match (written(incoming), written(cached)) {
        (Some(incoming), Some(cached)) => incoming > cached,
        _ => false,
    }
}
