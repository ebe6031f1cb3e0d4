//! # Auth Module
//!
//! Session handling for the client:
//! - Identity and provider session models
//! - The session store (single writer, snapshot + subscription)
//! - The auth context: sign-in, sign-up, sign-out and profile updates

pub mod context;
pub mod models;
pub mod store;


pub use context::AuthContext;
pub use models::{AuthEvent, AuthSession, AuthStateChange, Identity, SignUpOutcome};
pub use store::{SessionSnapshot, SessionStore};
