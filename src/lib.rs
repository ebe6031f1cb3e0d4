// src/lib.rs
//! Client core of the Monynha Fun video-voting site: session and profile
//! state over a hosted auth/database/storage provider, plus the header and
//! profile page view models built on top of it.

pub mod auth;
pub mod common;
pub mod header;
pub mod profile;
pub mod routes;
pub mod services;

#[cfg(test)]
mod test_support;
