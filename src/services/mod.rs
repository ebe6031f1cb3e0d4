// src/services/mod.rs
//
// Provider ports and their implementations: the hosted Supabase backend and
// the in-memory stand-in used by dev mode and tests

pub mod memory;
pub mod provider;
pub mod supabase;

// Re-export commonly used types for convenience
pub use memory::{MemoryProvider, Operation};
pub use provider::{AuthProvider, ObjectStorage, ProfileTable, ProviderError};
pub use supabase::SupabaseClient;
