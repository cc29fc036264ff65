//! Credential persistence.
//!
//! This crate owns the two durable tables of the OAuth core:
//!
//! - `credentials` — at most one row per (user, provider), holding the
//!   access token, the optional refresh token, and the absolute expiry.
//!   All writes go through upsert-on-conflict keyed on that pair.
//! - `oauth_states` — single-use authorization state nonces binding a
//!   pending consent flow to the user who started it.
//!
//! Two backends implement the same traits: [`SqliteStore`] for the real
//! service and [`MemoryStore`] for tests. Callers depend on the traits
//! ([`CredentialStore`], [`StateStore`]) so the backend is swappable.

pub mod credential;
pub mod error;
pub mod memory;
pub mod sqlite;
pub mod state;
pub mod store;

pub use credential::{Credential, TokenWrite};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use state::AuthState;
pub use store::{CredentialStore, StateStore};
