//! Provider plumbing: OAuth client, token refresher, data fetchers.
//!
//! This crate implements the token lifecycle for connected Google
//! services and the authenticated fetch path built on top of it:
//!
//! - [`OAuthClient`] - authorization URL building, code exchange, refresh
//! - [`TokenRefresher`] - expiry detection and transparent refresh
//! - [`AuthenticatedFetcher`] - refresh-then-fetch with normalized output
//! - [`ProviderError`] - error taxonomy shared by all of the above
//!
//! # Architecture
//!
//! ```text
//!  start ──► OAuthClient::authorize_url ──► (user consent, external)
//!                                               │
//!  callback ◄───────────────────────────────────┘
//!     │ OAuthClient::exchange_code
//!     ▼
//!  CredentialStore (one row per user × provider)
//!     ▲                    │
//!     │ update             │ read
//!     │                    ▼
//!  TokenRefresher ◄── AuthenticatedFetcher ──► Gmail / Classroom APIs
//!                                               │
//!                                               ▼
//!                          NormalizedMessage / NormalizedAnnouncement
//! ```

pub mod classroom;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod gmail;
pub mod oauth;
pub mod refresher;

// Re-export main types at crate root
pub use classroom::ClassroomClient;
pub use config::OAuthConfig;
pub use error::{ErrorCode, ProviderError, ProviderResult};
pub use fetcher::{
    AuthenticatedFetcher, ANNOUNCEMENTS_PER_COURSE, COURSE_LIMIT, INBOX_DETAIL_MAX, INBOX_LIST_MAX,
};
pub use gmail::GmailClient;
pub use oauth::{generate_state, OAuthClient, RefreshedToken, TokenSet};
pub use refresher::TokenRefresher;
