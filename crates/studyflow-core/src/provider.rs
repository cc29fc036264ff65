//! Provider identity and the per-provider OAuth scope table.
//!
//! Every connectable Google service is represented by a [`Provider`] value.
//! The scope set, display name, and wire name for each provider live here so
//! that the authorization initiator and the token refresher stay
//! provider-agnostic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Read-only Gmail scope.
pub const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";

/// Read-only Classroom course list scope.
pub const CLASSROOM_COURSES_SCOPE: &str =
    "https://www.googleapis.com/auth/classroom.courses.readonly";

/// Read-only Classroom announcements scope.
pub const CLASSROOM_ANNOUNCEMENTS_SCOPE: &str =
    "https://www.googleapis.com/auth/classroom.announcements.readonly";

/// A connectable third-party data source.
///
/// Serialized in lowercase ("gmail", "classroom") both in API payloads and
/// in the credential store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Gmail inbox access.
    Gmail,
    /// Google Classroom courses and announcements.
    Classroom,
}

impl Provider {
    /// All supported providers.
    pub const ALL: [Provider; 2] = [Provider::Gmail, Provider::Classroom];

    /// The wire name used in API payloads and store rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gmail => "gmail",
            Provider::Classroom => "classroom",
        }
    }

    /// Human-readable name for user-facing messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Gmail => "Gmail",
            Provider::Classroom => "Google Classroom",
        }
    }

    /// OAuth scopes requested when connecting this provider.
    ///
    /// All scopes are read-only; the order is stable so that authorization
    /// URLs for the same provider are byte-identical across calls.
    pub fn scopes(&self) -> &'static [&'static str] {
        match self {
            Provider::Gmail => &[GMAIL_READONLY_SCOPE],
            Provider::Classroom => &[CLASSROOM_COURSES_SCOPE, CLASSROOM_ANNOUNCEMENTS_SCOPE],
        }
    }

    /// Scopes joined with spaces, as they appear in the `scope` query
    /// parameter of the authorization URL.
    pub fn scope_param(&self) -> String {
        self.scopes().join(" ")
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unrecognized provider name.
#[derive(Debug, Clone, Error)]
#[error("unknown provider: {0:?}")]
pub struct UnknownProvider(pub String);

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gmail" => Ok(Provider::Gmail),
            "classroom" => Ok(Provider::Classroom),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}
