//! Normalized fetch results returned to callers.
//!
//! These shapes are what the fetch endpoints hand back; they are never
//! persisted. Field names follow the JSON the frontend consumes.

use serde::{Deserialize, Serialize};

/// A single inbox message, flattened from the Gmail API payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedMessage {
    /// Gmail message id.
    pub id: String,
    /// Subject header, or "No Subject".
    pub subject: String,
    /// From header, or "Unknown".
    pub from: String,
    /// Date header as sent by the provider (not reparsed).
    pub date: String,
    /// Provider-generated snippet.
    pub snippet: String,
    /// Decoded plain-text body, truncated to a bounded length.
    pub body: String,
}

/// A single course announcement, flattened from the Classroom API payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedAnnouncement {
    /// Announcement id.
    pub id: String,
    /// Id of the course this announcement belongs to.
    pub course_id: String,
    /// Display name of the course.
    pub course_name: String,
    /// Announcement text.
    pub text: String,
    /// RFC 3339 creation time as reported by the provider.
    pub creation_time: String,
    /// RFC 3339 last-update time as reported by the provider.
    pub update_time: String,
    /// Provider user id of the announcement author.
    pub creator_user_id: String,
}
