//! Authenticated data fetch endpoints.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use tracing::debug;

use studyflow_core::{NormalizedAnnouncement, NormalizedMessage};

use crate::auth::authenticate;
use crate::error::ApiErr;
use crate::AppState;

/// Response of the Gmail fetch endpoint.
#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    /// Most recent inbox messages, normalized.
    pub messages: Vec<NormalizedMessage>,
}

/// Response of the Classroom fetch endpoint.
#[derive(Debug, Serialize)]
pub struct AnnouncementsResponse {
    /// Recent announcements across active courses, normalized.
    pub announcements: Vec<NormalizedAnnouncement>,
}

/// GET /fetch/gmail — recent inbox messages for the calling user.
pub async fn gmail(
    State(app): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MessagesResponse>, ApiErr> {
    let google = app.google()?.clone();
    let user_id = authenticate(&app, &headers).await?;

    let messages = google.fetcher.fetch_inbox(&user_id).await?;
    debug!(user_id = %user_id, count = messages.len(), "gmail fetch complete");

    Ok(Json(MessagesResponse { messages }))
}

/// GET /fetch/classroom — recent announcements for the calling user.
pub async fn classroom(
    State(app): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AnnouncementsResponse>, ApiErr> {
    let google = app.google()?.clone();
    let user_id = authenticate(&app, &headers).await?;

    let announcements = google.fetcher.fetch_announcements(&user_id).await?;
    debug!(user_id = %user_id, count = announcements.len(), "classroom fetch complete");

    Ok(Json(AnnouncementsResponse { announcements }))
}
