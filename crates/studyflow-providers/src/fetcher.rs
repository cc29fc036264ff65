//! Authenticated fetch: obtain a usable token, call the provider, return
//! normalized results.
//!
//! The fetcher never writes the credential store itself; all token
//! mutation goes through the [`TokenRefresher`]. Result sizes are bounded
//! by the constants below to protect downstream consumers and limit call
//! volume.

use std::sync::Arc;

use studyflow_core::{NormalizedAnnouncement, NormalizedMessage, Provider};
use studyflow_store::CredentialStore;

use crate::classroom::ClassroomClient;
use crate::error::{ProviderError, ProviderResult};
use crate::gmail::GmailClient;
use crate::oauth::OAuthClient;
use crate::refresher::TokenRefresher;

/// How many inbox message ids are listed.
pub const INBOX_LIST_MAX: usize = 10;

/// How many of the listed messages get a full detail fetch.
pub const INBOX_DETAIL_MAX: usize = 5;

/// How many courses are considered for announcements.
pub const COURSE_LIMIT: usize = 3;

/// Announcements fetched per course.
pub const ANNOUNCEMENTS_PER_COURSE: usize = 5;

/// Per-provider authenticated fetcher.
pub struct AuthenticatedFetcher {
    refresher: TokenRefresher,
    http_client: reqwest::Client,
    gmail_base_url: String,
    classroom_base_url: String,
}

impl AuthenticatedFetcher {
    /// Creates a fetcher sharing the OAuth client's configuration.
    pub fn new(store: Arc<dyn CredentialStore>, oauth: Arc<OAuthClient>) -> ProviderResult<Self> {
        let config = oauth.config();
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                ProviderError::configuration("failed to create HTTP client").with_source(e)
            })?;
        let gmail_base_url = config.gmail_base_url.clone();
        let classroom_base_url = config.classroom_base_url.clone();

        Ok(Self {
            refresher: TokenRefresher::new(store, oauth),
            http_client,
            gmail_base_url,
            classroom_base_url,
        })
    }

    /// Fetches the most recent inbox messages for a user.
    pub async fn fetch_inbox(&self, user_id: &str) -> ProviderResult<Vec<NormalizedMessage>> {
        let token = self
            .refresher
            .access_token(user_id, Provider::Gmail)
            .await?;
        let client = GmailClient::new(self.http_client.clone(), &self.gmail_base_url, token);
        client
            .recent_messages(INBOX_LIST_MAX, INBOX_DETAIL_MAX)
            .await
    }

    /// Fetches recent announcements across a user's active courses.
    pub async fn fetch_announcements(
        &self,
        user_id: &str,
    ) -> ProviderResult<Vec<NormalizedAnnouncement>> {
        let token = self
            .refresher
            .access_token(user_id, Provider::Classroom)
            .await?;
        let client =
            ClassroomClient::new(self.http_client.clone(), &self.classroom_base_url, token);
        client
            .recent_announcements(COURSE_LIMIT, ANNOUNCEMENTS_PER_COURSE)
            .await
    }
}
