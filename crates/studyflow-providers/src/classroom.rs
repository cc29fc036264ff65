//! Google Classroom API client.
//!
//! Lists active courses, then pulls recent announcements per course and
//! flattens them into [`NormalizedAnnouncement`] values. A 403 on the
//! course list almost always means the Classroom API was never enabled for
//! the Cloud project, which is a one-time setup problem; it is surfaced
//! with its own error code and an actionable message instead of a generic
//! fetch failure.

use futures_util::future::join_all;
use serde::Deserialize;
use tracing::{debug, warn};

use studyflow_core::{NormalizedAnnouncement, Provider};

use crate::error::{transport_error, ProviderError, ProviderResult};

/// Console URL included in the API-not-enabled message.
const ENABLE_API_URL: &str =
    "https://console.cloud.google.com/apis/library/classroom.googleapis.com";

/// Classroom API client bound to one access token.
#[derive(Debug)]
pub struct ClassroomClient {
    http_client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl ClassroomClient {
    /// Creates a client for one request's worth of Classroom calls.
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            access_token: access_token.into(),
        }
    }

    /// Fetches recent announcements across the user's active courses.
    ///
    /// Takes the first `course_limit` courses and fetches up to
    /// `per_course` announcements for each. The per-course fetches are
    /// independent reads and run concurrently; a failing course is skipped
    /// with a warning rather than failing the whole page.
    pub async fn recent_announcements(
        &self,
        course_limit: usize,
        per_course: usize,
    ) -> ProviderResult<Vec<NormalizedAnnouncement>> {
        let courses = self.active_courses().await?;

        let fetches = courses
            .iter()
            .take(course_limit)
            .map(|course| self.course_announcements(course, per_course));
        let results = join_all(fetches).await;

        let mut announcements = Vec::new();
        for (course, result) in courses.iter().zip(results) {
            match result {
                Ok(mut items) => announcements.append(&mut items),
                Err(e) => {
                    warn!(course_id = %course.id, error = %e, "skipping course announcements")
                }
            }
        }

        debug!(
            count = announcements.len(),
            courses = courses.len().min(course_limit),
            "fetched classroom announcements"
        );
        Ok(announcements)
    }

    /// Lists the user's active courses.
    async fn active_courses(&self) -> ProviderResult<Vec<Course>> {
        let url = format!("{}/courses", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("courseStates", "ACTIVE")])
            .send()
            .await
            .map_err(|e| transport_error("course list request", e))?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(
                ProviderError::authentication("access token expired or invalid")
                    .with_provider(Provider::Classroom)
                    .with_status(status.as_u16()),
            );
        }

        if status == reqwest::StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "classroom course list forbidden");
            return Err(ProviderError::api_not_enabled(format!(
                "Google Classroom API is not enabled for this project. \
                 Enable it in the Google Cloud Console: {}",
                ENABLE_API_URL
            ))
            .with_provider(Provider::Classroom)
            .with_status(status.as_u16()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::fetch(format!(
                "Classroom API error ({}): {}",
                status, body
            ))
            .with_provider(Provider::Classroom)
            .with_status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| transport_error("course list response", e))?;

        let list: CourseListResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::invalid_response(format!("invalid course list: {}", e)))?;

        Ok(list.courses)
    }

    /// Lists recent announcements for one course, normalized.
    async fn course_announcements(
        &self,
        course: &Course,
        page_size: usize,
    ) -> ProviderResult<Vec<NormalizedAnnouncement>> {
        let url = format!("{}/courses/{}/announcements", self.base_url, course.id);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("pageSize", page_size.to_string())])
            .send()
            .await
            .map_err(|e| transport_error("announcement list request", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::fetch(format!(
                "announcements for course {} failed ({}): {}",
                course.id, status, body
            ))
            .with_provider(Provider::Classroom)
            .with_status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| transport_error("announcement list response", e))?;

        let list: AnnouncementListResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("invalid announcement list: {}", e))
        })?;

        Ok(list
            .announcements
            .into_iter()
            .map(|a| normalize_announcement(a, course))
            .collect())
    }
}

/// Flattens a provider announcement with its course context.
fn normalize_announcement(announcement: Announcement, course: &Course) -> NormalizedAnnouncement {
    NormalizedAnnouncement {
        id: announcement.id,
        course_id: course.id.clone(),
        course_name: course.name.clone().unwrap_or_default(),
        text: announcement.text.unwrap_or_default(),
        creation_time: announcement.creation_time.unwrap_or_default(),
        update_time: announcement.update_time.unwrap_or_default(),
        creator_user_id: announcement.creator_user_id.unwrap_or_default(),
    }
}

#[derive(Debug, Deserialize)]
struct CourseListResponse {
    #[serde(default)]
    courses: Vec<Course>,
}

/// A course from the Classroom API.
#[derive(Debug, Clone, Deserialize)]
struct Course {
    id: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnnouncementListResponse {
    #[serde(default)]
    announcements: Vec<Announcement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Announcement {
    id: String,
    text: Option<String>,
    creation_time: Option<String>,
    update_time: Option<String>,
    creator_user_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_course_list() {
        let json = r#"{"courses":[{"id":"c1","name":"Algebra"},{"id":"c2"}]}"#;
        let list: CourseListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(list.courses.len(), 2);
        assert_eq!(list.courses[0].name.as_deref(), Some("Algebra"));
        assert!(list.courses[1].name.is_none());
    }

    #[test]
    fn parse_empty_course_list() {
        let list: CourseListResponse = serde_json::from_str("{}").unwrap();
        assert!(list.courses.is_empty());
    }

    #[test]
    fn normalize_announcement_carries_course_context() {
        let json = r#"{
            "announcements": [{
                "id": "a1",
                "text": "Homework due Friday",
                "creationTime": "2024-03-15T10:00:00Z",
                "updateTime": "2024-03-15T11:00:00Z",
                "creatorUserId": "u9"
            }]
        }"#;
        let list: AnnouncementListResponse = serde_json::from_str(json).unwrap();
        let course = Course {
            id: "c1".into(),
            name: Some("Algebra".into()),
        };

        let normalized = normalize_announcement(list.announcements.into_iter().next().unwrap(), &course);
        assert_eq!(normalized.course_id, "c1");
        assert_eq!(normalized.course_name, "Algebra");
        assert_eq!(normalized.text, "Homework due Friday");
        assert_eq!(normalized.creator_user_id, "u9");
    }

    #[test]
    fn normalize_tolerates_missing_fields() {
        let announcement = Announcement {
            id: "a1".into(),
            text: None,
            creation_time: None,
            update_time: None,
            creator_user_id: None,
        };
        let course = Course {
            id: "c1".into(),
            name: None,
        };

        let normalized = normalize_announcement(announcement, &course);
        assert_eq!(normalized.id, "a1");
        assert_eq!(normalized.course_name, "");
        assert_eq!(normalized.text, "");
    }
}
