//! Gmail API client.
//!
//! Lists recent inbox message ids, fetches each message's full payload,
//! and flattens headers, snippet, and decoded body into
//! [`NormalizedMessage`] values.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::Deserialize;
use tracing::{debug, warn};

use studyflow_core::{NormalizedMessage, Provider};

use crate::error::{transport_error, ProviderError, ProviderResult};

/// Maximum decoded body length kept on a normalized message.
pub const BODY_MAX_CHARS: usize = 500;

/// Gmail API client bound to one access token.
///
/// Constructed per request; the underlying `reqwest::Client` is shared so
/// connections are pooled across requests.
#[derive(Debug)]
pub struct GmailClient {
    http_client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl GmailClient {
    /// Creates a client for one request's worth of Gmail calls.
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

    /// Fetches the most recent inbox messages, normalized.
    ///
    /// Lists up to `list_max` ids, then fetches full details for the first
    /// `detail_max`. A message whose detail fetch fails is skipped with a
    /// warning rather than failing the page.
    pub async fn recent_messages(
        &self,
        list_max: usize,
        detail_max: usize,
    ) -> ProviderResult<Vec<NormalizedMessage>> {
        let ids = self.list_inbox_ids(list_max).await?;
        let mut messages = Vec::new();

        for id in ids.iter().take(detail_max) {
            match self.message_detail(id).await {
                Ok(message) => messages.push(message),
                Err(e) => warn!(message_id = %id, error = %e, "skipping message detail"),
            }
        }

        debug!(count = messages.len(), "fetched inbox messages");
        Ok(messages)
    }

    /// Lists ids of the most recent inbox messages.
    async fn list_inbox_ids(&self, max_results: usize) -> ProviderResult<Vec<String>> {
        let url = format!("{}/users/me/messages", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("maxResults", max_results.to_string()),
                ("labelIds", "INBOX".to_string()),
            ])
            .send()
            .await
            .map_err(|e| transport_error("message list request", e))?;

        let body = check_status(response, Provider::Gmail).await?;

        let list: MessageListResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("invalid message list: {}", e))
        })?;

        Ok(list.messages.into_iter().map(|m| m.id).collect())
    }

    /// Fetches one message's full payload and normalizes it.
    async fn message_detail(&self, id: &str) -> ProviderResult<NormalizedMessage> {
        let url = format!("{}/users/me/messages/{}", self.base_url, id);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("format", "full")])
            .send()
            .await
            .map_err(|e| transport_error("message detail request", e))?;

        let body = check_status(response, Provider::Gmail).await?;

        let detail: MessageDetail = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("invalid message detail: {}", e))
        })?;

        Ok(normalize_message(id, detail))
    }
}

/// Maps a non-2xx Gmail response to the taxonomy, or returns the body.
async fn check_status(response: reqwest::Response, provider: Provider) -> ProviderResult<String> {
    let status = response.status();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(
            ProviderError::authentication("access token expired or invalid")
                .with_provider(provider)
                .with_status(status.as_u16()),
        );
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::fetch(format!(
            "{} API error ({}): {}",
            provider.display_name(),
            status,
            body
        ))
        .with_provider(provider)
        .with_status(status.as_u16()));
    }

    response
        .text()
        .await
        .map_err(|e| transport_error("response body", e))
}

/// Flattens a Gmail payload into the normalized shape.
fn normalize_message(id: &str, detail: MessageDetail) -> NormalizedMessage {
    let headers = detail
        .payload
        .as_ref()
        .map(|p| p.headers.as_slice())
        .unwrap_or_default();

    let header = |name: &str| {
        headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.clone())
    };

    let body = detail
        .payload
        .as_ref()
        .and_then(extract_plain_text)
        .unwrap_or_default();

    NormalizedMessage {
        id: id.to_string(),
        subject: header("Subject").unwrap_or_else(|| "No Subject".to_string()),
        from: header("From").unwrap_or_else(|| "Unknown".to_string()),
        date: header("Date").unwrap_or_default(),
        snippet: detail.snippet.unwrap_or_default(),
        body: truncate_chars(&body, BODY_MAX_CHARS),
    }
}

/// Pulls the decoded text/plain body out of a message payload.
///
/// Multipart messages carry the text in a `text/plain` part; simple
/// messages carry it directly on the payload body.
fn extract_plain_text(payload: &MessagePayload) -> Option<String> {
    if let Some(parts) = &payload.parts {
        let text_part = parts
            .iter()
            .find(|part| part.mime_type.as_deref() == Some("text/plain"))?;
        return text_part
            .body
            .as_ref()
            .and_then(|b| b.data.as_deref())
            .and_then(decode_body_data);
    }

    payload
        .body
        .as_ref()
        .and_then(|b| b.data.as_deref())
        .and_then(decode_body_data)
}

/// Decodes Gmail's base64url body data (padded or unpadded).
fn decode_body_data(data: &str) -> Option<String> {
    let bytes = URL_SAFE
        .decode(data)
        .or_else(|_| URL_SAFE_NO_PAD.decode(data))
        .ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Truncates to at most `max` characters, respecting char boundaries.
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((index, _)) => text[..index].to_string(),
        None => text.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct MessageListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageDetail {
    snippet: Option<String>,
    payload: Option<MessagePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePayload {
    #[serde(default)]
    headers: Vec<MessageHeader>,
    parts: Option<Vec<MessagePart>>,
    body: Option<MessageBody>,
}

#[derive(Debug, Deserialize)]
struct MessageHeader {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePart {
    mime_type: Option<String>,
    body: Option<MessageBody>,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    data: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_body(text: &str) -> String {
        URL_SAFE_NO_PAD.encode(text.as_bytes())
    }

    #[test]
    fn parse_message_list() {
        let json = r#"{"messages":[{"id":"m1"},{"id":"m2"}],"resultSizeEstimate":2}"#;
        let list: MessageListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(list.messages.len(), 2);
        assert_eq!(list.messages[0].id, "m1");
    }

    #[test]
    fn parse_empty_message_list() {
        let list: MessageListResponse = serde_json::from_str("{}").unwrap();
        assert!(list.messages.is_empty());
    }

    #[test]
    fn normalize_multipart_message() {
        let json = format!(
            r#"{{
                "snippet": "Hi there",
                "payload": {{
                    "headers": [
                        {{"name": "Subject", "value": "Weekly plan"}},
                        {{"name": "From", "value": "teacher@example.com"}},
                        {{"name": "Date", "value": "Fri, 15 Mar 2024 10:00:00 +0000"}}
                    ],
                    "parts": [
                        {{"mimeType": "text/html", "body": {{"data": "{}"}}}},
                        {{"mimeType": "text/plain", "body": {{"data": "{}"}}}}
                    ]
                }}
            }}"#,
            encode_body("<p>ignored</p>"),
            encode_body("plain body text"),
        );

        let detail: MessageDetail = serde_json::from_str(&json).unwrap();
        let message = normalize_message("m1", detail);

        assert_eq!(message.subject, "Weekly plan");
        assert_eq!(message.from, "teacher@example.com");
        assert_eq!(message.snippet, "Hi there");
        assert_eq!(message.body, "plain body text");
    }

    #[test]
    fn normalize_simple_body_message() {
        let json = format!(
            r#"{{
                "snippet": "s",
                "payload": {{
                    "headers": [],
                    "body": {{"data": "{}"}}
                }}
            }}"#,
            encode_body("direct body"),
        );

        let detail: MessageDetail = serde_json::from_str(&json).unwrap();
        let message = normalize_message("m2", detail);

        assert_eq!(message.subject, "No Subject");
        assert_eq!(message.from, "Unknown");
        assert_eq!(message.body, "direct body");
    }

    #[test]
    fn body_is_truncated_to_bound() {
        let long = "x".repeat(BODY_MAX_CHARS * 2);
        let json = format!(
            r#"{{"payload": {{"headers": [], "body": {{"data": "{}"}}}}}}"#,
            encode_body(&long),
        );

        let detail: MessageDetail = serde_json::from_str(&json).unwrap();
        let message = normalize_message("m3", detail);
        assert_eq!(message.body.chars().count(), BODY_MAX_CHARS);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "é".repeat(10);
        assert_eq!(truncate_chars(&text, 4).chars().count(), 4);
        assert_eq!(truncate_chars("short", 500), "short");
    }

    #[test]
    fn decode_handles_padded_and_unpadded() {
        let padded = URL_SAFE.encode("hello world");
        let unpadded = URL_SAFE_NO_PAD.encode("hello world");
        assert_eq!(decode_body_data(&padded).unwrap(), "hello world");
        assert_eq!(decode_body_data(&unpadded).unwrap(), "hello world");
        assert!(decode_body_data("!!not base64!!").is_none());
    }

    #[test]
    fn headers_matched_case_insensitively() {
        let json = r#"{
            "payload": {
                "headers": [{"name": "subject", "value": "lower"}]
            }
        }"#;
        let detail: MessageDetail = serde_json::from_str(json).unwrap();
        let message = normalize_message("m4", detail);
        assert_eq!(message.subject, "lower");
    }
}
