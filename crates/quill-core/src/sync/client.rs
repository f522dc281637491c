//! Sync server client

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::fragment::{
    BookEnvelope, BookSnapshot, FragmentEnvelope, NoteEnvelope, NoteSnapshot, SyncFragment,
    SyncState,
};
use crate::error::{Error, Result};
use crate::models::{BookId, NoteId};
use crate::util::{compact_text, is_http_url, normalize_text_option};

const SYNC_HTTP_TIMEOUT_SECS: u64 = 30;

/// Operations the sync engine needs from the server.
///
/// Errors are returned as-is; retry policy belongs to the implementation.
#[allow(async_fn_in_trait)]
pub trait SyncClient {
    /// Fetch the server's sync bookkeeping
    async fn get_sync_state(&self) -> Result<SyncState>;

    /// Fetch the page of changes that follows `after_usn`
    async fn get_sync_fragment(&self, after_usn: i64) -> Result<SyncFragment>;

    /// Create a book; the server assigns its UUID and USN
    async fn create_book(&self, label: &str) -> Result<BookSnapshot>;

    /// Rename a book
    async fn update_book(&self, uuid: &BookId, label: &str) -> Result<BookSnapshot>;

    /// Delete a book and its notes
    async fn delete_book(&self, uuid: &BookId) -> Result<BookSnapshot>;

    /// Create a note; the server assigns its UUID and USN
    async fn create_note(&self, book_uuid: &BookId, body: &str) -> Result<NoteSnapshot>;

    /// Replace a note's body and book
    async fn update_note(
        &self,
        uuid: &NoteId,
        book_uuid: &BookId,
        body: &str,
    ) -> Result<NoteSnapshot>;

    /// Delete a note
    async fn delete_note(&self, uuid: &NoteId) -> Result<NoteSnapshot>;
}

/// Page through the change stream starting after `after_usn`.
///
/// Each fragment's `frag_max_usn` becomes the next cursor; a fragment with
/// `frag_max_usn == 0` ends the stream and is not returned.
pub async fn fetch_fragments(client: &impl SyncClient, after_usn: i64) -> Result<Vec<SyncFragment>> {
    let mut fragments = Vec::new();
    let mut cursor = after_usn;

    loop {
        let fragment = client.get_sync_fragment(cursor).await?;
        if fragment.frag_max_usn == 0 {
            break;
        }
        if fragment.frag_max_usn <= cursor {
            return Err(Error::SyncIntegrity(format!(
                "fragment cursor did not advance past {cursor} (got {})",
                fragment.frag_max_usn
            )));
        }

        tracing::debug!(
            "Fetched fragment up to usn {} of {} ({} notes, {} books)",
            fragment.frag_max_usn,
            fragment.user_max_usn,
            fragment.notes.len(),
            fragment.books.len()
        );
        cursor = fragment.frag_max_usn;
        fragments.push(fragment);
    }

    Ok(fragments)
}

/// HTTP implementation of [`SyncClient`]
#[derive(Clone)]
pub struct HttpSyncClient {
    endpoint: String,
    session_key: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpSyncClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpSyncClient")
            .field("endpoint", &self.endpoint)
            .field("session_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct BookPayload<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct NotePayload<'a> {
    book_uuid: String,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl HttpSyncClient {
    pub fn new(endpoint: impl Into<String>, session_key: impl Into<String>) -> Result<Self> {
        let endpoint = normalize_endpoint(endpoint.into())?;
        let session_key = normalize_text_option(Some(session_key.into()))
            .ok_or_else(|| Error::InvalidInput("session key must not be empty".to_string()))?;

        Ok(Self {
            endpoint,
            session_key,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(SYNC_HTTP_TIMEOUT_SECS))
                .build()?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.endpoint)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request
            .bearer_auth(&self.session_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: parse_api_error(status, &body),
            });
        }

        Ok(response.json::<T>().await?)
    }
}

impl SyncClient for HttpSyncClient {
    async fn get_sync_state(&self) -> Result<SyncState> {
        self.send(self.client.get(self.url("/v1/sync/state"))).await
    }

    async fn get_sync_fragment(&self, after_usn: i64) -> Result<SyncFragment> {
        let request = self
            .client
            .get(self.url("/v1/sync/fragment"))
            .query(&[("after_usn", after_usn)]);
        let envelope: FragmentEnvelope = self.send(request).await?;
        Ok(envelope.fragment)
    }

    async fn create_book(&self, label: &str) -> Result<BookSnapshot> {
        let request = self
            .client
            .post(self.url("/v1/books"))
            .json(&BookPayload { name: label });
        let envelope: BookEnvelope = self.send(request).await?;
        Ok(envelope.book)
    }

    async fn update_book(&self, uuid: &BookId, label: &str) -> Result<BookSnapshot> {
        let request = self
            .client
            .patch(self.url(&format!("/v1/books/{uuid}")))
            .json(&BookPayload { name: label });
        let envelope: BookEnvelope = self.send(request).await?;
        Ok(envelope.book)
    }

    async fn delete_book(&self, uuid: &BookId) -> Result<BookSnapshot> {
        let request = self.client.delete(self.url(&format!("/v1/books/{uuid}")));
        let envelope: BookEnvelope = self.send(request).await?;
        Ok(envelope.book)
    }

    async fn create_note(&self, book_uuid: &BookId, body: &str) -> Result<NoteSnapshot> {
        let request = self.client.post(self.url("/v1/notes")).json(&NotePayload {
            book_uuid: book_uuid.as_str(),
            content: body,
        });
        let envelope: NoteEnvelope = self.send(request).await?;
        Ok(envelope.result)
    }

    async fn update_note(
        &self,
        uuid: &NoteId,
        book_uuid: &BookId,
        body: &str,
    ) -> Result<NoteSnapshot> {
        let request = self
            .client
            .patch(self.url(&format!("/v1/notes/{uuid}")))
            .json(&NotePayload {
                book_uuid: book_uuid.as_str(),
                content: body,
            });
        let envelope: NoteEnvelope = self.send(request).await?;
        Ok(envelope.result)
    }

    async fn delete_note(&self, uuid: &NoteId) -> Result<NoteSnapshot> {
        let request = self.client.delete(self.url(&format!("/v1/notes/{uuid}")));
        let envelope: NoteEnvelope = self.send(request).await?;
        Ok(envelope.result)
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return message.trim().to_string();
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed
    }
}

fn normalize_endpoint(raw: String) -> Result<String> {
    let endpoint = normalize_text_option(Some(raw))
        .ok_or_else(|| Error::InvalidInput("sync endpoint must not be empty".to_string()))?;
    if is_http_url(&endpoint) {
        Ok(endpoint.trim_end_matches('/').to_string())
    } else {
        Err(Error::InvalidInput(
            "sync endpoint must include http:// or https://".to_string(),
        ))
    }
}
