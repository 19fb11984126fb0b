//! External storage for selfies, review screenshots and leave documents.

pub mod retry;

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{NaiveDate, NaiveTime};
use derive_more::Display;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;

use crate::config::UploadConfig;
use retry::{RetryPolicy, with_backoff};

/// Stored in place of a link when an upload fails.
pub const UPLOAD_ERR: &str = "UploadErr";
/// Stored when an optional document is absent or could not be uploaded.
pub const NO_DOCUMENT: &str = "N/A";

#[derive(Debug, Display)]
pub enum UploadError {
    #[display(fmt = "uploads disabled: no storage token configured")]
    Disabled,
    #[display(fmt = "upload request failed: {}", _0)]
    Http(reqwest::Error),
    #[display(fmt = "storage returned HTTP {}", _0)]
    Status(u16),
    #[display(fmt = "storage response carried no file id")]
    MissingId,
}

#[derive(Deserialize)]
struct StoredFile {
    id: Option<String>,
}

pub fn selfie_filename(manager: &str, date: NaiveDate, time: NaiveTime) -> String {
    format!("{manager}_{}_{}.jpg", date.format("%Y-%m-%d"), time.format("%H:%M:%S"))
}

pub fn screenshot_filename(manager: &str, date: NaiveDate, time: NaiveTime) -> String {
    format!(
        "{manager}_{}_{}_screenshot.jpg",
        date.format("%Y-%m-%d"),
        time.format("%H:%M:%S")
    )
}

pub fn leave_doc_filename(manager: &str, from: NaiveDate, time: NaiveTime) -> String {
    format!("{manager}_{}_{}_leave_doc", from.format("%Y-%m-%d"), time.format("%H:%M:%S"))
}

/// Decode an optional base64 payload, accepting `data:<mime>;base64,` prefixes.
/// Blank input is `Ok(None)`.
pub fn decode_payload(raw: Option<&str>) -> Result<Option<Vec<u8>>, base64::DecodeError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let body = match raw.split_once(";base64,") {
        Some((prefix, body)) if prefix.starts_with("data:") => body,
        _ => raw,
    };
    let bytes = STANDARD.decode(body)?;
    Ok(Some(bytes).filter(|b| !b.is_empty()))
}

#[derive(Clone)]
pub struct UploadClient {
    http: reqwest::Client,
    config: UploadConfig,
    retry: RetryPolicy,
}

impl UploadClient {
    pub fn new(config: UploadConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            config,
            retry: RetryPolicy::default(),
        })
    }

    #[cfg(test)]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Store `bytes` under `filename` and return the shareable link.
    pub async fn upload(&self, filename: &str, bytes: &[u8], mime: &str) -> Result<String, UploadError> {
        let Some(token) = self.config.token.as_deref() else {
            return Err(UploadError::Disabled);
        };

        let mut metadata = json!({ "name": filename });
        if let Some(folder) = &self.config.folder_id {
            metadata["parents"] = json!([folder]);
        }
        let metadata = metadata.to_string();

        let id = with_backoff(&self.retry, "upload", || {
            self.send_once(token, &metadata, filename, bytes, mime)
        })
        .await?;

        Ok(self.config.view_url_template.replace("{id}", &id))
    }

    async fn send_once(
        &self,
        token: &str,
        metadata: &str,
        filename: &str,
        bytes: &[u8],
        mime: &str,
    ) -> Result<String, UploadError> {
        let form = Form::new()
            .part(
                "data",
                Part::text(metadata.to_string())
                    .mime_str("application/json")
                    .map_err(UploadError::Http)?,
            )
            .part(
                "file",
                Part::bytes(bytes.to_vec())
                    .file_name(filename.to_string())
                    .mime_str(mime)
                    .map_err(UploadError::Http)?,
            );

        let resp = self
            .http
            .post(&self.config.url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(UploadError::Http)?;

        if !resp.status().is_success() {
            return Err(UploadError::Status(resp.status().as_u16()));
        }

        let stored: StoredFile = resp.json().await.map_err(UploadError::Http)?;
        stored
            .id
            .filter(|id| !id.is_empty())
            .ok_or(UploadError::MissingId)
    }

    /// Like [`upload`](Self::upload) but never fails: errors become `fallback`.
    pub async fn upload_or(&self, filename: &str, bytes: &[u8], mime: &str, fallback: &str) -> String {
        match self.upload(filename, bytes, mime).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, filename, "Upload failed, storing placeholder");
                fallback.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client(url: String, token: Option<&str>) -> UploadClient {
        UploadClient::new(UploadConfig {
            url,
            token: token.map(str::to_string),
            folder_id: Some("folder-1".into()),
            view_url_template: "https://files.test/{id}/view".into(),
        })
        .unwrap()
        .with_retry(RetryPolicy {
            max_attempts: 3,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
        })
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn generated_filenames() {
        let time = NaiveTime::from_hms_opt(9, 5, 7).unwrap();
        assert_eq!(
            selfie_filename("Ayub Sait", d("2025-07-16"), time),
            "Ayub Sait_2025-07-16_09:05:07.jpg"
        );
        assert_eq!(
            screenshot_filename("Ayub Sait", d("2025-07-16"), time),
            "Ayub Sait_2025-07-16_09:05:07_screenshot.jpg"
        );
        assert_eq!(
            leave_doc_filename("Ayub Sait", d("2025-07-20"), time),
            "Ayub Sait_2025-07-20_09:05:07_leave_doc"
        );
    }

    #[test]
    fn decodes_plain_and_data_url_payloads() {
        assert_eq!(decode_payload(Some("aGVsbG8=")).unwrap(), Some(b"hello".to_vec()));
        assert_eq!(
            decode_payload(Some("data:image/jpeg;base64,aGVsbG8=")).unwrap(),
            Some(b"hello".to_vec())
        );
        assert_eq!(decode_payload(Some("   ")).unwrap(), None);
        assert_eq!(decode_payload(None).unwrap(), None);
        assert!(decode_payload(Some("not base64!")).is_err());
    }

    #[actix_web::test]
    async fn successful_upload_returns_view_link() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/upload");
                then.status(200).json_body(serde_json::json!({ "id": "abc123" }));
            })
            .await;

        let url = client(server.url("/upload"), Some("tok"))
            .upload("Tauseef_2025-07-16_09:00:00.jpg", b"jpeg", "image/jpeg")
            .await
            .unwrap();

        assert_eq!(url, "https://files.test/abc123/view");
        mock.assert_calls_async(1).await;
    }

    #[actix_web::test]
    async fn failing_storage_degrades_to_marker_after_retries() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/upload");
                then.status(500);
            })
            .await;

        let url = client(server.url("/upload"), Some("tok"))
            .upload_or("x.jpg", b"jpeg", "image/jpeg", UPLOAD_ERR)
            .await;

        assert_eq!(url, UPLOAD_ERR);
        mock.assert_calls_async(3).await;
    }

    #[actix_web::test]
    async fn missing_token_skips_the_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/upload");
                then.status(200).json_body(serde_json::json!({ "id": "never" }));
            })
            .await;

        let url = client(server.url("/upload"), None)
            .upload_or("x.jpg", b"jpeg", "image/jpeg", NO_DOCUMENT)
            .await;

        assert_eq!(url, NO_DOCUMENT);
        mock.assert_calls_async(0).await;
    }
}
