//! Green API `sendFileByUpload` client.
//!
//! The upload is a multipart POST to
//! `{media_url}/waInstance{instance_id}/sendFileByUpload/{api_token}` with a
//! `chatId` field, an optional `caption`, and the video as the `file` part.
//! The token lives in the URL path, so the endpoint is never logged verbatim.

use std::time::Duration;

use {
    async_trait::async_trait,
    clipcast_common::{DeliveryRequest, DeliveryResult, RecipientId},
    clipcast_config::GatewayCredentials,
    reqwest::{
        Body, Client, StatusCode,
        multipart::{Form, Part},
    },
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tokio_util::io::ReaderStream,
    tracing::{debug, info, warn},
};

use crate::{Dispatcher, error::DeliveryError};

/// WhatsApp's suffix for individual (non-group) chats.
const CHAT_SUFFIX: &str = "@c.us";

/// Media type declared on the `file` part, whatever the local extension.
const UPLOAD_MIME: &str = "video/mp4";

/// Longest gateway response body kept in an error detail.
const MAX_DETAIL_CHARS: usize = 1_000;

/// Uploads videos through a Green API instance.
#[derive(Clone)]
pub struct GreenApiDispatcher {
    client: Client,
    base_url: String,
    instance_id: String,
    api_token: Secret<String>,
    timeout: Duration,
}

impl std::fmt::Debug for GreenApiDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GreenApiDispatcher")
            .field("base_url", &self.base_url)
            .field("instance_id", &self.instance_id)
            .field("api_token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GreenApiDispatcher {
    #[must_use]
    pub fn new(credentials: &GatewayCredentials) -> Self {
        Self {
            client: Client::new(),
            base_url: credentials.media_url.trim_end_matches('/').to_string(),
            instance_id: credentials.instance_id.clone(),
            api_token: credentials.api_token.clone(),
            timeout: credentials.upload_timeout,
        }
    }

    /// Create with custom base URL (for testing).
    #[cfg(test)]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Gateway chat id for a recipient, e.g. `212687830691@c.us`.
    #[must_use]
    pub fn chat_id(recipient: &RecipientId) -> String {
        format!("{recipient}{CHAT_SUFFIX}")
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/waInstance{}/sendFileByUpload/{}",
            self.base_url,
            self.instance_id,
            self.api_token.expose_secret()
        )
    }

    async fn upload(&self, request: &DeliveryRequest) -> Result<(u16, Option<String>), DeliveryError> {
        let path = request.file.path();

        // Checked before any network traffic.
        let metadata = match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => {
                return Err(DeliveryError::FileMissing {
                    path: path.to_path_buf(),
                });
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DeliveryError::FileMissing {
                    path: path.to_path_buf(),
                });
            },
            Err(source) => {
                return Err(DeliveryError::FileRead {
                    path: path.to_path_buf(),
                    source,
                });
            },
        };

        let file = tokio::fs::File::open(path)
            .await
            .map_err(|source| DeliveryError::FileRead {
                path: path.to_path_buf(),
                source,
            })?;

        let file_part = Part::stream_with_length(
            Body::wrap_stream(ReaderStream::new(file)),
            metadata.len(),
        )
        .file_name(request.file.filename.clone())
        .mime_str(UPLOAD_MIME)?;

        let mut form = Form::new().text("chatId", Self::chat_id(&request.recipient));
        if let Some(caption) = &request.caption {
            form = form.text("caption", caption.clone());
        }
        let form = form.part("file", file_part);

        debug!(
            instance = %self.instance_id,
            chat_id = %Self::chat_id(&request.recipient),
            filename = %request.file.filename,
            bytes = metadata.len(),
            "uploading to gateway"
        );

        let response = self
            .client
            .post(self.endpoint())
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        // Only a plain 200 means the gateway accepted the file.
        if status != StatusCode::OK {
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body: truncate(body.trim(), MAX_DETAIL_CHARS),
            });
        }

        let message_id = serde_json::from_str::<SendFileResponse>(&body)
            .ok()
            .and_then(|r| r.id_message);
        Ok((status.as_u16(), message_id))
    }
}

#[async_trait]
impl Dispatcher for GreenApiDispatcher {
    async fn deliver(&self, request: DeliveryRequest) -> DeliveryResult {
        match self.upload(&request).await {
            Ok((status, message_id)) => {
                info!(
                    recipient = %request.recipient,
                    status,
                    message_id = message_id.as_deref().unwrap_or("-"),
                    "video sent"
                );
                DeliveryResult::delivered(status, message_id)
            },
            Err(e) => {
                warn!(recipient = %request.recipient, error = %e, "video delivery failed");
                let detail = match &e {
                    DeliveryError::Rejected { body, .. } if !body.is_empty() => body.clone(),
                    _ => e.to_string(),
                };
                DeliveryResult::failed(e.status_code(), detail)
            },
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

// ── API Types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SendFileResponse {
    #[serde(rename = "idMessage", default)]
    id_message: Option<String>,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, clipcast_common::MediaFile, std::path::Path};

    fn credentials(media_url: &str) -> GatewayCredentials {
        GatewayCredentials {
            media_url: media_url.into(),
            instance_id: "1101000001".into(),
            api_token: Secret::new("test-token".into()),
            upload_timeout: Duration::from_secs(5),
        }
    }

    fn video(dir: &Path, name: &str) -> MediaFile {
        let path = dir.join(name);
        std::fs::write(&path, b"fake mp4 payload").unwrap();
        MediaFile::new(path, "video/mp4")
    }

    fn recipient() -> RecipientId {
        RecipientId::parse("212687830691").unwrap()
    }

    #[test]
    fn chat_id_appends_suffix() {
        assert_eq!(GreenApiDispatcher::chat_id(&recipient()), "212687830691@c.us");
    }

    #[test]
    fn endpoint_embeds_instance_and_token() {
        let dispatcher = GreenApiDispatcher::new(&credentials("https://7103.media.greenapi.com/"));
        assert_eq!(
            dispatcher.endpoint(),
            "https://7103.media.greenapi.com/waInstance1101000001/sendFileByUpload/test-token"
        );
    }

    #[test]
    fn debug_redacts_token() {
        let dispatcher = GreenApiDispatcher::new(&credentials("https://media.example"));
        let debug = format!("{dispatcher:?}");
        assert!(!debug.contains("test-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 2), "éé…");
    }

    mod integration {
        use {
            super::*,
            wiremock::{
                Mock, MockServer, ResponseTemplate,
                matchers::{body_string_contains, method, path},
            },
        };

        const UPLOAD_PATH: &str = "/waInstance1101000001/sendFileByUpload/test-token";

        #[tokio::test]
        async fn test_deliver_success() {
            let mock_server = MockServer::start().await;
            let dir = tempfile::tempdir().unwrap();

            Mock::given(method("POST"))
                .and(path(UPLOAD_PATH))
                .and(body_string_contains("212687830691@c.us"))
                .and(body_string_contains("fake mp4 payload"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_string(r#"{"idMessage":"3EB0C767D097B7C7C030"}"#),
                )
                .expect(1)
                .mount(&mock_server)
                .await;

            let dispatcher = GreenApiDispatcher::new(&credentials(&mock_server.uri()));
            let request = DeliveryRequest::new(
                recipient(),
                video(dir.path(), "Sample Clip.mp4"),
                Some("Check this out".into()),
            );

            let result = dispatcher.deliver(request).await;

            assert!(result.succeeded);
            assert_eq!(result.provider_status_code, Some(200));
            assert_eq!(result.message_id.as_deref(), Some("3EB0C767D097B7C7C030"));
            assert!(result.error_detail.is_none());

            let received = mock_server.received_requests().await.unwrap();
            let body = String::from_utf8_lossy(&received[0].body);
            assert!(body.contains(r#"name="caption""#));
            assert!(body.contains("Check this out"));
            assert!(body.contains(r#"filename="Sample Clip.mp4""#));
            assert!(body.contains("video/mp4"));
        }

        #[tokio::test]
        async fn test_deliver_server_error() {
            let mock_server = MockServer::start().await;
            let dir = tempfile::tempdir().unwrap();

            Mock::given(method("POST"))
                .and(path(UPLOAD_PATH))
                .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
                .expect(1)
                .mount(&mock_server)
                .await;

            let dispatcher = GreenApiDispatcher::new(&credentials(&mock_server.uri()));
            let file = video(dir.path(), "Clip.mp4");
            let kept = file.path.clone();

            let result = dispatcher
                .deliver(DeliveryRequest::new(recipient(), file, None))
                .await;

            assert!(!result.succeeded);
            assert_eq!(result.provider_status_code, Some(500));
            assert_eq!(result.error_detail.as_deref(), Some("Internal Server Error"));
            assert!(kept.exists());
        }

        #[tokio::test]
        async fn test_blank_caption_is_omitted() {
            let mock_server = MockServer::start().await;
            let dir = tempfile::tempdir().unwrap();

            Mock::given(method("POST"))
                .and(path(UPLOAD_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
                .expect(1)
                .mount(&mock_server)
                .await;

            let dispatcher = GreenApiDispatcher::new(&credentials(&mock_server.uri()));
            let request =
                DeliveryRequest::new(recipient(), video(dir.path(), "Clip.mp4"), Some("   ".into()));

            let result = dispatcher.deliver(request).await;

            assert!(result.succeeded);
            assert!(result.message_id.is_none());
            let received = mock_server.received_requests().await.unwrap();
            let body = String::from_utf8_lossy(&received[0].body);
            assert!(!body.contains(r#"name="caption""#));
            assert!(body.contains(r#"name="chatId""#));
        }

        #[tokio::test]
        async fn test_missing_file_makes_no_request() {
            let mock_server = MockServer::start().await;

            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200))
                .expect(0)
                .mount(&mock_server)
                .await;

            let dispatcher = GreenApiDispatcher::new(&credentials(&mock_server.uri()));
            let file = MediaFile::new("/definitely/not/here/Clip.mp4", "video/mp4");

            let result = dispatcher
                .deliver(DeliveryRequest::new(recipient(), file, None))
                .await;

            assert!(!result.succeeded);
            assert_eq!(result.provider_status_code, None);
            assert!(result.error_detail.unwrap().contains("not found"));
        }

        #[tokio::test]
        async fn test_slow_gateway_times_out() {
            let mock_server = MockServer::start().await;
            let dir = tempfile::tempdir().unwrap();

            Mock::given(method("POST"))
                .and(path(UPLOAD_PATH))
                .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
                .mount(&mock_server)
                .await;

            let mut creds = credentials(&mock_server.uri());
            creds.upload_timeout = Duration::from_millis(200);
            let dispatcher = GreenApiDispatcher::new(&creds);

            let result = dispatcher
                .deliver(DeliveryRequest::new(recipient(), video(dir.path(), "Clip.mp4"), None))
                .await;

            assert!(!result.succeeded);
            assert_eq!(result.provider_status_code, None);
            assert_eq!(result.error_detail.as_deref(), Some("upload timed out"));
        }

        #[tokio::test]
        async fn test_other_2xx_statuses_are_failures() {
            let dir = tempfile::tempdir().unwrap();

            for status in [201u16, 202, 204] {
                let mock_server = MockServer::start().await;
                Mock::given(method("POST"))
                    .and(path(UPLOAD_PATH))
                    .respond_with(ResponseTemplate::new(status))
                    .expect(1)
                    .mount(&mock_server)
                    .await;

                let dispatcher = GreenApiDispatcher::new(&credentials(&mock_server.uri()));
                let result = dispatcher
                    .deliver(DeliveryRequest::new(recipient(), video(dir.path(), "Clip.mp4"), None))
                    .await;

                assert!(!result.succeeded, "status {status} must not count as delivered");
                assert_eq!(result.provider_status_code, Some(status));
                assert!(result.message_id.is_none());
                assert!(
                    result
                        .error_detail
                        .as_deref()
                        .is_some_and(|d| d.contains(&status.to_string())),
                    "status {status}: {:?}",
                    result.error_detail
                );
            }
        }

        #[tokio::test]
        async fn test_file_part_is_declared_as_mp4() {
            let mock_server = MockServer::start().await;
            let dir = tempfile::tempdir().unwrap();

            Mock::given(method("POST"))
                .and(path(UPLOAD_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
                .expect(1)
                .mount(&mock_server)
                .await;

            let dispatcher = GreenApiDispatcher::new(&credentials(&mock_server.uri()));
            let path = dir.path().join("Clip.3gp");
            std::fs::write(&path, b"fake 3gp payload").unwrap();
            let file = MediaFile::new(path, "video/3gpp");

            let result = dispatcher
                .deliver(DeliveryRequest::new(recipient(), file, None))
                .await;
            assert!(result.succeeded);

            let received = mock_server.received_requests().await.unwrap();
            let body = String::from_utf8_lossy(&received[0].body);
            assert!(body.contains("Content-Type: video/mp4"));
            assert!(!body.contains("video/3gpp"));
        }

        #[tokio::test]
        async fn test_with_base_url_overrides_credentials() {
            let mock_server = MockServer::start().await;
            let dir = tempfile::tempdir().unwrap();

            Mock::given(method("POST"))
                .and(path(UPLOAD_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
                .expect(1)
                .mount(&mock_server)
                .await;

            let dispatcher = GreenApiDispatcher::new(&credentials("https://unreachable.invalid"))
                .with_base_url(format!("{}/", mock_server.uri()));

            let result = dispatcher
                .deliver(DeliveryRequest::new(recipient(), video(dir.path(), "Clip.mp4"), None))
                .await;
            assert!(result.succeeded);
        }
    }
}
