//! Domain values passed between the fetch and delivery stages.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Shortest and longest accepted phone number, in digits (E.164 bounds).
const MIN_RECIPIENT_DIGITS: usize = 7;
const MAX_RECIPIENT_DIGITS: usize = 15;

// ── MediaFile ───────────────────────────────────────────────────────────────

/// A downloaded media file sitting in local storage.
///
/// Neither the fetcher nor the dispatcher deletes the file; its lifecycle is
/// left to whoever manages the storage directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Final path component, used as the upload filename.
    pub filename: String,
    /// MIME type derived from the file extension.
    pub mime_type: String,
}

impl MediaFile {
    /// Build a `MediaFile` from a path, taking the filename from its last component.
    pub fn new(path: impl Into<PathBuf>, mime_type: impl Into<String>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            filename,
            mime_type: mime_type.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ── RecipientId ─────────────────────────────────────────────────────────────

/// International-format phone number: digits only, no leading `+`, no separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecipientId(String);

impl RecipientId {
    /// Validate a raw phone number. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Result<Self> {
        let digits = raw.trim();
        if digits.is_empty() {
            return Err(Error::invalid_input("phone number", "must not be empty"));
        }
        if digits.starts_with('+') {
            return Err(Error::invalid_input(
                "phone number",
                "use international format without the leading '+'",
            ));
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::invalid_input(
                "phone number",
                "must contain only digits (no spaces or separators)",
            ));
        }
        if !(MIN_RECIPIENT_DIGITS..=MAX_RECIPIENT_DIGITS).contains(&digits.len()) {
            return Err(Error::invalid_input(
                "phone number",
                format!(
                    "expected {MIN_RECIPIENT_DIGITS} to {MAX_RECIPIENT_DIGITS} digits, got {}",
                    digits.len()
                ),
            ));
        }
        Ok(Self(digits.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RecipientId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RecipientId> for String {
    fn from(value: RecipientId) -> Self {
        value.0
    }
}

// ── Delivery ────────────────────────────────────────────────────────────────

/// One upload to the messaging gateway.
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    pub recipient: RecipientId,
    pub file: MediaFile,
    pub caption: Option<String>,
}

impl DeliveryRequest {
    /// Blank captions are dropped so the gateway never receives an empty field.
    pub fn new(recipient: RecipientId, file: MediaFile, caption: Option<String>) -> Self {
        let caption = caption
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Self {
            recipient,
            file,
            caption,
        }
    }
}

/// Outcome of a single delivery attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub succeeded: bool,
    /// HTTP status returned by the gateway, when a response was received.
    pub provider_status_code: Option<u16>,
    /// Gateway message id from a successful response body.
    pub message_id: Option<String>,
    /// Response body, transport error, or local failure description.
    pub error_detail: Option<String>,
}

impl DeliveryResult {
    #[must_use]
    pub fn delivered(status: u16, message_id: Option<String>) -> Self {
        Self {
            succeeded: true,
            provider_status_code: Some(status),
            message_id,
            error_detail: None,
        }
    }

    #[must_use]
    pub fn failed(provider_status_code: Option<u16>, detail: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            provider_status_code,
            message_id: None,
            error_detail: Some(detail.into()),
        }
    }
}
