//! Job input and the single result a run produces.

use clipcast_common::{DeliveryResult, MediaFile};

/// Raw user input for one run, as typed into the prompt or web form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub source_url: String,
    /// Phone number in international format, digits only.
    pub recipient: String,
    pub caption: Option<String>,
}

impl Job {
    pub fn new(
        source_url: impl Into<String>,
        recipient: impl Into<String>,
        caption: Option<String>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            recipient: recipient.into(),
            caption,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone)]
pub enum Outcome {
    Delivered {
        file: MediaFile,
        result: DeliveryResult,
    },
    InvalidInput(String),
    FetchFailed(String),
    /// The downloaded file is left in storage.
    DeliveryFailed {
        file: MediaFile,
        result: DeliveryResult,
    },
}

impl Outcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    /// One-line message for the person who submitted the job.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Delivered { .. } => "Video sent successfully!".into(),
            Self::InvalidInput(reason) => format!("Invalid input: {reason}"),
            Self::FetchFailed(reason) => format!("Failed to download video: {reason}"),
            Self::DeliveryFailed { result, .. } => {
                let status = result
                    .provider_status_code
                    .map(|code| format!("HTTP {code}: "))
                    .unwrap_or_default();
                let detail = result.error_detail.as_deref().unwrap_or("unknown error");
                format!("Failed to send video: {status}{detail}")
            },
        }
    }
}
