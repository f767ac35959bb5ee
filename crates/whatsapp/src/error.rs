use std::path::PathBuf;

/// Why an upload did not go through.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("media file not found: {}", path.display())]
    FileMissing { path: PathBuf },

    #[error("failed to read media file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("gateway rejected upload ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("upload timed out")]
    Timeout,

    #[error("upload failed: {0}")]
    Transport(#[source] reqwest::Error),
}

impl DeliveryError {
    /// HTTP status from the gateway, if one was received.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err)
        }
    }
}
