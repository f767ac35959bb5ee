use std::path::PathBuf;

/// Crate-wide result type for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;

/// Why a video could not be fetched.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid source URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{binary} binary not found (install it or set CLIPCAST_YTDLP_PATH)")]
    BinaryNotFound { binary: String },

    #[error("failed to start {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// The downloader exited unsuccessfully; `stderr` holds its last lines.
    #[error("download failed ({status}): {stderr}", status = exit_label(.code))]
    Failed { code: Option<i32>, stderr: String },

    #[error("download timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("downloader reported success but produced no file")]
    NoOutput,

    #[error("downloaded file is empty: {}", path.display())]
    EmptyFile { path: PathBuf },

    #[error("unsupported media format '{extension}' (expected mp4)")]
    UnsupportedFormat { extension: String },

    #[error("storage error: {context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    #[must_use]
    pub fn invalid_url(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn storage(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Storage {
            context: context.into(),
            source,
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".into(),
    }
}
