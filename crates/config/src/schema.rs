/// Config schema types (gateway credentials, storage, fetch, server).
use std::path::PathBuf;

use {secrecy::Secret, serde::Deserialize};

/// Upload timeout for the gateway. Media uploads are slow, so this is generous.
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 300;

/// Upper bound on a single `yt-dlp` run.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 600;

/// Format selector handed to `yt-dlp`; mp4 is what the gateway accepts for video.
pub const DEFAULT_FETCH_FORMAT: &str = "mp4";

pub const DEFAULT_DOWNLOADS_DIR: &str = "downloads";

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

/// Top-level clipcast configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClipcastConfig {
    pub gateway: GatewayConfig,
    pub storage: StorageConfig,
    pub fetch: FetchConfig,
    pub server: ServerConfig,
}

/// Messaging gateway (Green API) settings.
///
/// All three credentials are opaque to clipcast; they are only interpolated
/// into the upload endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Media host base URL, e.g. `https://7103.media.greenapi.com`.
    pub media_url: Option<String>,
    pub instance_id: Option<String>,
    pub api_token: Option<Secret<String>>,
    pub upload_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            media_url: None,
            instance_id: None,
            api_token: None,
            upload_timeout_secs: DEFAULT_UPLOAD_TIMEOUT_SECS,
        }
    }
}

/// Where downloaded media lands.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub downloads_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            downloads_dir: PathBuf::from(DEFAULT_DOWNLOADS_DIR),
        }
    }
}

/// `yt-dlp` invocation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Explicit binary path; falls back to `yt-dlp` on `PATH`.
    pub ytdlp_path: Option<String>,
    pub format: String,
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            format: DEFAULT_FETCH_FORMAT.into(),
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

/// Web form listener.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.into(),
            port: DEFAULT_PORT,
        }
    }
}
