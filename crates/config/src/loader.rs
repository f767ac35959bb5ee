use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{
    env_subst::substitute_env,
    error::{ConfigError, Result},
    schema::ClipcastConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "clipcast.toml",
    "clipcast.yaml",
    "clipcast.yml",
    "clipcast.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<ClipcastConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&substitute_env(&raw), path)
}

/// Load from an explicit path when given, otherwise discover, then apply env
/// overrides. An explicit path that fails to load is an error; a discovered
/// one falls back to defaults.
pub fn load_from(explicit: Option<&Path>) -> Result<ClipcastConfig> {
    let mut config = match explicit {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(path)?
        },
        None => discover_and_load(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./clipcast.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/clipcast/clipcast.{toml,yaml,yml,json}` (user-global)
///
/// Returns `ClipcastConfig::default()` if no config file is found.
pub fn discover_and_load() -> ClipcastConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    ClipcastConfig::default()
}

/// Returns the user-global config directory (`~/.config/clipcast/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "clipcast").map(|d| d.config_dir().to_path_buf())
}

fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));
    local.chain(global).find(|p| p.exists())
}

/// Overlay process environment values on top of file config.
///
/// `GREEN_MEDIA_URL`, `GREEN_INSTANCE_ID`, `GREEN_API_TOKEN` fill the gateway
/// credentials; `CLIPCAST_*` variables cover storage, fetch, and server.
pub fn apply_env_overrides(config: &mut ClipcastConfig) {
    apply_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_overrides_with(config: &mut ClipcastConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("GREEN_MEDIA_URL") {
        config.gateway.media_url = Some(v);
    }
    if let Some(v) = get("GREEN_INSTANCE_ID") {
        config.gateway.instance_id = Some(v);
    }
    if let Some(v) = get("GREEN_API_TOKEN") {
        config.gateway.api_token = Some(Secret::new(v));
    }
    if let Some(v) = get("CLIPCAST_DOWNLOADS_DIR") {
        config.storage.downloads_dir = PathBuf::from(v);
    }
    if let Some(v) = get("CLIPCAST_YTDLP_PATH") {
        config.fetch.ytdlp_path = Some(v);
    }
    if let Some(v) = get("CLIPCAST_BIND") {
        config.server.bind = v;
    }
    if let Some(v) = get("CLIPCAST_PORT") {
        match v.trim().parse() {
            Ok(port) => config.server.port = port,
            Err(e) => warn!(value = %v, error = %e, "ignoring invalid CLIPCAST_PORT"),
        }
    }
}

fn parse_config(raw: &str, path: &Path) -> Result<ClipcastConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
    let parse_err = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| parse_err(e.to_string())),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| parse_err(e.to_string())),
        "json" => serde_json::from_str(raw).map_err(|e| parse_err(e.to_string())),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}
