//! Configuration loading, env substitution, env overrides, and validation.
//!
//! Config files: `clipcast.toml`, `clipcast.yaml`, or `clipcast.json`
//! Searched in `./` then `~/.config/clipcast/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values. The three gateway
//! credentials are normally supplied through `GREEN_MEDIA_URL`,
//! `GREEN_INSTANCE_ID` and `GREEN_API_TOKEN`.

pub mod credentials;
pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    credentials::GatewayCredentials,
    error::{ConfigError, Result},
    loader::{apply_env_overrides, config_dir, discover_and_load, load_config, load_from},
    schema::{ClipcastConfig, FetchConfig, GatewayConfig, ServerConfig, StorageConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
