use std::path::PathBuf;

/// Crate-wide result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Typed configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// One or more gateway credentials are absent or blank.
    #[error("missing gateway configuration: {}", .fields.join(", "))]
    MissingCredentials { fields: Vec<&'static str> },

    /// A value is present but unusable.
    #[error("invalid config value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("unsupported config format: .{0}")]
    UnsupportedFormat(String),
}

impl ConfigError {
    #[must_use]
    pub fn invalid(field: &'static str, message: impl std::fmt::Display) -> Self {
        Self::Invalid {
            field,
            message: message.to_string(),
        }
    }
}
