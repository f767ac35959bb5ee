//! Configuration diagnostics for `clipcast check`.
//!
//! Unlike [`GatewayCredentials::from_config`], which stops at the first
//! problem class, this collects everything worth reporting in one pass.

use crate::{credentials::GatewayCredentials, error::ConfigError, schema::ClipcastConfig};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted config path or env var name, e.g. "fetch.format".
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(severity: Severity, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// Check a configuration for problems that would stop the pipeline.
#[must_use]
pub fn validate(config: &ClipcastConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    match GatewayCredentials::from_config(config) {
        Ok(_) => {},
        Err(ConfigError::MissingCredentials { fields }) => {
            for field in fields {
                result.push(Diagnostic::new(
                    Severity::Error,
                    field,
                    "required gateway value is not set",
                ));
            }
        },
        Err(ConfigError::Invalid { field, message }) => {
            result.push(Diagnostic::new(Severity::Error, field, message));
        },
        Err(other) => {
            result.push(Diagnostic::new(Severity::Error, "gateway", other.to_string()));
        },
    }

    if config.fetch.format.trim().is_empty() {
        result.push(Diagnostic::new(
            Severity::Error,
            "fetch.format",
            "format selector must not be empty",
        ));
    }
    if config.fetch.timeout_secs == 0 {
        result.push(Diagnostic::new(
            Severity::Error,
            "fetch.timeout_secs",
            "must be greater than zero",
        ));
    }

    let dir = &config.storage.downloads_dir;
    if dir.as_os_str().is_empty() {
        result.push(Diagnostic::new(
            Severity::Error,
            "storage.downloads_dir",
            "must not be empty",
        ));
    } else if dir.is_file() {
        result.push(Diagnostic::new(
            Severity::Error,
            "storage.downloads_dir",
            format!("{} exists and is not a directory", dir.display()),
        ));
    } else if !dir.exists() {
        result.push(Diagnostic::new(
            Severity::Info,
            "storage.downloads_dir",
            format!("{} will be created on first download", dir.display()),
        ));
    }

    if config.server.port == 0 {
        result.push(Diagnostic::new(
            Severity::Warning,
            "server.port",
            "port 0 binds a random port",
        ));
    }

    result
}
