//! Locating the external downloader binary.

use std::path::PathBuf;

/// Find a binary at an explicit path, or on `PATH`.
///
/// An explicit path is authoritative: when it does not point at a file the
/// lookup fails instead of silently picking up another install from `PATH`.
pub fn find_binary(name: &str, config_path: Option<&str>) -> Option<PathBuf> {
    match config_path {
        Some(raw) => Some(expand_tilde(raw)).filter(|p| p.is_file()),
        None => which::which(name).ok(),
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(dirs) = directories::BaseDirs::new()
    {
        return dirs.home_dir().join(stripped);
    }
    PathBuf::from(path)
}
