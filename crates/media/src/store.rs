//! Local storage directory for downloaded media.
//!
//! Downloads land in a private staging directory under the root and are then
//! moved into the root under the first free name of
//! `Title.mp4`, `Title (1).mp4`, `Title (2).mp4`, ...
//! Existing files are never replaced.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use {tempfile::TempDir, tracing::debug};

use crate::error::{FetchError, Result};

/// Prefix of per-fetch staging directories inside the storage root.
pub const STAGING_PREFIX: &str = ".clipcast-staging-";

/// Give up looking for a free name after this many suffixes.
const MAX_SUFFIX: u32 = 10_000;

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root if missing and return its absolute form.
    pub fn ensure_root(&self) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.root).map_err(|e| {
            FetchError::storage(format!("creating {}", self.root.display()), e)
        })?;
        std::fs::canonicalize(&self.root)
            .map_err(|e| FetchError::storage(format!("resolving {}", self.root.display()), e))
    }

    /// A fresh staging directory under the root, removed when dropped.
    pub fn staging(&self) -> Result<TempDir> {
        let root = self.ensure_root()?;
        tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&root)
            .map_err(|e| FetchError::storage("creating staging directory", e))
    }

    /// Move a staged file into the root without overwriting anything.
    ///
    /// Returns the final absolute path.
    pub fn claim(&self, staged: &Path) -> Result<PathBuf> {
        let root = self.ensure_root()?;
        let filename = staged
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or(FetchError::NoOutput)?;

        for n in 0..MAX_SUFFIX {
            let candidate = root.join(numbered_name(&filename, n));
            match std::fs::hard_link(staged, &candidate) {
                Ok(()) => {
                    // The staging dir is dropped with the fetch, so a leftover link is harmless.
                    if let Err(e) = std::fs::remove_file(staged) {
                        debug!(path = %staged.display(), error = %e, "staged copy not removed");
                    }
                    debug!(path = %candidate.display(), "stored media file");
                    return Ok(candidate);
                },
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                // Filesystems without hard links: check-then-rename.
                Err(_) if !candidate.exists() => {
                    std::fs::rename(staged, &candidate).map_err(|e| {
                        FetchError::storage(format!("moving into {}", candidate.display()), e)
                    })?;
                    debug!(path = %candidate.display(), "stored media file");
                    return Ok(candidate);
                },
                Err(_) => continue,
            }
        }

        Err(FetchError::storage(
            format!("no free name for {filename}"),
            std::io::Error::from(ErrorKind::AlreadyExists),
        ))
    }
}

/// `name.ext` for `n == 0`, otherwise `name (n).ext`.
pub fn numbered_name(filename: &str, n: u32) -> String {
    if n == 0 {
        return filename.to_string();
    }
    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) => format!("{stem} ({n}).{}", ext.to_string_lossy()),
        None => format!("{stem} ({n})"),
    }
}
