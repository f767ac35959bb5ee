//! `yt-dlp` backed fetcher.
//!
//! yt-dlp resolves a page URL (YouTube and the many other sites it supports)
//! to a downloadable stream. We run it as a subprocess, pointed at a staging
//! directory, and move the result into the media store once it is complete.
//!
//! Installation:
//! - `pipx install yt-dlp`, `brew install yt-dlp`, or a release binary from
//!   https://github.com/yt-dlp/yt-dlp

use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use {
    async_trait::async_trait,
    clipcast_config::{FetchConfig, StorageConfig},
    tokio::process::Command,
    tracing::{debug, info, warn},
    url::Url,
};

use crate::{
    Fetcher, MediaFile, binary,
    error::{FetchError, Result},
    mime,
    store::MediaStore,
};

/// Binary looked up on `PATH` when no explicit path is configured.
const BINARY_NAME: &str = "yt-dlp";

/// File name template; yt-dlp sanitizes the title for the local filesystem.
const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// How many stderr lines to keep in a failure message.
const STDERR_TAIL_LINES: usize = 3;

/// Suffixes yt-dlp uses for incomplete or intermediate files.
const PARTIAL_SUFFIXES: &[&str] = &[".part", ".ytdl", ".temp"];

const VERSION_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetcher that shells out to `yt-dlp`.
#[derive(Clone, Debug)]
pub struct YtDlpFetcher {
    binary_path: Option<String>,
    format: String,
    timeout: Duration,
    store: MediaStore,
}

impl YtDlpFetcher {
    /// Fetcher with default format and timeout writing into `store`.
    #[must_use]
    pub fn new(store: MediaStore) -> Self {
        let defaults = FetchConfig::default();
        Self {
            binary_path: None,
            format: defaults.format,
            timeout: Duration::from_secs(defaults.timeout_secs),
            store,
        }
    }

    #[must_use]
    pub fn from_config(fetch: &FetchConfig, storage: &StorageConfig) -> Self {
        Self {
            binary_path: fetch.ytdlp_path.clone(),
            format: fetch.format.clone(),
            timeout: Duration::from_secs(fetch.timeout_secs),
            store: MediaStore::new(&storage.downloads_dir),
        }
    }

    #[must_use]
    pub fn with_binary(mut self, path: impl Into<String>) -> Self {
        self.binary_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn store(&self) -> &MediaStore {
        &self.store
    }

    /// Resolve the yt-dlp binary.
    pub fn find_binary(&self) -> Option<PathBuf> {
        binary::find_binary(BINARY_NAME, self.binary_path.as_deref())
    }

    pub fn is_available(&self) -> bool {
        self.find_binary().is_some()
    }

    /// `yt-dlp --version`, for diagnostics.
    pub async fn version(&self) -> Result<String> {
        let binary = self.require_binary()?;
        let output = Command::new(&binary)
            .arg("--version")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(VERSION_TIMEOUT, output)
            .await
            .map_err(|_| FetchError::Timeout {
                secs: VERSION_TIMEOUT.as_secs(),
            })?
            .map_err(|source| FetchError::Spawn {
                binary: binary.display().to_string(),
                source,
            })?;
        if !output.status.success() {
            return Err(FetchError::Failed {
                code: output.status.code(),
                stderr: stderr_tail(&output.stderr),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn require_binary(&self) -> Result<PathBuf> {
        self.find_binary().ok_or_else(|| FetchError::BinaryNotFound {
            binary: self
                .binary_path
                .clone()
                .unwrap_or_else(|| BINARY_NAME.into()),
        })
    }

    fn command(&self, binary: &Path, staging: &Path, url: &Url) -> Command {
        let mut cmd = Command::new(binary);
        // Only the primary item of a playlist URL is ever fetched.
        cmd.args(["--no-playlist", "--playlist-items", "1"]);
        cmd.arg("--format").arg(&self.format);
        cmd.args(["--no-progress", "--no-simulate"]);
        cmd.args(["--print", "after_move:filepath"]);
        cmd.arg("--output").arg(staging.join(OUTPUT_TEMPLATE));
        cmd.arg("--").arg(url.as_str());
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout also reaches ffmpeg and other helpers.
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }

    async fn download(&self, url: &Url) -> Result<MediaFile> {
        let binary = self.require_binary()?;
        let staging = self.store.staging()?;

        let mut cmd = self.command(&binary, staging.path(), url);
        debug!(binary = %binary.display(), format = %self.format, staging = %staging.path().display(), "spawning yt-dlp");

        let child = cmd.spawn().map_err(|source| FetchError::Spawn {
            binary: binary.display().to_string(),
            source,
        })?;

        let pid = child.id();

        // yt-dlp itself also dies with the dropped child (kill_on_drop).
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output,
            Err(_) => {
                kill_process_group(pid);
                return Err(FetchError::Timeout {
                    secs: self.timeout.as_secs(),
                });
            },
        };
        let output = output.map_err(|source| FetchError::Spawn {
            binary: binary.display().to_string(),
            source,
        })?;

        if !output.status.success() {
            return Err(FetchError::Failed {
                code: output.status.code(),
                stderr: stderr_tail(&output.stderr),
            });
        }

        let staged = locate_output(staging.path(), &String::from_utf8_lossy(&output.stdout))?;

        let size = std::fs::metadata(&staged)
            .map_err(|e| FetchError::storage(format!("reading {}", staged.display()), e))?
            .len();
        if size == 0 {
            return Err(FetchError::EmptyFile { path: staged });
        }

        let mime_type = mime::from_path(&staged);
        if !mime::is_deliverable(mime_type) {
            return Err(FetchError::UnsupportedFormat {
                extension: staged
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            });
        }

        let final_path = self.store.claim(&staged)?;
        info!(path = %final_path.display(), bytes = size, "video downloaded");
        Ok(MediaFile::new(final_path, mime_type))
    }
}

#[async_trait]
impl Fetcher for YtDlpFetcher {
    async fn fetch(&self, source_url: &str) -> Result<MediaFile> {
        let url = validate_source_url(source_url)?;
        info!(url = %url, "downloading video");
        self.download(&url).await.inspect_err(|e| {
            warn!(url = %url, error = %e, "video download failed");
        })
    }
}

/// Accept only absolute `http`/`https` URLs with a host.
pub fn validate_source_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FetchError::invalid_url(raw, "URL is empty"));
    }
    let url = Url::parse(trimmed).map_err(|e| FetchError::invalid_url(trimmed, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(FetchError::invalid_url(
            trimmed,
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(FetchError::invalid_url(trimmed, "missing host"));
    }
    Ok(url)
}

/// Find the finished file in the staging directory.
///
/// Prefers the path yt-dlp printed; falls back to the largest complete file.
fn locate_output(staging: &Path, stdout: &str) -> Result<PathBuf> {
    let printed = stdout
        .lines()
        .map(str::trim)
        .rfind(|l| !l.is_empty())
        .map(PathBuf::from)
        .filter(|p| p.starts_with(staging) && p.is_file());
    if let Some(path) = printed {
        return Ok(path);
    }

    let entries = std::fs::read_dir(staging)
        .map_err(|e| FetchError::storage("listing staging directory", e))?;
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && !is_partial(p))
        .max_by_key(|p| std::fs::metadata(p).map(|m| m.len()).unwrap_or(0))
        .ok_or(FetchError::NoOutput)
}

fn is_partial(path: &Path) -> bool {
    let name = path.to_string_lossy();
    PARTIAL_SUFFIXES.iter().any(|s| name.ends_with(s))
}

/// The `ERROR:` lines of yt-dlp's stderr, or its last few lines.
/// Kill whatever is left of yt-dlp's process group after a timeout.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::{
        sys::signal::{Signal, killpg},
        unistd::Pid,
    };

    let Some(pid) = pid else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        debug!(pid, error = %e, "yt-dlp process group already gone");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let errors: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|l| l.starts_with("ERROR"))
        .collect();
    let picked = if errors.is_empty() {
        &lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..]
    } else {
        &errors[errors.len().saturating_sub(STDERR_TAIL_LINES)..]
    };
    picked.join("; ")
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_urls() {
        let url = validate_source_url(" https://www.youtube.com/watch?v=dQw4w9WgXcQ ").unwrap();
        assert_eq!(url.host_str(), Some("www.youtube.com"));
        assert!(validate_source_url("http://youtu.be/dQw4w9WgXcQ").is_ok());
    }

    #[test]
    fn rejects_malformed_urls() {
        for bad in ["", "   ", "not a url", "www.youtube.com/watch?v=x", "ftp://host/v.mp4", "file:///etc/passwd"] {
            assert!(
                matches!(validate_source_url(bad), Err(FetchError::InvalidUrl { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn stderr_tail_prefers_error_lines() {
        let stderr = b"[youtube] abc: Downloading webpage\nWARNING: slow\nERROR: [youtube] abc: Video unavailable\n";
        assert_eq!(
            stderr_tail(stderr),
            "ERROR: [youtube] abc: Video unavailable"
        );

        let stderr = b"one\ntwo\nthree\nfour\n";
        assert_eq!(stderr_tail(stderr), "two; three; four");
    }

    #[test]
    fn locate_output_prefers_printed_path() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("A.mp4");
        let b = dir.path().join("B.mp4");
        std::fs::write(&a, b"aaaa").unwrap();
        std::fs::write(&b, b"b").unwrap();

        let stdout = format!("{}\n", b.display());
        assert_eq!(locate_output(dir.path(), &stdout).unwrap(), b);
    }

    #[test]
    fn locate_output_falls_back_to_largest_complete_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("small.mp4"), b"s").unwrap();
        std::fs::write(dir.path().join("big.mp4"), b"bigger").unwrap();
        std::fs::write(dir.path().join("huge.mp4.part"), b"partial-but-huge").unwrap();

        let found = locate_output(dir.path(), "/elsewhere/not-in-staging.mp4\n").unwrap();
        assert_eq!(found.file_name().unwrap(), "big.mp4");

        let empty = tempfile::tempdir().unwrap();
        assert!(matches!(
            locate_output(empty.path(), ""),
            Err(FetchError::NoOutput)
        ));
    }

    #[tokio::test]
    async fn invalid_url_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("downloads");
        let fetcher = YtDlpFetcher::new(MediaStore::new(&root)).with_binary("/bin/true");

        let err = fetcher.fetch("definitely not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn missing_binary_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = YtDlpFetcher::new(MediaStore::new(dir.path()))
            .with_binary("/definitely/not/here/yt-dlp");

        let err = fetcher
            .fetch("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::BinaryNotFound { .. }));
        assert!(!fetcher.is_available());
    }

    // ── Fake yt-dlp scripts ────────────────────────────────────────────────

    #[cfg(unix)]
    mod fake_binary {
        use {
            super::*,
            std::os::unix::fs::PermissionsExt,
            tokio::sync::{Mutex, MutexGuard},
        };

        const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PL123";

        /// Serializes write-then-exec of scripts so no other test thread
        /// forks while a script is still open for writing (ETXTBSY).
        static EXEC_LOCK: Mutex<()> = Mutex::const_new(());

        struct Harness {
            _guard: MutexGuard<'static, ()>,
            _scripts: tempfile::TempDir,
            downloads: tempfile::TempDir,
            script: PathBuf,
        }

        impl Harness {
            async fn new(body: &str) -> Self {
                let guard = EXEC_LOCK.lock().await;
                let scripts = tempfile::tempdir().unwrap();
                let script = scripts.path().join("yt-dlp");
                std::fs::write(&script, format!("#!/bin/sh\n{body}")).unwrap();
                std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
                Self {
                    _guard: guard,
                    _scripts: scripts,
                    downloads: tempfile::tempdir().unwrap(),
                    script,
                }
            }

            fn fetcher(&self) -> YtDlpFetcher {
                YtDlpFetcher::new(MediaStore::new(self.downloads.path()))
                    .with_binary(self.script.to_string_lossy())
            }

            fn stored_files(&self) -> Vec<String> {
                let mut names: Vec<String> = std::fs::read_dir(self.downloads.path())
                    .unwrap()
                    .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                    .collect();
                names.sort();
                names
            }
        }

        /// Writes `content` to the `--output` template with the given title/ext
        /// substituted, then prints the path like `--print after_move:filepath`.
        fn writing_script(title: &str, ext: &str, content: &str) -> String {
            format!(
                r#"out=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "--output" ]; then out="$arg"; fi
  prev="$arg"
done
path=$(printf '%s' "$out" | sed -e 's/%(title)s/{title}/' -e 's/%(ext)s/{ext}/')
printf '%s' '{content}' > "$path"
printf '%s\n' "$path"
"#
            )
        }

        #[tokio::test]
        async fn successful_fetch_stores_mp4() {
            let h = Harness::new(&writing_script("Sample Clip", "mp4", "fake-video-bytes")).await;

            let file = h.fetcher().fetch(URL).await.unwrap();

            assert!(file.path.is_absolute());
            assert!(file.path.is_file());
            assert_eq!(file.filename, "Sample Clip.mp4");
            assert_eq!(file.mime_type, "video/mp4");
            assert!(std::fs::metadata(&file.path).unwrap().len() > 0);
            assert_eq!(
                file.path.parent().unwrap(),
                std::fs::canonicalize(h.downloads.path()).unwrap()
            );
            // Staging directory is gone.
            assert_eq!(h.stored_files(), vec!["Sample Clip.mp4"]);
        }

        #[tokio::test]
        async fn repeated_fetch_keeps_earlier_file() {
            let h = Harness::new(&writing_script("Sample Clip", "mp4", "fake-video-bytes")).await;
            let fetcher = h.fetcher();

            let first = fetcher.fetch(URL).await.unwrap();
            let second = fetcher.fetch(URL).await.unwrap();

            assert_ne!(first.path, second.path);
            assert_eq!(second.filename, "Sample Clip (1).mp4");
            assert_eq!(std::fs::read(&first.path).unwrap(), b"fake-video-bytes");
            assert_eq!(
                h.stored_files(),
                vec!["Sample Clip (1).mp4", "Sample Clip.mp4"]
            );
        }

        #[tokio::test]
        async fn passes_single_video_arguments() {
            let h = Harness::new(
                r#"printf '%s\n' "$@" > "$(dirname "$0")/args.txt"
exit 1
"#,
            )
            .await;

            let _ = h.fetcher().with_format("best[ext=mp4]").fetch(URL).await;

            let args = std::fs::read_to_string(h.script.with_file_name("args.txt")).unwrap();
            let args: Vec<&str> = args.lines().collect();
            assert!(args.contains(&"--no-playlist"));
            let items = args.iter().position(|a| *a == "--playlist-items").unwrap();
            assert_eq!(args[items + 1], "1");
            let format = args.iter().position(|a| *a == "--format").unwrap();
            assert_eq!(args[format + 1], "best[ext=mp4]");
            // URL comes last, after the option terminator.
            assert_eq!(args[args.len() - 2], "--");
            assert_eq!(args[args.len() - 1], URL);
        }

        #[tokio::test]
        async fn failure_leaves_no_file_behind() {
            let mut body = writing_script("Broken", "mp4.part", "half");
            body.push_str("echo 'ERROR: [youtube] dQw4w9WgXcQ: Video unavailable' >&2\nexit 1\n");
            let h = Harness::new(&body).await;

            let err = h.fetcher().fetch(URL).await.unwrap_err();

            match err {
                FetchError::Failed { code, stderr } => {
                    assert_eq!(code, Some(1));
                    assert!(stderr.contains("Video unavailable"));
                },
                other => panic!("unexpected error: {other}"),
            }
            assert!(h.stored_files().is_empty());
        }

        #[tokio::test]
        async fn non_mp4_output_is_rejected() {
            let h = Harness::new(&writing_script("Clip", "webm", "webm-bytes")).await;

            let err = h.fetcher().fetch(URL).await.unwrap_err();

            assert!(matches!(err, FetchError::UnsupportedFormat { ref extension } if extension == "webm"));
            assert!(h.stored_files().is_empty());
        }

        #[tokio::test]
        async fn empty_output_is_rejected() {
            let h = Harness::new(&writing_script("Clip", "mp4", "")).await;

            let err = h.fetcher().fetch(URL).await.unwrap_err();

            assert!(matches!(err, FetchError::EmptyFile { .. }));
            assert!(h.stored_files().is_empty());
        }

        #[tokio::test]
        async fn success_without_file_is_no_output() {
            let h = Harness::new("exit 0\n").await;

            let err = h.fetcher().fetch(URL).await.unwrap_err();

            assert!(matches!(err, FetchError::NoOutput));
            assert!(h.stored_files().is_empty());
        }

        #[tokio::test]
        async fn slow_download_times_out() {
            let h = Harness::new("exec sleep 10\n").await;

            let err = h
                .fetcher()
                .with_timeout(Duration::from_millis(200))
                .fetch(URL)
                .await
                .unwrap_err();

            assert!(matches!(err, FetchError::Timeout { .. }));
            assert!(h.stored_files().is_empty());
        }

        #[tokio::test]
        async fn timeout_also_stops_child_processes() {
            let h = Harness::new(
                "(sleep 1; touch \"$(dirname \"$0\")/late.txt\") &\nexec sleep 10\n",
            )
            .await;

            let err = h
                .fetcher()
                .with_timeout(Duration::from_millis(200))
                .fetch(URL)
                .await
                .unwrap_err();
            assert!(matches!(err, FetchError::Timeout { .. }));

            tokio::time::sleep(Duration::from_millis(1500)).await;
            assert!(!h.script.with_file_name("late.txt").exists());
        }

        #[tokio::test]
        async fn version_reads_stdout() {
            let h = Harness::new("echo 2025.01.15\n").await;
            assert_eq!(h.fetcher().version().await.unwrap(), "2025.01.15");
        }
    }
}
