//! `clipcast check`: configuration and environment report.
//!
//! Prints `[ok]`, `[warn]`, `[fail]` or `[info]` per item and exits non-zero
//! when anything would stop a job from running.

use std::path::Path;

use {
    anyhow::Result,
    clipcast_config::{ClipcastConfig, Severity, validate},
    clipcast_media::YtDlpFetcher,
};

// ── ANSI helpers ────────────────────────────────────────────────────────────

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warn,
    Fail,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Info => "info",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Ok => GREEN,
            Self::Warn => YELLOW,
            Self::Fail => RED,
            Self::Info => CYAN,
        }
    }
}

impl From<Severity> for Status {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => Self::Fail,
            Severity::Warning => Self::Warn,
            Severity::Info => Self::Info,
        }
    }
}

struct CheckItem {
    status: Status,
    message: String,
}

struct Section {
    title: String,
    items: Vec<CheckItem>,
}

impl Section {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, status: Status, message: impl Into<String>) {
        self.items.push(CheckItem {
            status,
            message: message.into(),
        });
    }

    fn count(&self, status: Status) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }
}

fn print_report(sections: &[Section]) -> (usize, usize) {
    let mut errors = 0usize;
    let mut warnings = 0usize;

    for section in sections {
        eprintln!("{BOLD}{}{RESET}", section.title);
        for item in &section.items {
            eprintln!(
                "  [{}{}{RESET}]  {}",
                item.status.color(),
                item.status.label(),
                item.message
            );
        }
        errors += section.count(Status::Fail);
        warnings += section.count(Status::Warn);
        eprintln!();
    }

    (errors, warnings)
}

// ── Entry point ─────────────────────────────────────────────────────────────

pub async fn handle_check(config: &ClipcastConfig, config_path: Option<&Path>) -> Result<()> {
    eprintln!("{BOLD}clipcast check{RESET}");
    eprintln!("{BOLD}=============={RESET}\n");

    let fetcher = YtDlpFetcher::from_config(&config.fetch, &config.storage);
    let version = match fetcher.find_binary() {
        Some(_) => fetcher.version().await.map_err(|e| e.to_string()),
        None => Err("not found".into()),
    };

    let sections = [
        check_config(config, config_path),
        check_downloader(&fetcher, &version),
    ];
    let (errors, warnings) = print_report(&sections);

    eprintln!("{BOLD}Summary:{RESET} {errors} error(s), {warnings} warning(s)");

    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

// ── Checks ──────────────────────────────────────────────────────────────────

fn check_config(config: &ClipcastConfig, config_path: Option<&Path>) -> Section {
    let label = config_path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "discovered config + environment".into());
    let mut section = Section::new(format!("Config ({label})"));

    let result = validate(config);
    for d in &result.diagnostics {
        section.push(d.severity.into(), format!("{}: {}", d.path, d.message));
    }
    if !result.has_errors() {
        section.push(Status::Ok, "gateway credentials present");
    }
    section.push(
        Status::Info,
        format!("downloads go to {}", config.storage.downloads_dir.display()),
    );
    section
}

fn check_downloader(
    fetcher: &YtDlpFetcher,
    version: &std::result::Result<String, String>,
) -> Section {
    let mut section = Section::new("Downloader (yt-dlp)");
    match (fetcher.find_binary(), version) {
        (Some(path), Ok(version)) => {
            section.push(Status::Ok, format!("{} (version {version})", path.display()));
        },
        (Some(path), Err(e)) => {
            section.push(Status::Warn, format!("{} found but --version failed: {e}", path.display()));
        },
        (None, _) => {
            section.push(
                Status::Fail,
                "yt-dlp not found; install it (pipx install yt-dlp) or set CLIPCAST_YTDLP_PATH",
            );
        },
    }
    section
}
