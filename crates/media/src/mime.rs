//! Extension-based MIME detection for downloaded video.

use std::path::Path;

/// The media type the gateway upload declares.
pub const DELIVERABLE_MIME: &str = "video/mp4";

const VIDEO_TYPES: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("m4v", "video/mp4"),
    ("3gp", "video/3gpp"),
    ("webm", "video/webm"),
    ("mkv", "video/x-matroska"),
    ("mov", "video/quicktime"),
    ("flv", "video/x-flv"),
];

/// MIME type for a file extension (case-insensitive), if it is a known video container.
pub fn from_extension(ext: &str) -> Option<&'static str> {
    let ext = ext.trim_start_matches('.');
    VIDEO_TYPES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
}

/// MIME type for a path, falling back to `application/octet-stream`.
pub fn from_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(from_extension)
        .unwrap_or("application/octet-stream")
}

/// Whether the gateway will accept this file as a `video/mp4` upload.
pub fn is_deliverable(mime: &str) -> bool {
    mime == DELIVERABLE_MIME
}
