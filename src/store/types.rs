//! Artifact types, filename conventions and API request/response shapes

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// File extensions the store recognizes as artifacts.
pub const RECOGNIZED_EXTENSIONS: &[&str] = &["md", "webm", "mp4", "jpg", "jpeg", "png", "gif"];

/// Kind of a user-contributed artifact, derived from its filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Note,
    Image,
    Audio,
    Video,
}

impl ArtifactKind {
    /// Derive the kind from a filename.
    ///
    /// Media filenames embed a kind token (`<device>-<kind>-<timestamp>`),
    /// which wins over the extension; `.webm` alone is treated as audio.
    /// Returns `None` for unrecognized extensions.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
        if !RECOGNIZED_EXTENSIONS.contains(&ext.as_str()) {
            return None;
        }
        if ext == "md" {
            return Some(Self::Note);
        }
        if filename.contains("-audio-") {
            return Some(Self::Audio);
        }
        if filename.contains("-video-") {
            return Some(Self::Video);
        }
        if filename.contains("-image-") {
            return Some(Self::Image);
        }
        match ext.as_str() {
            "jpg" | "jpeg" | "png" | "gif" => Some(Self::Image),
            "mp4" => Some(Self::Video),
            "webm" => Some(Self::Audio),
            _ => None,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Note => "note",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
        };
        write!(f, "{}", s)
    }
}

/// One user-contributed item in the store.
///
/// `content` is populated for notes only; media artifacts carry metadata and
/// their on-disk path, never the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub filename: String,
    pub kind: ArtifactKind,
    pub modified_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Filename-safe timestamp: RFC 3339 with `:` and `.` replaced by `-`.
pub fn filename_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// Filename for a new text note: `note-<timestamp>.md`.
pub fn note_filename(now: DateTime<Utc>) -> String {
    format!("note-{}.md", filename_timestamp(now))
}

/// Filename for a new media artifact:
/// `<device>-<kind>-<timestamp>.<ext>`.
pub fn media_filename(device: &str, kind: ArtifactKind, now: DateTime<Utc>, ext: &str) -> String {
    format!("{}-{}-{}.{}", device, kind, filename_timestamp(now), ext)
}

// =============================================================================
// Bridge request/response types
// =============================================================================

/// Request body for saving a text note.
#[derive(Debug, Deserialize)]
pub struct SaveNoteRequest {
    pub filename: String,
    pub content: String,
}

/// Request body for saving a media artifact. `data` is the base64 payload,
/// with or without a `data:<mime>;base64,` prefix.
#[derive(Debug, Deserialize)]
pub struct SaveMediaRequest {
    pub filename: String,
    pub data: String,
}

/// Outcome envelope for save operations.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            path: None,
            error: None,
        }
    }

    pub fn ok_with_path(path: impl Into<String>) -> Self {
        Self {
            success: true,
            path: Some(path.into()),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            path: None,
            error: Some(error.into()),
        }
    }
}

/// Outcome envelope for listing artifacts.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub success: bool,
    pub artifacts: Vec<Artifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response for the device identity readout.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeviceResponse {
    pub device: String,
}
