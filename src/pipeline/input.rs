//! Upload intake: classify the media type, enforce the size cap, and stage
//! the bytes in a temporary file.
//!
//! ## Why stage to disk?
//!
//! The PDF and DOCX parsers want a seekable file, and the raw bytes are also
//! needed for vision providers. Writing once to a [`NamedTempFile`] gives the
//! extractor a path while the file is removed automatically when the
//! [`StagedUpload`] is dropped, on success and on every error path alike.

use crate::error::TranslateError;
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_JSON: &str = "application/json";
pub const MIME_TEXT: &str = "text/plain";

/// Coarse document category that drives extraction and provider routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Pdf,
    Docx,
    Text,
    Json,
}

impl MediaKind {
    /// Classify from the declared media type, falling back to the file
    /// extension when the type is missing or generic.
    pub fn classify(media_type: &str, filename: &str) -> Option<MediaKind> {
        let mt = media_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        if mt.starts_with("image/") {
            return Some(MediaKind::Image);
        }
        match mt.as_str() {
            MIME_PDF => return Some(MediaKind::Pdf),
            MIME_DOCX => return Some(MediaKind::Docx),
            MIME_JSON => return Some(MediaKind::Json),
            _ => {}
        }
        if mt.starts_with("text/") {
            return Some(MediaKind::Text);
        }

        let ext = extension(filename)?;
        match ext.as_str() {
            "pdf" => Some(MediaKind::Pdf),
            "docx" => Some(MediaKind::Docx),
            "json" => Some(MediaKind::Json),
            "txt" | "md" | "csv" => Some(MediaKind::Text),
            e if image_mime_for(e).is_some() => Some(MediaKind::Image),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MediaKind::Image => "image",
            MediaKind::Pdf => "pdf",
            MediaKind::Docx => "docx",
            MediaKind::Text => "text",
            MediaKind::Json => "json",
        };
        f.write_str(s)
    }
}

fn extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn image_mime_for(ext: &str) -> Option<&'static str> {
    match ext {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Best-effort media type for a file name, used when the caller gives none.
pub fn guess_media_type(filename: &str) -> &'static str {
    match extension(filename).as_deref() {
        Some("pdf") => MIME_PDF,
        Some("docx") => MIME_DOCX,
        Some("json") => MIME_JSON,
        Some("txt") | Some("md") | Some("csv") => MIME_TEXT,
        Some(e) => image_mime_for(e).unwrap_or("application/octet-stream"),
        None => "application/octet-stream",
    }
}

/// An uploaded document, validated and classified.
#[derive(Clone)]
pub struct FilePayload {
    pub bytes: Vec<u8>,
    pub media_type: String,
    pub filename: String,
    pub kind: MediaKind,
}

impl fmt::Debug for FilePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePayload")
            .field("filename", &self.filename)
            .field("media_type", &self.media_type)
            .field("kind", &self.kind)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl FilePayload {
    /// Validate an upload.
    ///
    /// An absent or generic media type is replaced by a guess from the
    /// extension so that downstream providers always see a concrete type.
    pub fn new(
        filename: impl Into<String>,
        media_type: Option<&str>,
        bytes: Vec<u8>,
        max_bytes: usize,
    ) -> Result<Self, TranslateError> {
        let filename = filename.into();
        if bytes.is_empty() {
            return Err(TranslateError::MissingFile);
        }
        if bytes.len() > max_bytes {
            return Err(TranslateError::FileTooLarge {
                filename,
                size: bytes.len(),
                limit: max_bytes,
            });
        }

        let declared = media_type.map(str::trim).unwrap_or("");
        let media_type = if declared.is_empty() || declared == "application/octet-stream" {
            guess_media_type(&filename).to_string()
        } else {
            declared.to_string()
        };

        let kind = MediaKind::classify(&media_type, &filename).ok_or_else(|| {
            TranslateError::UnsupportedMediaType {
                filename: filename.clone(),
                media_type: media_type.clone(),
            }
        })?;

        debug!(
            "Accepted upload '{}': {} ({}, {} bytes)",
            filename,
            media_type,
            kind,
            bytes.len()
        );

        Ok(Self {
            bytes,
            media_type,
            filename,
            kind,
        })
    }

    /// Load a local file, guessing its media type from the extension.
    pub async fn from_path(path: &Path, max_bytes: usize) -> Result<Self, TranslateError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| TranslateError::ExtractionFailed {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();
        Self::new(filename, None, bytes, max_bytes)
    }

    /// Size in KiB, rounded to two decimals.
    pub fn size_kib(&self) -> f64 {
        (self.bytes.len() as f64 / 1024.0 * 100.0).round() / 100.0
    }
}

/// A payload written to a temporary file; the file is deleted on drop.
pub struct StagedUpload {
    file: NamedTempFile,
}

impl StagedUpload {
    /// Write `payload` into `dir` (or the system temp dir).
    pub fn stage(payload: &FilePayload, dir: Option<&Path>) -> Result<Self, TranslateError> {
        let suffix = extension(&payload.filename)
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        let mut builder = tempfile::Builder::new();
        builder.prefix("upload-").suffix(&suffix);
        let created = match dir {
            Some(d) => builder.tempfile_in(d),
            None => builder.tempfile(),
        };
        let mut file =
            created.map_err(|e| TranslateError::Internal(format!("Failed to stage upload: {e}")))?;
        file.write_all(&payload.bytes)
            .and_then(|_| file.flush())
            .map_err(|e| TranslateError::Internal(format!("Failed to write upload: {e}")))?;
        debug!("Staged '{}' at {}", payload.filename, file.path().display());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn path_buf(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }
}
