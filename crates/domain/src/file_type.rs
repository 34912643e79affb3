//! Upload content rules: MIME detection, allowlist and categories.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use taskhub_core::{AppError, AppResult};

/// Default upload size limit (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Fallback MIME type when nothing else matches.
pub const OCTET_STREAM: &str = "application/octet-stream";

const DOC: &str = "application/msword";
const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const XLS: &str = "application/vnd.ms-excel";
const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// MIME types accepted for upload.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
    DOC,
    DOCX,
    XLS,
    XLSX,
    "text/plain",
    "application/zip",
    "application/x-rar-compressed",
    "application/x-7z-compressed",
];

const DOCUMENT_MIME_TYPES: &[&str] = &["application/pdf", DOC, DOCX, XLS, XLSX, "text/plain"];

const ARCHIVE_MIME_TYPES: &[&str] = &[
    "application/zip",
    "application/x-rar-compressed",
    "application/x-7z-compressed",
];

const MAGIC_SIGNATURES: &[(&[u8], &str)] = &[
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"\x89PNG\r\n\x1A\n", "image/png"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"%PDF-", "application/pdf"),
    (b"Rar!\x1A\x07", "application/x-rar-compressed"),
    (b"7z\xBC\xAF\x27\x1C", "application/x-7z-compressed"),
    (b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1", "application/x-ole-storage"),
    (b"PK\x03\x04", "application/zip"),
];

const EXTENSION_MIME_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("pdf", "application/pdf"),
    ("doc", DOC),
    ("docx", DOCX),
    ("xls", XLS),
    ("xlsx", XLSX),
    ("txt", "text/plain"),
    ("zip", "application/zip"),
    ("rar", "application/x-rar-compressed"),
    ("7z", "application/x-7z-compressed"),
];

/// Broad grouping of uploaded files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    /// Any `image/*` type.
    Image,
    /// Office documents, PDF and plain text.
    Document,
    /// Compressed archives.
    Archive,
    /// Everything else.
    Other,
}

impl FileCategory {
    /// Classifies a MIME type.
    #[must_use]
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("image/") {
            Self::Image
        } else if DOCUMENT_MIME_TYPES.contains(&mime_type) {
            Self::Document
        } else if ARCHIVE_MIME_TYPES.contains(&mime_type) {
            Self::Archive
        } else {
            Self::Other
        }
    }

    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Document => "document",
            Self::Archive => "archive",
            Self::Other => "other",
        }
    }

    /// Returns all categories.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[FileCategory] = &[
            FileCategory::Image,
            FileCategory::Document,
            FileCategory::Archive,
            FileCategory::Other,
        ];

        ALL
    }
}

impl FromStr for FileCategory {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "image" => Ok(Self::Image),
            "document" => Ok(Self::Document),
            "archive" => Ok(Self::Archive),
            "other" => Ok(Self::Other),
            _ => Err(AppError::Validation(format!(
                "unknown file category '{value}'"
            ))),
        }
    }
}

/// Detects the MIME type of an upload.
///
/// Content signatures win over the filename. Container formats (zip, OLE)
/// are refined by extension so that office documents keep their real type.
#[must_use]
pub fn detect_mime_type(content: &[u8], filename: &str) -> &'static str {
    let by_extension = mime_from_extension(filename);

    if content.len() >= 12 && &content[..4] == b"RIFF" && &content[8..12] == b"WEBP" {
        return "image/webp";
    }

    let sniffed = MAGIC_SIGNATURES
        .iter()
        .find(|(signature, _)| content.starts_with(signature))
        .map(|(_, mime_type)| *mime_type);

    match sniffed {
        Some("application/zip") => match by_extension {
            Some(mime_type @ (DOCX | XLSX)) => mime_type,
            _ => "application/zip",
        },
        Some("application/x-ole-storage") => match by_extension {
            Some(mime_type @ (DOC | XLS)) => mime_type,
            _ => OCTET_STREAM,
        },
        Some(mime_type) => mime_type,
        None => by_extension.unwrap_or(OCTET_STREAM),
    }
}

/// Looks up a MIME type by filename extension.
#[must_use]
pub fn mime_from_extension(filename: &str) -> Option<&'static str> {
    let extension = file_extension(filename)?;
    EXTENSION_MIME_TYPES
        .iter()
        .find(|(known, _)| *known == extension)
        .map(|(_, mime_type)| *mime_type)
}

/// Returns the lower-cased extension without the dot.
#[must_use]
pub fn file_extension(filename: &str) -> Option<String> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let (stem, extension) = name.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}

/// Validates an upload against the size limit and type allowlist.
/// Returns the detected MIME type.
pub fn validate_upload(
    content: &[u8],
    filename: &str,
    max_upload_bytes: u64,
) -> AppResult<&'static str> {
    let size = content.len() as u64;
    if size > max_upload_bytes {
        return Err(AppError::Validation(format!(
            "file is too large: maximum size is {} MB",
            max_upload_bytes / (1024 * 1024)
        )));
    }

    let mime_type = detect_mime_type(content, filename);
    if !ALLOWED_MIME_TYPES.contains(&mime_type) {
        return Err(AppError::Validation(format!(
            "file type {mime_type} is not supported; allowed types: {}",
            ALLOWED_MIME_TYPES.join(", ")
        )));
    }

    Ok(mime_type)
}

/// Formats a byte count as "12.3 KB".
#[must_use]
pub fn human_readable_size(size: u64) -> String {
    let mut value = size as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if value < 1024.0 {
            return format!("{value:.1} {unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.1} TB")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_signature_wins_over_extension() {
        let content = b"\x89PNG\r\n\x1A\n0000";
        assert_eq!(detect_mime_type(content, "notes.txt"), "image/png");
    }

    #[test]
    fn zip_container_keeps_office_extension() {
        let content = b"PK\x03\x04rest";
        assert_eq!(detect_mime_type(content, "report.docx"), DOCX);
        assert_eq!(detect_mime_type(content, "bundle.zip"), "application/zip");
        assert_eq!(detect_mime_type(content, "bundle"), "application/zip");
    }

    #[test]
    fn unknown_content_falls_back_to_extension() {
        assert_eq!(detect_mime_type(b"hello", "readme.TXT"), "text/plain");
        assert_eq!(detect_mime_type(b"hello", "script.sh"), OCTET_STREAM);
    }

    #[test]
    fn webp_is_detected_from_riff_header() {
        let content = b"RIFF\x00\x00\x00\x00WEBPVP8 ";
        assert_eq!(detect_mime_type(content, "x"), "image/webp");
    }

    #[test]
    fn disallowed_type_is_rejected() {
        assert!(validate_upload(b"#!/bin/sh", "run.sh", DEFAULT_MAX_UPLOAD_BYTES).is_err());
    }

    #[test]
    fn oversized_upload_is_rejected() {
        let content = vec![b'a'; 11];
        assert!(validate_upload(&content, "a.txt", 10).is_err());
        assert!(matches!(
            validate_upload(&content, "a.txt", 11),
            Ok("text/plain")
        ));
    }

    #[test]
    fn categories_follow_mime_groups() {
        assert_eq!(FileCategory::from_mime("image/gif"), FileCategory::Image);
        assert_eq!(FileCategory::from_mime(XLSX), FileCategory::Document);
        assert_eq!(FileCategory::from_mime("application/x-7z-compressed"), FileCategory::Archive);
        assert_eq!(FileCategory::from_mime(OCTET_STREAM), FileCategory::Other);
    }

    #[test]
    fn sizes_are_humanized() {
        assert_eq!(human_readable_size(512), "512.0 B");
        assert_eq!(human_readable_size(1536), "1.5 KB");
        assert_eq!(human_readable_size(10 * 1024 * 1024), "10.0 MB");
    }

    #[test]
    fn extension_ignores_directories_and_dotfiles() {
        assert_eq!(file_extension("dir.v2/archive.ZIP").as_deref(), Some("zip"));
        assert_eq!(file_extension(".bashrc"), None);
        assert_eq!(file_extension("Makefile"), None);
    }
}
