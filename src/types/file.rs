use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse classification of a stored file, used to route preview requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Video,
    Audio,
    Pdf,
    Text,
    Blob,
    Directory,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileKind::Image => "image",
            FileKind::Video => "video",
            FileKind::Audio => "audio",
            FileKind::Pdf => "pdf",
            FileKind::Text => "text",
            FileKind::Blob => "blob",
            FileKind::Directory => "directory",
        };
        f.write_str(name)
    }
}

/// Number of leading bytes sniffed when the extension is not conclusive.
pub const HEADER_SNIFF_LEN: usize = 512;

pub struct FileTypeDetector;

impl FileTypeDetector {
    /// MIME type guessed from the file name's extension.
    pub fn mime_from_name(name: &str) -> Option<String> {
        mime_guess::from_path(name)
            .first()
            .map(|mime| mime.essence_str().to_string())
    }

    /// Classifies a file from its name, falling back to content sniffing
    /// when `header` is provided and the extension is unknown.
    pub fn detect(name: &str, header: Option<&[u8]>) -> FileKind {
        if let Some(mime) = Self::mime_from_name(name) {
            return Self::classify(&mime);
        }

        match header {
            Some(data) => match infer::get(data) {
                Some(kind) => Self::classify(kind.mime_type()),
                None if looks_textual(data) => FileKind::Text,
                None => FileKind::Blob,
            },
            None => FileKind::Blob,
        }
    }

    pub fn classify(mime: &str) -> FileKind {
        match mime {
            "application/pdf" => FileKind::Pdf,
            "application/json" | "application/javascript" | "application/xml" => FileKind::Text,
            mime if mime.starts_with("image/") => FileKind::Image,
            mime if mime.starts_with("video/") => FileKind::Video,
            mime if mime.starts_with("audio/") => FileKind::Audio,
            mime if mime.starts_with("text/") => FileKind::Text,
            _ => FileKind::Blob,
        }
    }
}

fn looks_textual(data: &[u8]) -> bool {
    if data.contains(&0) {
        return false;
    }
    match std::str::from_utf8(data) {
        Ok(_) => true,
        // a multi-byte sequence cut off by the sniff window is still text
        Err(err) => err.error_len().is_none(),
    }
}
