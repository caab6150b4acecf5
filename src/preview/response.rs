use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rocket::http::{Header, Status};

use crate::files::ContentReader;

/// RFC 5987 `attr-char` minus alphanumerics.
const FILENAME_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

pub enum PreviewBody {
    Empty,
    Bytes(Vec<u8>),
    /// Original file content, streamed unchanged.
    Stream(ContentReader),
}

impl fmt::Debug for PreviewBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviewBody::Empty => f.write_str("Empty"),
            PreviewBody::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            PreviewBody::Stream(_) => f.write_str("Stream"),
        }
    }
}

#[derive(Debug)]
pub struct PreviewResponse {
    pub status: Status,
    pub headers: Vec<Header<'static>>,
    pub body: PreviewBody,
}

impl PreviewResponse {
    pub fn empty(status: Status) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: PreviewBody::Empty,
        }
    }

    pub fn bytes(bytes: Vec<u8>) -> Self {
        Self {
            status: Status::Ok,
            headers: Vec::new(),
            body: PreviewBody::Bytes(bytes),
        }
    }

    pub fn stream(reader: ContentReader) -> Self {
        Self {
            status: Status::Ok,
            headers: Vec::new(),
            body: PreviewBody::Stream(reader),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push(Header::new(name, value.into()));
        self
    }

    pub fn with_headers(mut self, headers: impl IntoIterator<Item = Header<'static>>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// First value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|header| header.name().as_str().eq_ignore_ascii_case(name))
            .map(|header| header.value())
    }
}

pub fn content_disposition(name: &str, inline: bool) -> String {
    if inline {
        return "inline".to_string();
    }
    format!(
        "attachment; filename*=utf-8''{}",
        utf8_percent_encode(name, FILENAME_ESCAPE)
    )
}
