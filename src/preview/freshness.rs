//! Conditional-request evaluation against a file's mtime and size.

use std::time::{Duration, UNIX_EPOCH};

use rocket::http::Header;

/// Validators sent by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validators {
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
}

impl Validators {
    pub fn if_none_match(mut self, value: impl Into<String>) -> Self {
        self.if_none_match = Some(value.into());
        self
    }

    pub fn if_modified_since(mut self, value: impl Into<String>) -> Self {
        self.if_modified_since = Some(value.into());
        self
    }
}

/// Outcome of a freshness check. The validator headers go on every
/// response of the image pipeline, 304 or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Freshness {
    pub fresh: bool,
    pub etag: String,
    pub last_modified: String,
}

impl Freshness {
    pub fn check(validators: &Validators, modified_unix: i64, size: u64) -> Self {
        let etag = etag_for(modified_unix, size);
        let last_modified = http_date(modified_unix);

        // If-None-Match wins over If-Modified-Since when both are sent
        let fresh = match (&validators.if_none_match, &validators.if_modified_since) {
            (Some(tags), _) => etag_matches(&etag, tags),
            (None, Some(since)) => not_modified_since(modified_unix, since),
            (None, None) => false,
        };

        Self {
            fresh,
            etag,
            last_modified,
        }
    }

    pub fn headers(&self) -> Vec<Header<'static>> {
        vec![
            Header::new("ETag", self.etag.clone()),
            Header::new("Last-Modified", self.last_modified.clone()),
            Header::new("Cache-Control", "private"),
        ]
    }
}

/// HTTP-date of a unix timestamp, clamped to the representable range.
pub fn http_date(unix: i64) -> String {
    httpdate::fmt_http_date(system_time(unix))
}

pub fn etag_for(modified_unix: i64, size: u64) -> String {
    format!("\"{:x}{:x}\"", modified_unix, size)
}

fn etag_matches(etag: &str, if_none_match: &str) -> bool {
    if_none_match.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.trim_start_matches("W/") == etag
    })
}

fn not_modified_since(modified_unix: i64, since: &str) -> bool {
    let Ok(since) = httpdate::parse_http_date(since) else {
        return false;
    };
    match since.duration_since(UNIX_EPOCH) {
        Ok(since) => modified_unix <= since.as_secs() as i64,
        Err(_) => false,
    }
}

/// Last second HTTP dates can express (9999-12-31T23:59:59Z).
const MAX_HTTP_DATE: i64 = 253_402_300_799;

fn system_time(unix: i64) -> std::time::SystemTime {
    UNIX_EPOCH + Duration::from_secs(unix.clamp(0, MAX_HTTP_DATE) as u64)
}
