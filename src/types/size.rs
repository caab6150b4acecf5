use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::PreviewError;

/// Size class of a rendered preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewSize {
    Thumb,
    Big,
}

impl PreviewSize {
    pub const ALL: [PreviewSize; 2] = [PreviewSize::Thumb, PreviewSize::Big];

    /// Stable numeric tag, part of the cache key.
    pub fn tag(self) -> u8 {
        match self {
            PreviewSize::Thumb => 0,
            PreviewSize::Big => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PreviewSize::Thumb => "thumb",
            PreviewSize::Big => "big",
        }
    }
}

impl fmt::Display for PreviewSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreviewSize {
    type Err = PreviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "thumb" => Ok(PreviewSize::Thumb),
            "big" => Ok(PreviewSize::Big),
            _ => Err(PreviewError::InvalidSize(s.to_string())),
        }
    }
}
