//! Section categories and their normalized API path segments.
//!
//! The delivery endpoints address content by a normalized segment rather than
//! the category name a caller sees on a cubic. Music is routed to the image
//! segment; the remote API expects it that way.

use std::fmt;
use std::str::FromStr;

use crate::error::CubicError;

/// A content category within a cubic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionCategory {
    Image,
    Music,
    Video,
    Files,
}

impl SectionCategory {
    pub const ALL: [SectionCategory; 4] = [Self::Image, Self::Music, Self::Video, Self::Files];

    /// Name as used in cubic listings and read endpoints.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Music => "music",
            Self::Video => "video",
            Self::Files => "files",
        }
    }

    /// Path segment used by the delivery endpoints.
    pub fn segment(self) -> &'static str {
        match self {
            Self::Image | Self::Music => "image",
            Self::Video => "video",
            Self::Files => "file",
        }
    }
}

impl FromStr for SectionCategory {
    type Err = CubicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CubicError::InvalidSection(s.to_string()))
    }
}

impl fmt::Display for SectionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a user-facing category name to its delivery path segment.
pub fn normalize(category: &str) -> Result<&'static str, CubicError> {
    category.parse::<SectionCategory>().map(SectionCategory::segment)
}
