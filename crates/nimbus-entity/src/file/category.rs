//! Listing categories and the MIME filters they translate to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// MIME prefixes that make up the "documents" family. PDF is deliberately
/// absent, it has its own category.
pub const DOCUMENT_PREFIXES: &[&str] = &[
    "application/msword",
    "application/vnd.openxmlformats-officedocument.",
    "application/vnd.ms-",
    "application/vnd.oasis.opendocument.",
    "application/rtf",
    "text/",
];

/// Exact MIME type of the PDF category.
pub const PDF_MIME: &str = "application/pdf";

/// A MIME restriction applied to a file listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeFilter {
    /// The MIME type must equal this value.
    Exact(&'static str),
    /// The MIME type must start with one of these prefixes.
    Prefixes(&'static [&'static str]),
}

impl MimeFilter {
    /// Evaluate the filter in memory.
    pub fn matches(&self, mime_type: &str) -> bool {
        match self {
            Self::Exact(expected) => mime_type == *expected,
            Self::Prefixes(prefixes) => prefixes.iter().any(|p| mime_type.starts_with(p)),
        }
    }
}

/// The `category` query value accepted by file listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    /// `image/*`
    Images,
    /// `video/*`
    Videos,
    /// `application/pdf` only
    Pdfs,
    /// Office and text documents
    Documents,
    /// Starred, not trashed
    Favorites,
    /// Trashed
    Trash,
}

impl FileCategory {
    /// The MIME filter for type-based categories, `None` for favorites and trash.
    pub fn mime_filter(self) -> Option<MimeFilter> {
        match self {
            Self::Images => Some(MimeFilter::Prefixes(&["image/"])),
            Self::Videos => Some(MimeFilter::Prefixes(&["video/"])),
            Self::Pdfs => Some(MimeFilter::Exact(PDF_MIME)),
            Self::Documents => Some(MimeFilter::Prefixes(DOCUMENT_PREFIXES)),
            Self::Favorites | Self::Trash => None,
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Images => "images",
            Self::Videos => "videos",
            Self::Pdfs => "pdfs",
            Self::Documents => "documents",
            Self::Favorites => "favorites",
            Self::Trash => "trash",
        };
        f.write_str(name)
    }
}

impl FromStr for FileCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "images" => Ok(Self::Images),
            "videos" => Ok(Self::Videos),
            "pdfs" => Ok(Self::Pdfs),
            "documents" => Ok(Self::Documents),
            "favorites" => Ok(Self::Favorites),
            "trash" => Ok(Self::Trash),
            other => Err(format!("Unknown category: {other}")),
        }
    }
}
