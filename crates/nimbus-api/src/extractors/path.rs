//! Typed path parameter helpers.

use std::str::FromStr;

use nimbus_core::error::AppError;
use nimbus_core::types::{FileId, FolderId};

fn parse_id<T: FromStr>(raw: &str, message: &str) -> Result<T, AppError> {
    raw.parse::<T>().map_err(|_| AppError::validation(message))
}

/// Parses a file id from a path segment.
pub fn parse_file_id(raw: &str) -> Result<FileId, AppError> {
    parse_id(raw, "Invalid file ID")
}

/// Parses a folder id from a path segment.
pub fn parse_folder_id(raw: &str) -> Result<FolderId, AppError> {
    parse_id(raw, "Invalid folder ID")
}

/// Parses an optional folder id from a query or form value.
///
/// Missing, empty, and `null` values all mean the root.
pub fn parse_optional_folder_id(raw: Option<&str>) -> Result<Option<FolderId>, AppError> {
    match raw.map(str::trim) {
        None | Some("") | Some("null") => Ok(None),
        Some(value) => parse_folder_id(value).map(Some),
    }
}
