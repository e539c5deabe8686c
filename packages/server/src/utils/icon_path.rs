use common::storage::StoragePath;

use crate::error::AppError;

/// Reasons an uploaded icon filename is rejected.
#[derive(Debug, PartialEq, Eq)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Filename is `..` or starts with a dot.
    Hidden,
    /// Filename contains control characters (CR, LF, NUL, etc.).
    ControlCharacter,
    /// Filename is longer than 255 bytes.
    TooLong,
}

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::Hidden => "Invalid filename: names starting with '.' are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
            Self::TooLong => "Invalid filename: at most 255 bytes are allowed",
        }
    }
}

/// Validates a flat filename (no directory components allowed).
pub fn validate_flat_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }
    if trimmed.len() > 255 {
        return Err(FilenameError::TooLong);
    }
    // Also rules out CRLF in the Content-Disposition of downloads.
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }
    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    Ok(trimmed)
}

/// Storage location of a category icon: `category/<id>/category_icon/<filename>`.
pub fn category_icon_path(category_id: i32, filename: &str) -> Result<StoragePath, AppError> {
    let filename =
        validate_flat_filename(filename).map_err(|e| AppError::Validation(e.message().into()))?;
    Ok(StoragePath::parse(&format!(
        "category/{category_id}/category_icon/{filename}"
    ))?)
}
