//! Centralized validation and checksum helpers.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Security-related constants for names that end up as file names
pub const MAX_NAME_LENGTH: usize = 255;

/// Validate that a string is a valid MD5 checksum (32 hex characters).
///
/// # Examples
///
/// ```
/// use longread_qc::utils::validation::is_valid_md5;
///
/// assert!(is_valid_md5("6aef897c3d6ff0c78aff06ac189178dd"));
/// assert!(!is_valid_md5("not-an-md5"));
/// assert!(!is_valid_md5("6aef897c3d6ff0c78aff06ac189178d")); // 31 chars
/// ```
#[must_use]
pub fn is_valid_md5(s: &str) -> bool {
    s.len() == 32 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Compute the MD5 of a file's contents, streaming in 64 KiB blocks
///
/// # Errors
///
/// Returns an IO error if the file cannot be read.
pub fn file_md5(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut context = md5::Context::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        context.consume(&buf[..n]);
    }
    Ok(format!("{:x}", context.compute()))
}

/// Compute a signature hash from a set of MD5 checksums.
///
/// The signature is computed by:
/// 1. Sorting the MD5s alphabetically
/// 2. Joining them with commas
/// 3. Computing MD5 of the concatenated string
///
/// This provides a deterministic identifier for an artifact's payload.
#[must_use]
pub fn compute_signature<'a, I>(md5s: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut sorted: Vec<&str> = md5s.into_iter().collect();
    if sorted.is_empty() {
        return String::new();
    }
    sorted.sort_unstable();
    let concatenated = sorted.join(",");
    let digest = md5::compute(concatenated.as_bytes());
    format!("{digest:x}")
}

/// Name validation error types
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NameError {
    #[error("Name too long: exceeds {MAX_NAME_LENGTH} characters")]
    TooLong,
    #[error("Invalid name '{0}': only letters, digits, '.', '-' and '_' are allowed")]
    InvalidCharacters(String),
    #[error("Empty name provided")]
    Empty,
}

/// Validate a sample id before it becomes part of a file name.
///
/// Sample ids are embedded in Casava file names and the MANIFEST, so only
/// a conservative character set is accepted.
///
/// # Errors
///
/// Returns `NameError::Empty`, `NameError::TooLong` or
/// `NameError::InvalidCharacters`.
pub fn validate_sample_id(id: &str) -> Result<(), NameError> {
    if id.trim().is_empty() {
        return Err(NameError::Empty);
    }

    if id.len() > MAX_NAME_LENGTH {
        return Err(NameError::TooLong);
    }

    // Prevent directory traversal and hidden files
    if id.contains("..") || id.starts_with('.') {
        return Err(NameError::InvalidCharacters(id.to_string()));
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
    {
        return Err(NameError::InvalidCharacters(id.to_string()));
    }

    Ok(())
}
