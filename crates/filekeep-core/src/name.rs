//! Logical file names derived from remote URLs.
//!
//! The logical name is the trailing path segment of the URL, with query string
//! and fragment excluded. It is the storage key in both backends, so it must
//! never be able to address anything outside the store.

use url::Url;

use crate::error::{Result, StoreError};

/// Prefix reserved for the store's own artifacts (lock file, partial writes).
pub(crate) const RESERVED_PREFIX: &str = ".filekeep";

/// Derive the logical name for a remote resource.
///
/// Absolute URLs are parsed properly; anything else is treated as a bare
/// path with `?query` and `#fragment` stripped. Percent-escapes are kept
/// verbatim.
pub fn logical_name(url: &str) -> Result<String> {
    let segment = match Url::parse(url) {
        Ok(parsed) => match parsed.path_segments() {
            Some(segments) => segments.last().unwrap_or_default().to_string(),
            None => last_segment(parsed.path()).to_string(),
        },
        Err(_) => {
            let end = url.find(['?', '#']).unwrap_or(url.len());
            last_segment(&url[..end]).to_string()
        }
    };
    validate(url, segment)
}

/// Check that a caller-supplied name could have come out of [`logical_name`].
pub fn validate_name(name: &str) -> Result<()> {
    validate(name, name.to_string()).map(|_| ())
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or_default()
}

fn validate(input: &str, segment: String) -> Result<String> {
    let reason = if segment.is_empty() {
        "no trailing path segment"
    } else if segment == "." || segment == ".." {
        "relative path component"
    } else if segment.contains(['/', '\\', '\0']) {
        "separator or null byte in name"
    } else if segment.starts_with(RESERVED_PREFIX) {
        "reserved name"
    } else {
        return Ok(segment);
    };
    Err(StoreError::InvalidName {
        input: input.to_string(),
        reason,
    })
}
