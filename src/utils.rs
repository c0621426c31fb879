//! Utility functions for common operations.

use crate::error::StoreError;

/// Returns the last path segment of a URL.
///
/// Query strings and fragments are not part of the segment. Inputs that do not
/// parse as absolute URLs fall back to splitting on `/`.
///
/// # Returns
/// `None` if the URL ends with a slash or has no path.
pub fn last_path_segment(raw_url: &str) -> Option<String> {
    let segment = match url::Url::parse(raw_url) {
        Ok(parsed) => parsed.path_segments()?.next_back()?.to_string(),
        Err(_) => {
            let path = raw_url.split(['?', '#']).next().unwrap_or_default();
            path.rsplit('/').next()?.to_string()
        }
    };

    if segment.is_empty() {
        None
    } else {
        Some(segment)
    }
}

/// Checks if an HTTP response is successful, and if not, returns a download error.
///
/// # Arguments
/// * `response` - The reqwest Response to check
/// * `url` - The URL requested, for error context
pub fn check_response_status(
    response: reqwest::Response,
    url: &str,
) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if !status.is_success() {
        return Err(StoreError::DownloadFailure {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}
