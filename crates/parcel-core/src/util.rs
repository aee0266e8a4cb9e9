//! Small text and time helpers shared by the client modules.

/// Normalize optional text by trimming whitespace and removing empties.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Validate an endpoint URL and strip trailing slashes.
///
/// `field` names the value in the returned error message.
pub fn normalize_http_endpoint(raw: &str, field: &str) -> Result<String, String> {
    let Some(endpoint) = normalize_text_option(Some(raw.to_string())) else {
        return Err(format!("{field} must not be empty"));
    };
    if !is_http_url(&endpoint) {
        return Err(format!("{field} must include http:// or https://"));
    }
    Ok(endpoint.trim_end_matches('/').to_string())
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Current Unix timestamp in seconds.
pub fn unix_timestamp_now() -> i64 {
    chrono::Utc::now().timestamp()
}
