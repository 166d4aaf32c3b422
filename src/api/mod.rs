//! Typed wrappers around the Streamline REST endpoints.
//!
//! Every wrapper is a method on [`ApiClient`](crate::client::ApiClient), so
//! all of them go through the same CSRF and session renewal handling.

pub mod auth;
pub mod channel;
pub mod collections;
pub mod competitors;
pub mod generators;
pub mod niche;
pub mod notifications;
pub mod outliers;
pub mod settings;

use std::borrow::Cow;

use crate::client::ApiError;

/// Percent-encodes a value used as a path segment.
pub(crate) fn segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// Trims `value` and rejects it when nothing is left.
pub(crate) fn non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(format!("{} is required.", what)));
    }
    Ok(trimmed)
}

/// Like [`non_empty`], also rejecting values longer than `max` characters.
pub(crate) fn require_text<'a>(
    value: &'a str,
    what: &str,
    max: usize,
) -> Result<&'a str, ApiError> {
    let trimmed = non_empty(value, what)?;
    if trimmed.chars().count() > max {
        return Err(ApiError::Validation(format!(
            "{} is too long (keep it under {} characters).",
            what, max
        )));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_are_percent_encoded() {
        assert_eq!(segment("UC_abc-1"), "UC_abc-1");
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn require_text_trims_and_bounds() {
        assert_eq!(require_text("  cooking  ", "Query", 100).unwrap(), "cooking");
        assert!(matches!(
            require_text("   ", "Query", 100),
            Err(ApiError::Validation(_))
        ));
        let long = "x".repeat(101);
        assert_eq!(
            require_text(&long, "Idea", 100).unwrap_err().message(),
            "Idea is too long (keep it under 100 characters)."
        );
    }
}
