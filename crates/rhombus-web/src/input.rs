//! Form input parsing
//!
//! Untyped form fields are parsed exactly once here, before anything reaches
//! the pattern generator.

use crate::error::WebError;

/// Form field carrying the requested line count
pub const LINES_FIELD: &str = "lines";

/// Parse the `lines` form field into a positive count
///
/// # Errors
/// - `WebError::InvalidInput` if the field is missing, not a whole number,
///   not positive, or above `max_lines`
pub fn parse_lines(raw: Option<&str>, max_lines: Option<u64>) -> Result<i64, WebError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| WebError::invalid(format!("missing form field '{LINES_FIELD}'")))?;

    let lines: i64 = raw
        .parse()
        .map_err(|_| WebError::invalid(format!("'{raw}' is not a whole number")))?;

    if lines <= 0 {
        return Err(WebError::invalid(format!(
            "lines must be a positive integer, got {lines}"
        )));
    }

    if let Some(max) = max_lines {
        if lines.unsigned_abs() > max {
            return Err(WebError::invalid(format!("lines must be at most {max}")));
        }
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(result: Result<i64, WebError>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn accepts_positive() {
        assert_eq!(parse_lines(Some("7"), None).unwrap(), 7);
        assert_eq!(parse_lines(Some(" 12 "), None).unwrap(), 12);
    }

    #[test]
    fn rejects_missing_and_blank() {
        assert!(message(parse_lines(None, None)).contains("missing"));
        assert!(message(parse_lines(Some("  "), None)).contains("missing"));
    }

    #[test]
    fn rejects_non_numeric() {
        assert!(message(parse_lines(Some("five"), None)).contains("not a whole number"));
        assert!(message(parse_lines(Some("2.5"), None)).contains("not a whole number"));
    }

    #[test]
    fn rejects_non_positive() {
        assert!(message(parse_lines(Some("0"), None)).contains("positive"));
        assert!(message(parse_lines(Some("-3"), None)).contains("positive"));
    }

    #[test]
    fn enforces_cap() {
        assert_eq!(parse_lines(Some("100"), Some(100)).unwrap(), 100);
        assert!(message(parse_lines(Some("101"), Some(100))).contains("at most 100"));
    }
}
