//! Field-level sanitizers for spreadsheet cells.
//!
//! Only a blank path is a hard failure. Every other malformed value degrades
//! to the default supplied by the caller.

use crate::types::{CellValue, RedirectCode};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Bad path \"{0}\". Skipping.")]
    BadPath(String),
}

const TRUE_TOKENS: &[&str] = &["y", "1", "t", "yes", "true"];
const FALSE_TOKENS: &[&str] = &["n", "0", "f", "no", "false"];

/// Returns the trimmed path, or an error when nothing is left after trimming.
///
/// No URL syntax is checked here. Root-relative paths, full URLs and other
/// schemes all pass through untouched.
pub fn validate_path(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BadPath(input.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Reads a yes/no style cell, falling back to `preferred` when the cell is
/// missing, blank or unrecognized.
pub fn validate_boolean(input: Option<&CellValue>, preferred: bool) -> bool {
    let Some(input) = input else {
        return preferred;
    };
    if input.is_empty_text() {
        return preferred;
    }

    let token = input.to_string().trim().to_lowercase();
    if TRUE_TOKENS.contains(&token.as_str()) {
        true
    } else if FALSE_TOKENS.contains(&token.as_str()) {
        false
    } else {
        preferred
    }
}

/// Reads a redirect status cell, falling back to `preferred` when the cell is
/// missing, falsy, non-numeric or not an allowed 3xx code.
pub fn validate_code(input: Option<&CellValue>, preferred: RedirectCode) -> RedirectCode {
    let Some(input) = input.filter(|value| !value.is_falsy()) else {
        return preferred;
    };

    parse_leading_int(&input.to_string())
        .and_then(|n| u16::try_from(n).ok())
        .and_then(RedirectCode::from_u16)
        .unwrap_or(preferred)
}

// Leading-integer parse: "301", " 301", "301 moved" and "301.0" all give 301.
// A `0x` prefix switches to hex, so "0x12D" is 301 as well.
fn parse_leading_int(input: &str) -> Option<i64> {
    let s = input.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let (radix, digits) = match digits.get(..2) {
        Some("0x" | "0X") => (16, &digits[2..]),
        _ => (10, digits),
    };
    let end = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits.len());
    let value = i64::from_str_radix(&digits[..end], radix).ok()?;
    Some(if negative { -value } else { value })
}
