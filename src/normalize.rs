//! Pure field normalizers shared by every downstream comparison.
//!
//! All helpers are deterministic and idempotent: feeding a normalized value
//! back in returns it unchanged. German umlaut expansion happens before the
//! general accent folding so that `Müller` and `Mueller` meet at `mueller`.

use chrono::{Datelike, NaiveDate};
use deunicode::deunicode;

use crate::types::NormalizedValue;

/// Date layouts tried before falling back to a four-digit scan.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

/// Canonicalize a name or city field.
///
/// Lowercases, expands umlauts (`ü→ue`, `ö→oe`, `ä→ae`, `ß→ss`), folds the
/// remaining diacritics to ASCII, keeps letters, digits, spaces and hyphens,
/// and collapses whitespace runs.
pub fn normalize_text<T: AsRef<str>>(input: T) -> NormalizedValue {
    let lowered = input.as_ref().to_lowercase();
    let mut expanded = String::with_capacity(lowered.len() + 4);
    for ch in lowered.chars() {
        match ch {
            'ü' => expanded.push_str("ue"),
            'ö' => expanded.push_str("oe"),
            'ä' => expanded.push_str("ae"),
            'ß' => expanded.push_str("ss"),
            _ => expanded.push(ch),
        }
    }
    let folded = deunicode(&expanded).to_lowercase();
    let mut filtered = String::with_capacity(folded.len());
    for ch in folded.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' {
            filtered.push(ch);
        } else if ch.is_whitespace() {
            filtered.push(' ');
        }
    }
    normalize_inline_whitespace(filtered)
}

/// Canonicalize a street name.
///
/// Applies [`normalize_text`], strips a leading or trailing house-number
/// token, and expands the abbreviated `…str` suffix to `…strasse` so that
/// `Hauptstr. 12` and `Hauptstrasse` block together.
pub fn normalize_street<T: AsRef<str>>(input: T) -> NormalizedValue {
    let base = normalize_text(input);
    if base.is_empty() {
        return base;
    }
    let mut tokens: Vec<&str> = base.split(' ').collect();
    while tokens.len() > 1 && is_house_number_token(tokens[tokens.len() - 1]) {
        tokens.pop();
    }
    while tokens.len() > 1 && is_house_number_token(tokens[0]) {
        tokens.remove(0);
    }
    let mut street = tokens.join(" ");
    if street.ends_with("str") {
        street.push_str("asse");
    }
    street
}

/// Canonicalize a postal code: decimal digits only.
pub fn normalize_postal<T: AsRef<str>>(input: T) -> NormalizedValue {
    input
        .as_ref()
        .chars()
        .filter(char::is_ascii_digit)
        .collect()
}

/// Canonicalize a house number: digits plus lowercase letter suffix.
/// Example: `12 A` becomes `12a`.
pub fn normalize_house_number<T: AsRef<str>>(input: T) -> NormalizedValue {
    deunicode(&input.as_ref().to_lowercase())
        .chars()
        .filter(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
        .collect()
}

/// Extract a four-digit year from a date string.
///
/// Strict `chrono` layouts are tried first (ISO, German dotted, slashed),
/// then the first run of four consecutive digits is taken. Unparseable
/// input yields `None`; the record proceeds with the field absent.
pub fn extract_year<T: AsRef<str>>(input: T) -> Option<i32> {
    let trimmed = input.as_ref().trim();
    if trimmed.is_empty() {
        return None;
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            // Two-digit years parse under %Y; treat them as absent rather
            // than guessing a century.
            if (1000..=9999).contains(&date.year()) {
                return Some(date.year());
            }
        }
    }
    scan_four_digit_year(trimmed)
}

/// Collapse runs of whitespace into single spaces and trim.
fn normalize_inline_whitespace<T: AsRef<str>>(text: T) -> String {
    let mut normalized = String::new();
    let mut seen_space = false;
    for ch in text.as_ref().chars() {
        if ch.is_whitespace() {
            if !seen_space {
                normalized.push(' ');
                seen_space = true;
            }
        } else {
            normalized.push(ch);
            seen_space = false;
        }
    }
    normalized.trim().to_string()
}

/// A token of the form `12` or `12a`: digits, then optional letters.
fn is_house_number_token(token: &str) -> bool {
    let mut chars = token.chars().peekable();
    let mut digits = 0;
    while let Some(ch) = chars.peek() {
        if ch.is_ascii_digit() {
            digits += 1;
            chars.next();
        } else {
            break;
        }
    }
    digits > 0 && chars.all(|ch| ch.is_ascii_lowercase())
}

fn scan_four_digit_year(text: &str) -> Option<i32> {
    let bytes = text.as_bytes();
    let mut run = 0usize;
    for (idx, byte) in bytes.iter().enumerate() {
        if byte.is_ascii_digit() {
            run += 1;
            if run == 4 {
                let start = idx + 1 - 4;
                return text[start..=idx].parse().ok();
            }
        } else {
            run = 0;
        }
    }
    None
}
