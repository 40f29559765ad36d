//! Kölner Phonetik encoder for German names.
//!
//! Maps a normalized name to a digit string so that spelling variants of
//! the same spoken name collide: `meyer`, `maier`, `mayer` and `meier` all
//! encode to `67`; `schmidt` and `schmitt` both encode to `862`.
//!
//! Non-letter characters (including the hyphens of compound surnames) are
//! dropped up front and the whole compound encodes as one token. Raw codes
//! collapse repeated adjacent digits, then drop the vowel class `0`
//! everywhere but the leading position. Empty input yields the empty code.

use crate::types::PhoneticCode;

/// Encode a normalized name with Kölner Phonetik.
pub fn encode<T: AsRef<str>>(name: T) -> PhoneticCode {
    let letters: Vec<char> = name
        .as_ref()
        .chars()
        .flat_map(char::to_lowercase)
        .filter(char::is_ascii_lowercase)
        .collect();
    if letters.is_empty() {
        return PhoneticCode::new();
    }

    let mut raw = String::with_capacity(letters.len());
    for (idx, &letter) in letters.iter().enumerate() {
        let prev = idx.checked_sub(1).map(|p| letters[p]);
        let next = letters.get(idx + 1).copied();
        raw.push_str(letter_code(letter, prev, next));
    }

    let mut code = String::with_capacity(raw.len());
    let mut last: Option<char> = None;
    for digit in raw.chars() {
        if last != Some(digit) {
            code.push(digit);
        }
        last = Some(digit);
    }

    let mut result = String::with_capacity(code.len());
    for (idx, digit) in code.chars().enumerate() {
        if digit != '0' || idx == 0 {
            result.push(digit);
        }
    }
    result
}

/// Per-letter digit assignment from the published Kölner Phonetik table.
///
/// `prev`/`next` are the neighboring letters after non-letter filtering;
/// `prev == None` marks the initial position.
fn letter_code(letter: char, prev: Option<char>, next: Option<char>) -> &'static str {
    match letter {
        'a' | 'e' | 'i' | 'j' | 'o' | 'u' | 'y' => "0",
        'h' => "",
        'b' => "1",
        'p' => {
            if next == Some('h') {
                "3"
            } else {
                "1"
            }
        }
        'd' | 't' => {
            if matches!(next, Some('c') | Some('s') | Some('z')) {
                "8"
            } else {
                "2"
            }
        }
        'f' | 'v' | 'w' => "3",
        'g' | 'k' | 'q' => "4",
        'c' => {
            if prev.is_none() {
                if matches!(
                    next,
                    Some('a') | Some('h') | Some('k') | Some('l') | Some('o') | Some('q')
                        | Some('r') | Some('u') | Some('x')
                ) {
                    "4"
                } else {
                    "8"
                }
            } else if matches!(prev, Some('s') | Some('z')) {
                "8"
            } else if matches!(
                next,
                Some('a') | Some('h') | Some('k') | Some('o') | Some('q') | Some('u') | Some('x')
            ) {
                "4"
            } else {
                "8"
            }
        }
        'x' => {
            if matches!(prev, Some('c') | Some('k') | Some('q')) {
                "8"
            } else {
                "48"
            }
        }
        'l' => "5",
        'm' | 'n' => "6",
        'r' => "7",
        's' | 'z' => "8",
        _ => "",
    }
}
