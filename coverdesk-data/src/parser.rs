//! Tolerant response parsing
//!
//! The backend sometimes emits PHP error pages, stray control characters, or
//! JSON wrapped in warning text. [`parse`] tries a cascade of recovery passes
//! and maps every input to exactly one [`ParseOutcome`] variant. It never panics.

use serde_json::Value;
use tracing::debug;

/// Maximum number of bracketed candidates tried during extraction
const MAX_EXTRACTION_ATTEMPTS: usize = 16;

/// Result of parsing one raw response body
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// Body decoded to a JSON value (possibly after recovery)
    Parsed(Value),
    /// Body was empty or whitespace-only
    EmptyBody,
    /// Body is markup (starts with `<`), e.g. a PHP error page
    NonJson(String),
    /// Body looked like JSON but no recovery pass could decode it
    MalformedJson { raw: String, error: String },
}

impl ParseOutcome {
    pub fn is_parsed(&self) -> bool {
        matches!(self, ParseOutcome::Parsed(_))
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            ParseOutcome::Parsed(value) => Some(value),
            _ => None,
        }
    }
}

/// Parse raw response text
///
/// 1. Empty/whitespace → `EmptyBody`
/// 2. Leading `<` (after any byte-order mark) → `NonJson`
/// 3. Plain decode
/// 4. Decode after stripping control characters
/// 5. Decode balanced `{...}` / `[...]` substrings in order of position
/// 6. Otherwise → `MalformedJson` with the last decode error
pub fn parse(raw: &str) -> ParseOutcome {
    let trimmed = raw.trim().trim_start_matches('\u{feff}').trim_start();
    if trimmed.is_empty() {
        return ParseOutcome::EmptyBody;
    }
    if trimmed.starts_with('<') {
        return ParseOutcome::NonJson(raw.to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return ParseOutcome::Parsed(value);
    }

    let cleaned = strip_control_characters(trimmed);
    let cleaned = cleaned.trim();
    let mut last_error = match serde_json::from_str::<Value>(cleaned) {
        Ok(value) => {
            debug!("Recovered JSON after stripping control characters");
            return ParseOutcome::Parsed(value);
        }
        Err(e) => e.to_string(),
    };

    for (start, end) in balanced_spans(cleaned) {
        match serde_json::from_str::<Value>(&cleaned[start..end]) {
            Ok(value) => {
                debug!(offset = start, length = end - start, "Extracted embedded JSON");
                return ParseOutcome::Parsed(value);
            }
            Err(e) => last_error = e.to_string(),
        }
    }

    ParseOutcome::MalformedJson {
        raw: raw.to_string(),
        error: last_error,
    }
}

/// Remove control characters and byte-order marks
///
/// Raw control characters are never valid inside JSON strings, and outside
/// strings they are insignificant whitespace at most.
fn strip_control_characters(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() && *c != '\u{feff}')
        .collect()
}

/// Byte ranges `start..end` of balanced `{...}` / `[...]` spans
///
/// One linear pass with a single bracket stack. Quotes open a string only
/// inside a bracket, so stray quotes in leading noise cannot hide the
/// payload. A mismatched closing bracket discards every open bracket.
/// At most [`MAX_EXTRACTION_ATTEMPTS`] spans are returned, earliest start first.
fn balanced_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut open: Vec<(usize, u8)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (index, &byte) in text.as_bytes().iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' if !open.is_empty() => in_string = true,
            b'{' => open.push((index, b'}')),
            b'[' => open.push((index, b']')),
            b'}' | b']' => match open.pop() {
                Some((start, close)) if close == byte => spans.push((start, index + 1)),
                Some(_) => open.clear(),
                None => {}
            },
            _ => {}
        }
    }

    spans.sort_unstable_by_key(|(start, _)| *start);
    spans.truncate(MAX_EXTRACTION_ATTEMPTS);
    spans
}
