//! The one-line stamp at the top of every external script.
//!
//! ```text
//! //<name> - <version>[+]
//! <body, verbatim>
//! ```
//!
//! A trailing `+` (or an empty version) marks the file as dirty: its body does
//! not correspond to a clean commit.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::HeaderError;
use crate::types::ScriptRecord;

pub const DIRTY_MARKER: char = '+';

const HEADER_PATTERN: &str = r"^\x{FEFF}?\s*//\s*(.+) -\s?(.*)$";

fn header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(HEADER_PATTERN).expect("header pattern is valid"))
}

/// Split `bytes` into a [`ScriptRecord`].
///
/// The body is everything after the first `\n`, untouched.
pub fn parse_header(bytes: &[u8]) -> Result<ScriptRecord, HeaderError> {
    let (first, content) = match bytes.iter().position(|b| *b == b'\n') {
        Some(idx) => (&bytes[..idx], &bytes[idx + 1..]),
        None => (bytes, &[][..]),
    };
    let first = first.strip_suffix(b"\r").unwrap_or(first);
    let line = std::str::from_utf8(first).map_err(|_| HeaderError::NoHeader {
        reason: "first line is not UTF-8",
    })?;

    let caps = header_regex()
        .captures(line)
        .ok_or(HeaderError::NoHeader {
            reason: "first line is not a `//name - version` stamp",
        })?;

    let name = caps[1].to_string();
    let raw_version = &caps[2];
    let (version, dirty) = match raw_version.strip_suffix(DIRTY_MARKER) {
        Some(stripped) => (stripped.to_string(), true),
        None => (raw_version.to_string(), raw_version.is_empty()),
    };

    Ok(ScriptRecord {
        name,
        version,
        dirty,
        content: content.to_vec(),
    })
}

/// Inverse of [`parse_header`]: `//<name> - <version>\n` followed by `content`.
pub fn render_header(name: &str, version: &str, content: &[u8]) -> Vec<u8> {
    let mut out = format!("//{name} - {version}\n").into_bytes();
    out.extend_from_slice(content);
    out
}

/// `version` with the dirty marker appended when `dirty`.
pub fn stamp_version(version: &str, dirty: bool) -> String {
    if dirty {
        format!("{version}{DIRTY_MARKER}")
    } else {
        version.to_string()
    }
}
