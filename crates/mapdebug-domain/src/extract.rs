//! Source map reference discovery.
//!
//! A built file declares its source map in one of three places, checked in order:
//! 1. a `Sourcemap` (or `X-SourceMap`) header recorded at upload,
//! 2. a `//# sourceMappingURL=` line among the first and last lines of the content,
//! 3. a `sourceMappingURL` comment embedded at the end of the last scanned line.

use crate::model::Headers;
use crate::policy::ScanLimits;
use crate::store::StoreError;
use regex::bytes::Regex;
use std::sync::LazyLock;

const HEADER_SOURCEMAP: &str = "Sourcemap";
const HEADER_X_SOURCEMAP: &str = "X-SourceMap";

const LINE_MARKERS: [&[u8]; 2] = [b"//# sourceMappingURL=", b"//@ sourceMappingURL="];
const LINE_MARKER_LEN: usize = 21;

/// Embedded reference at the end of a (possibly minified) line.
pub static SOURCE_MAPPING_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)//[#@] sourceMappingURL=(.*)$").expect("sourceMappingURL pattern is valid")
});

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Discovery {
    Found(String),
    /// No reference anywhere.
    NotDeclared,
    /// The only reference is a block comment (`/* ... */`).
    CommentOnly,
}

/// Find the source map reference declared by an artifact.
///
/// `load_content` is only called when no header declares the reference.
pub fn discover_reference<F>(
    headers: &Headers,
    load_content: F,
    limits: &ScanLimits,
) -> Result<Discovery, StoreError>
where
    F: FnOnce() -> Result<Vec<u8>, StoreError>,
{
    if let Some(value) = header_reference(headers) {
        tracing::debug!(reference = value, "source map declared by header");
        return Ok(post_process(value.as_bytes()));
    }

    let content = load_content()?;
    Ok(match scan_content(&content, limits) {
        Some(reference) => post_process(reference),
        None => Discovery::NotDeclared,
    })
}

/// `Sourcemap` wins whenever present; `X-SourceMap` is only consulted when it is absent.
fn header_reference(headers: &Headers) -> Option<&str> {
    headers
        .get(HEADER_SOURCEMAP)
        .or_else(|| headers.get(HEADER_X_SOURCEMAP))
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

/// Locate a raw reference in content. Returns `None` when nothing non-empty is declared.
pub fn scan_content<'a>(content: &'a [u8], limits: &ScanLimits) -> Option<&'a [u8]> {
    let lines: Vec<&[u8]> = content.split(|b| *b == b'\n').collect();
    let candidates: Vec<&[u8]> = if lines.len() > limits.full_scan_max_lines {
        let tail_start = lines.len().saturating_sub(limits.tail_lines);
        lines[..limits.head_lines.min(lines.len())]
            .iter()
            .chain(&lines[tail_start..])
            .copied()
            .collect()
    } else {
        lines
    };

    let marked = candidates.iter().copied().find_map(|line| {
        let marker = line.get(..LINE_MARKER_LEN)?;
        LINE_MARKERS
            .contains(&marker)
            .then(|| line[LINE_MARKER_LEN..].trim_ascii_end())
    });
    if let Some(reference) = marked.filter(|r| !r.is_empty()) {
        return Some(reference);
    }

    let last = candidates.last().copied()?;
    let window = &last[last.len().saturating_sub(limits.tail_bytes)..];
    SOURCE_MAPPING_URL_RE
        .captures(window.trim_ascii_end())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_bytes())
        .filter(|r| !r.is_empty())
}

/// Strip a trailing block comment from a reference.
fn post_process(reference: &[u8]) -> Discovery {
    let mut reference = reference;
    if reference.ends_with(b"*/")
        && let Some(pos) = find(reference, b"/*")
    {
        if pos == 0 {
            return Discovery::CommentOnly;
        }
        reference = &reference[..pos];
    }
    if reference.is_empty() {
        return Discovery::NotDeclared;
    }
    Discovery::Found(String::from_utf8_lossy(reference).into_owned())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
