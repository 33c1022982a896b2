//! URL decomposition and unification into artifact lookup keys.

use mapdebug_types::UnifiedPath;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Generic URI syntax split (RFC 3986, appendix B) with a restricted scheme alphabet.
/// Nothing is decoded or normalized; every input matches.
static URL_PARTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(?:([A-Za-z][A-Za-z0-9+.\-]*):)?(?://([^/?#]*))?([^?#]*)(?:\?([^#]*))?(?:#(.*))?$")
        .expect("url parts pattern is valid")
});

/// References carrying their own `scheme://` are never joined.
static SCHEME_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9+\-]+://").expect("scheme prefix pattern is valid"));

/// Raw components of a URL string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UrlParts<'a> {
    pub scheme: &'a str,
    pub authority: Option<&'a str>,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub fragment: Option<&'a str>,
}

impl<'a> UrlParts<'a> {
    pub fn parse(url: &'a str) -> Self {
        let Some(caps) = URL_PARTS_RE.captures(url) else {
            return Self {
                path: url,
                ..Self::default()
            };
        };
        let group = |i| caps.get(i).map(|m| m.as_str());
        Self {
            scheme: group(1).unwrap_or(""),
            authority: group(2),
            path: group(3).unwrap_or(""),
            query: group(4),
            fragment: group(5),
        }
    }

    /// Both a scheme and a path are present.
    pub fn is_absolute(&self) -> bool {
        !self.scheme.is_empty() && !self.path.is_empty()
    }

    pub fn unified_path(&self) -> UnifiedPath {
        UnifiedPath::from_url_path(self.path)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("not an absolute url with a path: {url:?}")]
pub struct InvalidUrl {
    pub url: String,
}

/// Unify an absolute frame URL into the key artifacts are named under.
pub fn normalize(abs_path: &str) -> Result<UnifiedPath, InvalidUrl> {
    let parts = UrlParts::parse(abs_path);
    if !parts.is_absolute() {
        return Err(InvalidUrl {
            url: abs_path.to_string(),
        });
    }
    Ok(parts.unified_path())
}

/// Resolve a source map reference against the URL of the file declaring it.
///
/// The join works on the raw text: the base's scheme and authority are kept, a relative
/// reference replaces the last path segment and `.`/`..` segments are resolved. Nothing is
/// percent-encoded, so the result unifies to the same key as an artifact named with the
/// same characters. When the base has no scheme the reference is returned unchanged.
pub fn join_url(base: &str, reference: &str) -> String {
    if reference.is_empty() {
        return base.to_string();
    }
    if SCHEME_PREFIX_RE.is_match(reference) {
        return reference.to_string();
    }
    let parts = UrlParts::parse(base);
    if parts.scheme.is_empty() {
        tracing::debug!(base, reference, "base has no scheme; using reference as-is");
        return reference.to_string();
    }
    if let Some(rest) = reference.strip_prefix("//") {
        return format!("{}://{rest}", parts.scheme);
    }

    let split = reference.find(['?', '#']).unwrap_or(reference.len());
    let (ref_path, suffix) = reference.split_at(split);
    let path = if ref_path.is_empty() {
        parts.path.to_string()
    } else if ref_path.starts_with('/') {
        ref_path.to_string()
    } else {
        let dir = parts.path.rfind('/').map_or("", |i| &parts.path[..i]);
        format!("{dir}/{ref_path}")
    };

    let mut out = format!("{}:", parts.scheme);
    if let Some(authority) = parts.authority {
        out.push_str("//");
        out.push_str(authority);
    }
    out.push_str(&remove_dot_segments(&path));
    out.push_str(suffix);
    out
}

/// Resolve `.` and `..` segments. `..` never climbs above the root.
fn remove_dot_segments(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    let last = segments.len() - 1;
    let mut out: Vec<&str> = Vec::with_capacity(segments.len());
    for (i, seg) in segments.iter().enumerate() {
        match *seg {
            "." => {}
            ".." => {
                if out.len() > 1 {
                    out.pop();
                }
            }
            seg => {
                out.push(seg);
                continue;
            }
        }
        // A trailing dot segment still names a directory.
        if i == last {
            out.push("");
        }
    }
    out.join("/")
}
