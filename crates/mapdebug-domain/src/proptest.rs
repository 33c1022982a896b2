//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - URL unification being independent of origin
//! - Matcher determinism and first-match selection
//! - Reference discovery idempotence and header precedence
//! - Never panicking on arbitrary content or URLs

use crate::extract::{Discovery, discover_reference, scan_content};
use crate::matcher::{EventDistribution, MatchTarget, find_match, url_prefix};
use crate::model::{Artifact, FileRef, Headers};
use crate::normalize::{UrlParts, join_url, normalize};
use crate::policy::ScanLimits;
use mapdebug_types::UnifiedPath;
use proptest::prelude::*;

// ============================================================================
// Strategies for generating arbitrary values
// ============================================================================

fn arb_scheme() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9+.-]{0,8}").unwrap()
}

fn arb_host() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z0-9.-]{0,16}(:[0-9]{1,5})?").unwrap()
}

/// One path segment: any printable text, spaces and non-ASCII included.
fn arb_segment() -> impl Strategy<Value = String> {
    prop::string::string_regex("[^/?#\\p{C}]{0,8}").unwrap()
}

/// Absolute URL paths without query or fragment delimiters.
fn arb_path() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_segment(), 1..5).prop_map(|segs| format!("/{}", segs.join("/")))
}

fn is_dot_segment(seg: &str) -> bool {
    seg == "." || seg == ".."
}

fn arb_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "~/bundle.js",
        "~/bundle.js.map",
        "~/static/bundle.js",
        "~/vendor.js",
        "~/app/main.js",
    ])
    .prop_map(str::to_string)
}

fn arb_artifacts() -> impl Strategy<Value = Vec<Artifact>> {
    prop::collection::vec((arb_name(), prop::option::of(0u64..3)), 0..12).prop_map(|items| {
        items
            .into_iter()
            .enumerate()
            .map(|(i, (name, dist_id))| Artifact {
                name,
                file: FileRef::new(format!("blob-{i}")),
                headers: Headers::new(),
                dist_id,
            })
            .collect()
    })
}

/// References as written in headers or comments: printable, no whitespace, no `*`.
fn arb_reference() -> impl Strategy<Value = String> {
    prop::string::string_regex("[^\\s\\p{C}*]{1,24}").unwrap()
}

// ============================================================================
// URL unification
// ============================================================================

proptest! {
    #[test]
    fn normalize_keeps_path_and_drops_origin(
        scheme in arb_scheme(),
        host_a in arb_host(),
        host_b in arb_host(),
        path in arb_path(),
    ) {
        let a = normalize(&format!("{scheme}://{host_a}{path}")).unwrap();
        let b = normalize(&format!("{scheme}://{host_b}{path}?q=1#f")).unwrap();
        prop_assert_eq!(a.as_str(), format!("~{path}"));
        prop_assert_eq!(a, b);
    }

    #[test]
    fn url_parts_never_panics(s in ".*") {
        let parts = UrlParts::parse(&s);
        let _ = parts.unified_path();
        let _ = normalize(&s);
    }

    #[test]
    fn join_url_never_panics(base in ".{0,40}", reference in ".{0,40}") {
        let _ = join_url(&base, &reference);
    }

    #[test]
    fn join_keeps_raw_directory(
        scheme in arb_scheme(),
        host in arb_host(),
        path in arb_path(),
        name in prop::string::string_regex("[^/?#\\p{C}]{1,12}").unwrap(),
    ) {
        prop_assume!(!is_dot_segment(&name) && !path.split('/').any(is_dot_segment));
        let base = format!("{scheme}://{host}{path}");
        let dir = &path[..path.rfind('/').unwrap()];

        let joined = join_url(&base, &name);
        let normalized = normalize(&joined).unwrap();
        prop_assert_eq!(normalized.as_str(), format!("~{dir}/{name}"));
    }

    #[test]
    fn join_sibling_map_keeps_raw_directory(
        scheme in arb_scheme(),
        host in arb_host(),
        path in arb_path(),
    ) {
        prop_assume!(!path.split('/').any(is_dot_segment));
        let dir = &path[..path.rfind('/').unwrap()];
        let joined = join_url(&format!("{scheme}://{host}{path}"), "x.map");
        let normalized = normalize(&joined).unwrap();
        prop_assert_eq!(normalized.as_str(), format!("~{dir}/x.map"));
    }

    #[test]
    fn url_prefix_never_panics(path in ".{0,30}", name in ".{0,30}") {
        let _ = url_prefix(&path, &name);
    }
}

// ============================================================================
// Matcher
// ============================================================================

proptest! {
    #[test]
    fn matcher_is_deterministic(artifacts in arb_artifacts(), path in prop::sample::select(vec!["/bundle.js", "/vendor.js", "/nope.js"])) {
        let unified = UnifiedPath::from_url_path(path);
        let target = MatchTarget { abs_path: "http://cdn/x", unified: &unified, filename: None };
        let dist = EventDistribution::default();

        let first = find_match(&artifacts, &target, &dist, None);
        let second = find_match(&artifacts, &target, &dist, None);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn match_is_first_exact_without_dist(artifacts in arb_artifacts()) {
        let unified = UnifiedPath::from_url_path("/bundle.js");
        let target = MatchTarget { abs_path: "http://cdn/bundle.js", unified: &unified, filename: None };
        let expected = artifacts
            .iter()
            .find(|a| a.name == "~/bundle.js" && a.dist_id.is_none());

        match find_match(&artifacts, &target, &EventDistribution::default(), None) {
            Ok(hit) => prop_assert_eq!(Some(hit), expected),
            Err(_) => prop_assert!(expected.is_none()),
        }
    }
}

// ============================================================================
// Reference discovery
// ============================================================================

proptest! {
    #[test]
    fn discovery_is_idempotent(content in prop::collection::vec(any::<u8>(), 0..512)) {
        let limits = ScanLimits::default();
        let a = discover_reference(&Headers::new(), || Ok(content.clone()), &limits).unwrap();
        let b = discover_reference(&Headers::new(), || Ok(content.clone()), &limits).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn header_beats_content(reference in arb_reference(), body in arb_reference()) {
        let headers: Headers = [("Sourcemap".to_string(), reference.clone())].into_iter().collect();
        let content = format!("//# sourceMappingURL={body}\n").into_bytes();
        let got = discover_reference(&headers, || Ok(content), &ScanLimits::default()).unwrap();
        prop_assert_eq!(got, Discovery::Found(reference));
    }

    #[test]
    fn scan_never_panics(
        content in prop::collection::vec(any::<u8>(), 0..2048),
        head in 0usize..8,
        tail in 0usize..8,
        full in 0usize..16,
        bytes in 0usize..400,
    ) {
        let limits = ScanLimits { head_lines: head, tail_lines: tail, full_scan_max_lines: full, tail_bytes: bytes };
        let _ = scan_content(&content, &limits);
    }

    #[test]
    fn marked_line_is_found_anywhere_in_short_files(
        before in prop::collection::vec("[a-z();]{0,12}", 0..4),
        reference in arb_reference(),
    ) {
        let mut lines = before;
        lines.push(format!("//# sourceMappingURL={reference}"));
        let content = lines.join("\n").into_bytes();
        let got = discover_reference(&Headers::new(), || Ok(content), &ScanLimits::default()).unwrap();
        prop_assert_eq!(got, Discovery::Found(reference));
    }
}
