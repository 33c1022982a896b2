//! Fuzz target for URL splitting, unification, joining and prefix suggestions.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_url_normalize
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mapdebug_domain::matcher::url_prefix;
use mapdebug_domain::normalize::{UrlParts, join_url, normalize};

#[derive(Arbitrary, Debug)]
struct UrlInput {
    abs_path: String,
    reference: String,
    artifact_name: String,
}

fuzz_target!(|input: UrlInput| {
    if input.abs_path.len() > 2048 || input.reference.len() > 2048 {
        return;
    }

    let _ = UrlParts::parse(&input.abs_path).unified_path();

    if let Ok(unified) = normalize(&input.abs_path) {
        // Unified paths always carry the origin-free marker.
        assert!(unified.as_str().starts_with('~'));
        let _ = url_prefix(unified.url_path(), &input.artifact_name);
    }

    let joined = join_url(&input.abs_path, &input.reference);
    let _ = UrlParts::parse(&joined).unified_path();
});
