//! Fuzz target for source map reference discovery.
//!
//! Goal: scanning artifact content should **never panic**, whatever the bytes and the
//! scan limits.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_sourcemap_scan
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mapdebug_domain::ScanLimits;
use mapdebug_domain::extract::{discover_reference, scan_content};
use mapdebug_domain::model::Headers;

#[derive(Arbitrary, Debug)]
struct ScanInput {
    content: Vec<u8>,
    head_lines: u8,
    tail_lines: u8,
    full_scan_max_lines: u16,
    tail_bytes: u16,
    /// Optional `Sourcemap` header value.
    header: Option<String>,
}

fuzz_target!(|input: ScanInput| {
    if input.content.len() > 64 * 1024 {
        return;
    }

    let limits = ScanLimits {
        head_lines: input.head_lines.into(),
        tail_lines: input.tail_lines.into(),
        full_scan_max_lines: input.full_scan_max_lines.into(),
        tail_bytes: input.tail_bytes.into(),
    };

    let _ = scan_content(&input.content, &limits);

    let headers: Headers = input
        .header
        .map(|value| ("Sourcemap".to_string(), value))
        .into_iter()
        .collect();
    let _ = discover_reference(&headers, || Ok(input.content.clone()), &limits);
});
