//! Fuzz target for the on-disk JSON record parsers.
//!
//! Goal: The parsers should **never panic** on any input.
//! They may return errors, but panics are unacceptable.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_store_records
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = mapdebug_store::fuzz::parse_event_json(text);
        let _ = mapdebug_store::fuzz::parse_manifest_json(text);
    }
});
