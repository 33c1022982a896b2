//! Stable identifiers for diagnosis issue codes.
//!
//! A code is the `type` field of an issue in the response envelope. Codes and messages are
//! part of the public contract; renderers key their copy off them.

pub const CODE_MISSING_RELEASE: &str = "no_release_on_event";
pub const CODE_MISSING_USER_AGENT: &str = "no_user_agent_on_release";
pub const CODE_MISSING_SOURCEMAPS: &str = "no_sourcemaps_on_release";
pub const CODE_URL_NOT_VALID: &str = "url_not_valid";
pub const CODE_NO_URL_MATCH: &str = "no_url_match";
pub const CODE_PARTIAL_MATCH: &str = "partial_match";
pub const CODE_DIST_MISMATCH: &str = "dist_mismatch";
pub const CODE_SOURCEMAP_NOT_FOUND: &str = "sourcemap_not_found";

/// Every code, in the order the orchestrator can first emit them.
pub const ALL_CODES: &[&str] = &[
    CODE_MISSING_RELEASE,
    CODE_MISSING_USER_AGENT,
    CODE_MISSING_SOURCEMAPS,
    CODE_URL_NOT_VALID,
    CODE_NO_URL_MATCH,
    CODE_PARTIAL_MATCH,
    CODE_DIST_MISMATCH,
    CODE_SOURCEMAP_NOT_FOUND,
];

/// Human-readable message attached to an issue code.
pub fn message_for(code: &str) -> Option<&'static str> {
    let msg = match code {
        CODE_MISSING_RELEASE => "The event is missing a release",
        CODE_MISSING_USER_AGENT => "The release is missing a user agent",
        CODE_MISSING_SOURCEMAPS => "The release is missing source maps",
        CODE_URL_NOT_VALID => "The absolute path url is not valid",
        CODE_NO_URL_MATCH => "The absolute path url does not match any source maps",
        CODE_PARTIAL_MATCH => "The absolute path url is a partial match",
        CODE_DIST_MISMATCH => "The dist values do not match",
        CODE_SOURCEMAP_NOT_FOUND => "The sourcemap could not be found",
        _ => return None,
    };
    Some(msg)
}
