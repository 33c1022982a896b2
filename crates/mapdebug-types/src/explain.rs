//! Explain registry for issue codes.
//!
//! Maps issue codes to human-readable explanations with remediation guidance.

use crate::ids;

/// Explanation entry for an issue code.
#[derive(Debug, Clone)]
pub struct Explanation {
    /// Short description of the issue.
    pub title: &'static str,
    /// What the issue means and how the diagnosis reached it.
    pub description: &'static str,
    /// How to fix it.
    pub remediation: &'static str,
    /// Before/after examples.
    pub examples: ExamplePair,
}

/// Before and after examples.
#[derive(Debug, Clone)]
pub struct ExamplePair {
    /// Setup that produces the issue.
    pub before: &'static str,
    /// Setup that resolves.
    pub after: &'static str,
}

/// Look up an explanation by issue code.
///
/// Returns `None` if the code is not recognized.
pub fn lookup_explanation(code: &str) -> Option<Explanation> {
    match code {
        ids::CODE_MISSING_RELEASE => Some(explain_missing_release()),
        ids::CODE_MISSING_USER_AGENT => Some(explain_missing_user_agent()),
        ids::CODE_MISSING_SOURCEMAPS => Some(explain_missing_sourcemaps()),
        ids::CODE_URL_NOT_VALID => Some(explain_url_not_valid()),
        ids::CODE_NO_URL_MATCH => Some(explain_no_url_match()),
        ids::CODE_PARTIAL_MATCH => Some(explain_partial_match()),
        ids::CODE_DIST_MISMATCH => Some(explain_dist_mismatch()),
        ids::CODE_SOURCEMAP_NOT_FOUND => Some(explain_sourcemap_not_found()),
        _ => None,
    }
}

/// List all known codes.
pub fn all_codes() -> &'static [&'static str] {
    ids::ALL_CODES
}

fn explain_missing_release() -> Explanation {
    Explanation {
        title: "Event Has No Release",
        description: "\
The event does not carry a `sentry:release` tag, or the tagged release does not exist
for the organization.

Artifacts are uploaded per release. Without a release there is nothing to look the
frame up in, so no further resolution is attempted.",
        remediation: "\
Configure the SDK with the same release identifier used when uploading artifacts, and
make sure the release was created before events arrive.",
        examples: ExamplePair {
            before: r#"init({ dsn })"#,
            after: r#"init({ dsn, release: "my-app@1.4.0" })"#,
        },
    }
}

fn explain_missing_user_agent() -> Explanation {
    Explanation {
        title: "Release Has No User Agent",
        description: "\
The release exists but records no user agent. A user agent is recorded when a release
is created by an upload tool, so its absence usually means the release was created
implicitly by an incoming event and no artifacts were ever uploaded for it.",
        remediation: "\
Create the release and upload artifacts with an upload tool as part of the build,
using the exact release version reported in the evidence.",
        examples: ExamplePair {
            before: "release my-app@1.4.0 created by first event",
            after: "release my-app@1.4.0 created by the build's upload step",
        },
    }
}

fn explain_missing_sourcemaps() -> Explanation {
    Explanation {
        title: "Release Has No Artifacts",
        description: "\
The release has zero uploaded artifacts, neither individual release files nor
artifact bundles.",
        remediation: "\
Upload both the minified files and their source maps for this release.",
        examples: ExamplePair {
            before: "release my-app@1.4.0: 0 artifacts",
            after: "release my-app@1.4.0: ~/bundle.js, ~/bundle.js.map",
        },
    }
}

fn explain_url_not_valid() -> Explanation {
    Explanation {
        title: "Frame URL Is Not Valid",
        description: "\
The frame's absolute path is not a URL with both a scheme and a path, so it cannot be
unified into an artifact name.

Typical causes are frames from inline scripts, `eval`, or tooling that rewrites
frame paths to bare file names.",
        remediation: "\
Make sure frames report absolute URLs. If frames are rewritten before sending,
rewrite them to a URL form such as `app:///bundle.js`.",
        examples: ExamplePair {
            before: r#"abs_path: "bundle.js""#,
            after: r#"abs_path: "app:///bundle.js""#,
        },
    }
}

fn explain_no_url_match() -> Explanation {
    Explanation {
        title: "No Artifact Matches The Frame URL",
        description: "\
No uploaded artifact is named after the frame's unified path, and no artifact name
even ends with the frame's file name.

The evidence lists the unified path that was looked up and every known artifact
name.",
        remediation: "\
Upload the file the frame points at, or adjust the upload prefix so the artifact name
equals the unified path (`~` followed by the URL path).",
        examples: ExamplePair {
            before: "frame http://cdn.example.com/js/app.js, artifacts: ~/vendor.js",
            after: "frame http://cdn.example.com/js/app.js, artifacts: ~/js/app.js",
        },
    }
}

fn explain_partial_match() -> Explanation {
    Explanation {
        title: "Artifact Name Only Partially Matches",
        description: "\
An artifact with the frame's file name exists, but under a different directory than
the frame URL. The evidence carries the closest artifact and a suggested URL prefix
that would align the two.",
        remediation: "\
Re-upload with the suggested URL prefix, or change how the build rewrites paths so
artifact names equal the frame's unified path.",
        examples: ExamplePair {
            before: "frame http://cdn/bundle.js, artifact ~/static/app/bundle.js",
            after: "frame http://cdn/static/app/bundle.js, artifact ~/static/app/bundle.js",
        },
    }
}

fn explain_dist_mismatch() -> Explanation {
    Explanation {
        title: "Distribution Does Not Match",
        description: "\
An artifact matches the frame URL, but it was uploaded for a different distribution
than the one the event reports (or the event's distribution does not exist for the
release).",
        remediation: "\
Send the same `dist` value from the SDK that was used when uploading, or upload the
artifacts without a distribution if the SDK sends none.",
        examples: ExamplePair {
            before: r#"event dist: none, artifact dist: "android""#,
            after: r#"event dist: "android", artifact dist: "android""#,
        },
    }
}

fn explain_sourcemap_not_found() -> Explanation {
    Explanation {
        title: "Source Map Not Found",
        description: "\
The frame's file was found, but its source map could not be: the file declares no
source map reference (no `Sourcemap` header and no `sourceMappingURL` comment), the
reference is only a comment, or the referenced map is empty.",
        remediation: "\
Make sure the build emits a `//# sourceMappingURL=` comment (or upload with a
`Sourcemap` header), and upload the referenced map next to the file.",
        examples: ExamplePair {
            before: "bundle.js without a sourceMappingURL comment",
            after: "bundle.js ending in //# sourceMappingURL=bundle.js.map",
        },
    }
}
