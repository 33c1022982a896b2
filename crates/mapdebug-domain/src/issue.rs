//! Diagnosis outcomes and their evidence payloads.
//!
//! Every issue serializes to `{type, message, data}`. Evidence field names are camelCase
//! and are part of the response contract.

use mapdebug_types::{DiagnosisResponse, IssueRecord, UnifiedPath, ids};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingUserAgentEvidence {
    pub version: String,
    pub filename: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlNotValidEvidence {
    pub abs_path: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialMatchEvidence {
    pub abs_path: String,
    pub partial_match_path: String,
    pub filename: Option<String>,
    pub unified_path: UnifiedPath,
    pub url_prefix: String,
    pub artifact_names: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoUrlMatchEvidence {
    pub abs_path: String,
    pub filename: Option<String>,
    pub unified_path: UnifiedPath,
    pub artifact_names: Vec<String>,
}

/// Why an exact-name match was rejected on its distribution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum DistMismatchEvidence {
    /// The event names a distribution the release does not have (or names none while the
    /// artifact has one).
    UnknownEventDist {
        event_dist: Option<String>,
        filename: Option<String>,
    },
    /// The event's distribution resolved, but the artifact belongs to another one.
    ArtifactDist {
        event_dist: u64,
        artifact_dist: Option<u64>,
        filename: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcemapNotFoundEvidence {
    pub filename: Option<String>,
}

/// Typed failure of the artifact matcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchFailure {
    PartialMatch(PartialMatchEvidence),
    NoUrlMatch(NoUrlMatchEvidence),
    DistMismatch(DistMismatchEvidence),
}

impl From<MatchFailure> for Issue {
    fn from(failure: MatchFailure) -> Self {
        match failure {
            MatchFailure::PartialMatch(e) => Issue::PartialMatch(e),
            MatchFailure::NoUrlMatch(e) => Issue::NoUrlMatch(e),
            MatchFailure::DistMismatch(e) => Issue::DistMismatch(e),
        }
    }
}

/// A reason resolution could not complete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Issue {
    MissingRelease,
    MissingUserAgent(MissingUserAgentEvidence),
    MissingSourcemaps,
    UrlNotValid(UrlNotValidEvidence),
    PartialMatch(PartialMatchEvidence),
    NoUrlMatch(NoUrlMatchEvidence),
    DistMismatch(DistMismatchEvidence),
    SourcemapNotFound(SourcemapNotFoundEvidence),
}

impl Issue {
    pub fn code(&self) -> &'static str {
        match self {
            Issue::MissingRelease => ids::CODE_MISSING_RELEASE,
            Issue::MissingUserAgent(_) => ids::CODE_MISSING_USER_AGENT,
            Issue::MissingSourcemaps => ids::CODE_MISSING_SOURCEMAPS,
            Issue::UrlNotValid(_) => ids::CODE_URL_NOT_VALID,
            Issue::PartialMatch(_) => ids::CODE_PARTIAL_MATCH,
            Issue::NoUrlMatch(_) => ids::CODE_NO_URL_MATCH,
            Issue::DistMismatch(_) => ids::CODE_DIST_MISMATCH,
            Issue::SourcemapNotFound(_) => ids::CODE_SOURCEMAP_NOT_FOUND,
        }
    }

    pub fn message(&self) -> &'static str {
        ids::message_for(self.code()).unwrap_or_default()
    }

    pub fn data(&self) -> Option<Value> {
        match self {
            Issue::MissingRelease | Issue::MissingSourcemaps => None,
            Issue::MissingUserAgent(e) => to_value(e),
            Issue::UrlNotValid(e) => to_value(e),
            Issue::PartialMatch(e) => to_value(e),
            Issue::NoUrlMatch(e) => to_value(e),
            Issue::DistMismatch(e) => to_value(e),
            Issue::SourcemapNotFound(e) => to_value(e),
        }
    }

    pub fn to_record(&self) -> IssueRecord {
        IssueRecord {
            kind: self.code().to_string(),
            message: self.message().to_string(),
            data: self.data(),
        }
    }

    pub(crate) fn sourcemap_not_found(filename: Option<&str>) -> Self {
        Issue::SourcemapNotFound(SourcemapNotFoundEvidence {
            filename: filename.map(str::to_string),
        })
    }
}

// Evidence structs only hold strings, integers and vectors of them.
fn to_value<T: Serialize>(evidence: &T) -> Option<Value> {
    serde_json::to_value(evidence).ok()
}

/// Outcome of diagnosing one frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnosis {
    /// The exception already carries a raw stacktrace; frames were mapped upstream.
    AlreadySourceMapped,
    /// Both the frame's file and its source map resolve to non-empty artifacts.
    Resolved,
    Issue(Issue),
}

impl Diagnosis {
    pub fn issue(&self) -> Option<&Issue> {
        match self {
            Diagnosis::Issue(issue) => Some(issue),
            _ => None,
        }
    }

    pub fn to_response(&self) -> DiagnosisResponse {
        match self {
            Diagnosis::AlreadySourceMapped | Diagnosis::Resolved => DiagnosisResponse::clean(),
            Diagnosis::Issue(issue) => DiagnosisResponse::with_issue(issue.to_record()),
        }
    }
}

impl From<Issue> for Diagnosis {
    fn from(issue: Issue) -> Self {
        Diagnosis::Issue(issue)
    }
}
