use std::collections::BTreeMap;

/// Tag carrying the release version on an event.
pub const RELEASE_TAG: &str = "sentry:release";

/// Artifact headers. Keys are case-sensitive (`Sourcemap`, `X-SourceMap`).
pub type Headers = BTreeMap<String, String>;

#[derive(Clone, Debug, Default)]
pub struct Event {
    pub event_id: String,
    pub tags: Vec<(String, String)>,

    /// Distribution name reported by the SDK.
    pub dist: Option<String>,
    pub exception: Option<ExceptionInterface>,
}

impl Event {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn release_version(&self) -> Option<&str> {
        self.tag(RELEASE_TAG).filter(|v| !v.is_empty())
    }
}

#[derive(Clone, Debug, Default)]
pub struct ExceptionInterface {
    pub values: Vec<ExceptionValue>,
}

#[derive(Clone, Debug, Default)]
pub struct ExceptionValue {
    pub kind: Option<String>,
    pub value: Option<String>,
    pub stacktrace: Option<Stacktrace>,

    /// Original minified stacktrace, kept when frames were already source mapped upstream.
    pub raw_stacktrace: Option<Stacktrace>,
}

impl ExceptionValue {
    pub fn is_source_mapped(&self) -> bool {
        self.raw_stacktrace
            .as_ref()
            .is_some_and(|st| !st.frames.is_empty())
    }
}

#[derive(Clone, Debug, Default)]
pub struct Stacktrace {
    pub frames: Vec<StackFrame>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StackFrame {
    pub filename: Option<String>,
    pub abs_path: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Release {
    pub id: u64,
    pub organization_id: u64,
    pub version: String,
    pub user_agent: Option<String>,
    pub artifact_count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Distribution {
    pub id: u64,
    pub name: String,
}

/// Opaque handle to artifact bytes, resolved by the store.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileRef(pub String);

impl FileRef {
    pub fn new<S: Into<String>>(s: S) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A single file uploaded to a release (the flat storage shape).
#[derive(Clone, Debug)]
pub struct ReleaseFile {
    pub name: String,
    pub file: FileRef,
    pub headers: Headers,
    pub dist_id: Option<u64>,
    pub artifact_count: u64,
}

/// Compact per-distribution artifact manifest (the bundled storage shape).
///
/// Entries keep the order they were recorded in.
#[derive(Clone, Debug, Default)]
pub struct ArtifactManifest {
    pub entries: Vec<ManifestEntry>,
}

#[derive(Clone, Debug)]
pub struct ManifestEntry {
    pub name: String,
    pub file: FileRef,
    pub headers: Headers,
}

/// Uniform view of an uploaded artifact regardless of how it was stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub file: FileRef,
    pub headers: Headers,
    pub dist_id: Option<u64>,
}
