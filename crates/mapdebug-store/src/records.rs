//! On-disk JSON records and their conversion into domain models.
//!
//! Keys are camelCase; snake_case aliases are accepted for event payloads exported from
//! other tooling.

use mapdebug_domain::model::{
    ArtifactManifest, Distribution, Event, ExceptionInterface, ExceptionValue, FileRef, Headers,
    ManifestEntry, Release, ReleaseFile, StackFrame, Stacktrace,
};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(alias = "event_id")]
    pub event_id: String,
    #[serde(default, alias = "project_id")]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub tags: Vec<(String, String)>,
    #[serde(default)]
    pub dist: Option<String>,
    #[serde(default)]
    pub exception: Option<ExceptionRecord>,
}

#[derive(Debug, Deserialize)]
pub struct ExceptionRecord {
    #[serde(default)]
    pub values: Vec<ExceptionValueRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionValueRecord {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub stacktrace: Option<StacktraceRecord>,
    #[serde(default, alias = "raw_stacktrace")]
    pub raw_stacktrace: Option<StacktraceRecord>,
}

#[derive(Debug, Deserialize)]
pub struct StacktraceRecord {
    #[serde(default)]
    pub frames: Vec<StackFrameRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrameRecord {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default, alias = "abs_path")]
    pub abs_path: Option<String>,
}

impl EventRecord {
    pub fn into_model(self) -> Event {
        Event {
            event_id: self.event_id,
            tags: self.tags,
            dist: self.dist,
            exception: self.exception.map(|e| ExceptionInterface {
                values: e.values.into_iter().map(ExceptionValueRecord::into_model).collect(),
            }),
        }
    }
}

impl ExceptionValueRecord {
    fn into_model(self) -> ExceptionValue {
        ExceptionValue {
            kind: self.kind,
            value: self.value,
            stacktrace: self.stacktrace.map(StacktraceRecord::into_model),
            raw_stacktrace: self.raw_stacktrace.map(StacktraceRecord::into_model),
        }
    }
}

impl StacktraceRecord {
    fn into_model(self) -> Stacktrace {
        Stacktrace {
            frames: self
                .frames
                .into_iter()
                .map(|f| StackFrame {
                    filename: f.filename,
                    abs_path: f.abs_path,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRecord {
    pub id: u64,
    #[serde(alias = "organization_id")]
    pub organization_id: u64,
    pub version: String,
    #[serde(default, alias = "user_agent")]
    pub user_agent: Option<String>,
    #[serde(default, alias = "artifact_count")]
    pub artifact_count: Option<u64>,
    #[serde(default)]
    pub distributions: Vec<DistributionRecord>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DistributionRecord {
    pub id: u64,
    pub name: String,
}

impl From<DistributionRecord> for Distribution {
    fn from(r: DistributionRecord) -> Self {
        Distribution {
            id: r.id,
            name: r.name,
        }
    }
}

impl ReleaseRecord {
    /// `artifact_count` is used when the record does not carry one.
    pub fn into_model(self, artifact_count: u64) -> Release {
        Release {
            id: self.id,
            organization_id: self.organization_id,
            version: self.version,
            user_agent: self.user_agent,
            artifact_count: self.artifact_count.unwrap_or(artifact_count),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseFileRecord {
    pub name: String,
    pub file: String,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default)]
    pub dist: Option<u64>,
    #[serde(default = "one", alias = "artifact_count")]
    pub artifact_count: u64,
}

fn one() -> u64 {
    1
}

impl From<ReleaseFileRecord> for ReleaseFile {
    fn from(r: ReleaseFileRecord) -> Self {
        ReleaseFile {
            name: r.name,
            file: FileRef::new(r.file),
            headers: r.headers,
            dist_id: r.dist,
            artifact_count: r.artifact_count,
        }
    }
}

/// Manifest document. `files` keeps document order (`serde_json` is built with
/// `preserve_order`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestRecord {
    #[serde(default, alias = "artifact_count")]
    pub artifact_count: Option<u64>,
    #[serde(default)]
    pub files: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ManifestFileRecord {
    pub file: String,
    #[serde(default)]
    pub headers: Headers,
}

impl ManifestRecord {
    pub fn artifact_count(&self) -> u64 {
        self.artifact_count.unwrap_or(self.files.len() as u64)
    }

    pub fn into_model(self) -> Result<ArtifactManifest, serde_json::Error> {
        let mut entries = Vec::with_capacity(self.files.len());
        for (name, value) in self.files {
            let rec: ManifestFileRecord = serde_json::from_value(value)?;
            entries.push(ManifestEntry {
                name,
                file: FileRef::new(rec.file),
                headers: rec.headers,
            });
        }
        Ok(ArtifactManifest { entries })
    }
}
