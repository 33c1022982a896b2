//! Collaborator ports. The engine reads everything through these traits; adapters live
//! outside this crate.

use crate::model::{ArtifactManifest, Distribution, Event, FileRef, Release, ReleaseFile};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("malformed {what}: {reason}")]
    Malformed { what: String, reason: String },

    #[error("failed to read {what}")]
    Io {
        what: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn malformed(what: impl Into<String>, reason: impl ToString) -> Self {
        Self::Malformed {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

/// Which manifests a read may return.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManifestFilter {
    Any,
    /// Only manifests recording at least one artifact.
    NonEmpty,
}

pub trait EventStore {
    fn event(&self, project_id: u64, event_id: &str) -> Result<Option<Event>, StoreError>;
}

pub trait ReleaseStore {
    fn release(&self, organization_id: u64, version: &str) -> Result<Option<Release>, StoreError>;

    /// Flat files uploaded to the release, in any order.
    fn release_files(&self, release: &Release) -> Result<Vec<ReleaseFile>, StoreError>;

    fn distributions(
        &self,
        organization_id: u64,
        release: &Release,
    ) -> Result<Vec<Distribution>, StoreError>;

    /// Look up a distribution by name. `None` looks up the unnamed distribution.
    fn distribution(
        &self,
        release: &Release,
        name: Option<&str>,
    ) -> Result<Option<Distribution>, StoreError>;

    /// Read the artifact manifest of one distribution (`None` for artifacts without one).
    ///
    /// Absent, unreadable, and filtered-out manifests are all errors.
    fn read_manifest(
        &self,
        release: &Release,
        dist: Option<&Distribution>,
        filter: ManifestFilter,
    ) -> Result<ArtifactManifest, StoreError>;

    fn read_file(&self, file: &FileRef) -> Result<Vec<u8>, StoreError>;
}
