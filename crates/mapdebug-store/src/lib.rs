//! Filesystem store: events, releases and artifact blobs laid out as JSON files.
//!
//! ```text
//! events/<event_id>.json
//! releases/<version>/release.json
//! releases/<version>/files.json
//! releases/<version>/manifests/<dist>.json   (`_nodist.json` for no distribution)
//! blobs/<file ref>
//! ```
//!
//! Versions and distribution names are escaped with [`escape_component`].
//!
//! This crate is allowed to do filesystem IO. Everything it reads is exposed through the
//! domain's store ports; it never interprets artifacts itself.

#![forbid(unsafe_code)]

mod layout;
mod records;

use anyhow::Context;
use camino::Utf8Path;
use mapdebug_domain::model::{ArtifactManifest, Distribution, Event, FileRef, Release, ReleaseFile};
use mapdebug_domain::store::{EventStore, ManifestFilter, ReleaseStore, StoreError};
use records::{EventRecord, ManifestRecord, ReleaseFileRecord, ReleaseRecord};
use serde::de::DeserializeOwned;

pub use layout::{Layout, escape_component};

/// Fuzz-friendly API for testing record parsing without filesystem access.
/// These functions are designed to never panic on any input.
pub mod fuzz {
    use super::*;

    /// Parse arbitrary text as an event record.
    ///
    /// **Never panics** on any input.
    pub fn parse_event_json(text: &str) -> anyhow::Result<()> {
        let rec: EventRecord = serde_json::from_str(text)?;
        let _ = rec.into_model();
        Ok(())
    }

    /// Parse arbitrary text as an artifact manifest.
    ///
    /// **Never panics** on any input.
    pub fn parse_manifest_json(text: &str) -> anyhow::Result<()> {
        let rec: ManifestRecord = serde_json::from_str(text)?;
        let _ = rec.into_model()?;
        Ok(())
    }
}

/// Store rooted at a directory.
#[derive(Clone, Debug)]
pub struct FsStore {
    layout: Layout,
}

impl FsStore {
    /// Open an existing store directory.
    pub fn open(root: &Utf8Path) -> anyhow::Result<Self> {
        let meta = std::fs::metadata(root).with_context(|| format!("open store {root}"))?;
        anyhow::ensure!(meta.is_dir(), "store root is not a directory: {root}");
        Ok(Self {
            layout: Layout::new(root),
        })
    }

    pub fn root(&self) -> &Utf8Path {
        self.layout.root()
    }

    fn release_record(
        &self,
        organization_id: u64,
        version: &str,
    ) -> Result<Option<ReleaseRecord>, StoreError> {
        let path = self.layout.release(version);
        let Some(record) = read_json::<ReleaseRecord>(&path, &format!("release {version}"))? else {
            return Ok(None);
        };
        // Distinct versions can share a directory name.
        if record.version != version || record.organization_id != organization_id {
            tracing::debug!(%path, version, organization_id, "release record belongs to another release");
            return Ok(None);
        }
        Ok(Some(record))
    }

    fn release_file_records(&self, version: &str) -> Result<Vec<ReleaseFileRecord>, StoreError> {
        let path = self.layout.release_files(version);
        Ok(read_json(&path, &format!("release files of {version}"))?.unwrap_or_default())
    }

    /// Flat file counts plus manifest entry counts, for records without a stored count.
    fn computed_artifact_count(&self, version: &str) -> Result<u64, StoreError> {
        let mut count: u64 = self
            .release_file_records(version)?
            .iter()
            .map(|f| f.artifact_count)
            .sum();

        let dir = self.layout.manifests_dir(version);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(count),
            Err(source) => {
                return Err(StoreError::Io {
                    what: format!("manifests of {version}"),
                    source,
                });
            }
        };
        for entry in entries.flatten() {
            let Ok(path) = camino::Utf8PathBuf::from_path_buf(entry.path()) else {
                continue;
            };
            if path.extension() != Some("json") {
                continue;
            }
            match read_json::<ManifestRecord>(&path, path.as_str()) {
                Ok(Some(manifest)) => count += manifest.artifact_count(),
                Ok(None) => {}
                Err(err) => tracing::debug!(%path, error = %err, "manifest not counted"),
            }
        }
        Ok(count)
    }
}

impl EventStore for FsStore {
    fn event(&self, project_id: u64, event_id: &str) -> Result<Option<Event>, StoreError> {
        if !layout::is_safe_component(event_id) {
            tracing::debug!(event_id, "event id is not a valid file name");
            return Ok(None);
        }
        let path = self.layout.event(event_id);
        let Some(record) = read_json::<EventRecord>(&path, &format!("event {event_id}"))? else {
            return Ok(None);
        };
        if record.project_id.is_some_and(|p| p != project_id) {
            tracing::debug!(event_id, project_id, "event belongs to another project");
            return Ok(None);
        }
        Ok(Some(record.into_model()))
    }
}

impl ReleaseStore for FsStore {
    fn release(&self, organization_id: u64, version: &str) -> Result<Option<Release>, StoreError> {
        let Some(record) = self.release_record(organization_id, version)? else {
            return Ok(None);
        };
        let artifact_count = match record.artifact_count {
            Some(count) => count,
            None => self.computed_artifact_count(version)?,
        };
        Ok(Some(record.into_model(artifact_count)))
    }

    fn release_files(&self, release: &Release) -> Result<Vec<ReleaseFile>, StoreError> {
        Ok(self
            .release_file_records(&release.version)?
            .into_iter()
            .map(ReleaseFile::from)
            .collect())
    }

    fn distributions(
        &self,
        organization_id: u64,
        release: &Release,
    ) -> Result<Vec<Distribution>, StoreError> {
        Ok(self
            .release_record(organization_id, &release.version)?
            .map(|r| r.distributions.into_iter().map(Distribution::from).collect())
            .unwrap_or_default())
    }

    fn distribution(
        &self,
        release: &Release,
        name: Option<&str>,
    ) -> Result<Option<Distribution>, StoreError> {
        let Some(name) = name else {
            return Ok(None);
        };
        Ok(self
            .distributions(release.organization_id, release)?
            .into_iter()
            .find(|d| d.name == name))
    }

    fn read_manifest(
        &self,
        release: &Release,
        dist: Option<&Distribution>,
        filter: ManifestFilter,
    ) -> Result<ArtifactManifest, StoreError> {
        let dist_name = dist.map(|d| d.name.as_str());
        let path = self.layout.manifest(&release.version, dist_name);
        let what = format!("manifest {path}");
        let record = read_json::<ManifestRecord>(&path, &what)?
            .ok_or_else(|| StoreError::not_found(what.clone()))?;
        if filter == ManifestFilter::NonEmpty && record.artifact_count() == 0 {
            return Err(StoreError::not_found(format!("non-empty {what}")));
        }
        record
            .into_model()
            .map_err(|err| StoreError::malformed(what, err))
    }

    fn read_file(&self, file: &FileRef) -> Result<Vec<u8>, StoreError> {
        let what = format!("blob {}", file.as_str());
        if !layout::is_safe_relative(file.as_str()) {
            return Err(StoreError::malformed(what, "file ref escapes the blob directory"));
        }
        read_bytes(&self.layout.blob(file.as_str()), &what)?
            .ok_or_else(|| StoreError::not_found(what))
    }
}

/// `Ok(None)` when the file does not exist.
fn read_bytes(path: &Utf8Path, what: &str) -> Result<Option<Vec<u8>>, StoreError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Io {
            what: what.to_string(),
            source,
        }),
    }
}

fn read_json<T: DeserializeOwned>(path: &Utf8Path, what: &str) -> Result<Option<T>, StoreError> {
    let Some(bytes) = read_bytes(path, what)? else {
        return Ok(None);
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|err| StoreError::malformed(what, err))
}
