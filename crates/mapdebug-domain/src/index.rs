//! Uniform, ordered view over a release's uploaded artifacts.
//!
//! Artifacts come in two storage shapes: flat release files and per-distribution
//! manifests. [`ArtifactSource`] hides the difference; [`ArtifactIndex`] concatenates
//! sources in order and materializes the merged list on first access.

use crate::model::{Artifact, ArtifactManifest, Distribution, Release, ReleaseFile};
use crate::store::{ManifestFilter, ReleaseStore, StoreError};
use std::sync::OnceLock;

#[derive(Clone, Debug)]
pub enum ArtifactSource {
    /// Flat files, already filtered to non-empty ones and ordered by name.
    ReleaseFiles(Vec<ReleaseFile>),
    /// One distribution's manifest. `dist` is `None` for artifacts uploaded without one.
    Manifest {
        dist: Option<Distribution>,
        manifest: ArtifactManifest,
    },
}

impl ArtifactSource {
    /// Build the flat-file source: zero-count files dropped, stable order by name.
    pub fn release_files(mut files: Vec<ReleaseFile>) -> Self {
        files.retain(|f| f.artifact_count != 0);
        files.sort_by(|a, b| a.name.cmp(&b.name));
        ArtifactSource::ReleaseFiles(files)
    }

    pub fn len(&self) -> usize {
        match self {
            ArtifactSource::ReleaseFiles(files) => files.len(),
            ArtifactSource::Manifest { manifest, .. } => manifest.entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append this source's artifacts to `out`, keeping the source's order.
    pub fn extend_into(&self, out: &mut Vec<Artifact>) {
        match self {
            ArtifactSource::ReleaseFiles(files) => {
                out.extend(files.iter().map(|f| Artifact {
                    name: f.name.clone(),
                    file: f.file.clone(),
                    headers: f.headers.clone(),
                    dist_id: f.dist_id,
                }));
            }
            ArtifactSource::Manifest { dist, manifest } => {
                let dist_id = dist.as_ref().map(|d| d.id);
                out.extend(manifest.entries.iter().map(|e| Artifact {
                    name: e.name.clone(),
                    file: e.file.clone(),
                    headers: e.headers.clone(),
                    dist_id,
                }));
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct ArtifactIndex {
    sources: Vec<ArtifactSource>,
    merged: OnceLock<Vec<Artifact>>,
}

impl ArtifactIndex {
    pub fn new(sources: Vec<ArtifactSource>) -> Self {
        Self {
            sources,
            merged: OnceLock::new(),
        }
    }

    pub fn sources(&self) -> &[ArtifactSource] {
        &self.sources
    }

    /// Merged artifacts in source order.
    pub fn artifacts(&self) -> &[Artifact] {
        self.merged.get_or_init(|| {
            let mut out = Vec::with_capacity(self.sources.iter().map(ArtifactSource::len).sum());
            for source in &self.sources {
                source.extend_into(&mut out);
            }
            out
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.artifacts().iter().map(|a| a.name.as_str())
    }
}

/// Collect every artifact source of `release`: flat files first, then one manifest per
/// distribution in store order, then the manifest of artifacts without a distribution.
///
/// Manifests that cannot be read are skipped.
pub fn list_artifacts<S>(
    store: &S,
    release: &Release,
    organization_id: u64,
) -> Result<ArtifactIndex, StoreError>
where
    S: ReleaseStore + ?Sized,
{
    let mut sources = vec![ArtifactSource::release_files(store.release_files(release)?)];

    let mut dists: Vec<Option<Distribution>> = store
        .distributions(organization_id, release)?
        .into_iter()
        .map(Some)
        .collect();
    dists.push(None);

    for dist in dists {
        match store.read_manifest(release, dist.as_ref(), ManifestFilter::NonEmpty) {
            Ok(manifest) => sources.push(ArtifactSource::Manifest { dist, manifest }),
            Err(err) => {
                tracing::debug!(
                    release = %release.version,
                    dist = dist.as_ref().map(|d| d.name.as_str()),
                    error = %err,
                    "skipping artifact manifest"
                );
            }
        }
    }

    Ok(ArtifactIndex::new(sources))
}
