use crate::model::{
    Artifact, ArtifactManifest, Distribution, Event, ExceptionInterface, ExceptionValue, FileRef,
    Headers, ManifestEntry, RELEASE_TAG, Release, ReleaseFile, StackFrame, Stacktrace,
};
use crate::store::{EventStore, ManifestFilter, ReleaseStore, StoreError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, mpsc};
use std::time::Duration;

/// In-memory store. Blobs are keyed by file ref.
#[derive(Debug, Default)]
pub struct MemoryStore {
    events: HashMap<(u64, String), Event>,
    releases: Vec<Release>,
    files: HashMap<u64, Vec<ReleaseFile>>,
    dists: HashMap<u64, Vec<Distribution>>,
    /// `None` marks a manifest that exists but cannot be read.
    manifests: HashMap<(u64, Option<u64>), Option<ArtifactManifest>>,
    blobs: HashMap<String, Vec<u8>>,
    fail_release_lookup: bool,
    fail_distribution_lookup: bool,
    release_file_reads: AtomicUsize,
    distribution_lookups: AtomicUsize,
    listing_gate: Option<ListingGate>,
}

/// Listing `waiter`'s files blocks until some other release has been listed.
#[derive(Debug)]
struct ListingGate {
    waiter: u64,
    tx: Mutex<mpsc::Sender<()>>,
    rx: Mutex<mpsc::Receiver<()>>,
}

impl MemoryStore {
    pub fn with_event(mut self, project_id: u64, event: Event) -> Self {
        self.events
            .insert((project_id, event.event_id.clone()), event);
        self
    }

    pub fn with_release(mut self, release: Release) -> Self {
        self.releases.push(release);
        self
    }

    pub fn with_release_file(mut self, release: &Release, file: ReleaseFile) -> Self {
        self.files.entry(release.id).or_default().push(file);
        self
    }

    pub fn with_dist(mut self, release: &Release, dist: Distribution) -> Self {
        self.dists.entry(release.id).or_default().push(dist);
        self
    }

    pub fn with_manifest(
        mut self,
        release: &Release,
        dist: Option<&Distribution>,
        entries: &[(&str, &str)],
    ) -> Self {
        let manifest = ArtifactManifest {
            entries: entries
                .iter()
                .map(|(name, file)| ManifestEntry {
                    name: name.to_string(),
                    file: FileRef::new(*file),
                    headers: Headers::new(),
                })
                .collect(),
        };
        self.manifests
            .insert((release.id, dist.map(|d| d.id)), Some(manifest));
        self
    }

    pub fn with_broken_manifest(mut self, release: &Release, dist: Option<&Distribution>) -> Self {
        self.manifests.insert((release.id, dist.map(|d| d.id)), None);
        self
    }

    pub fn with_blob(mut self, file: &str, content: &[u8]) -> Self {
        self.blobs.insert(file.to_string(), content.to_vec());
        self
    }

    pub fn failing_release_lookup(mut self) -> Self {
        self.fail_release_lookup = true;
        self
    }

    /// How many times flat release files were listed.
    pub fn failing_distribution_lookup(mut self) -> Self {
        self.fail_distribution_lookup = true;
        self
    }

    /// Listing `release` waits (up to five seconds) for another release to be listed.
    pub fn gate_listing_on_other_release(mut self, release: &Release) -> Self {
        let (tx, rx) = mpsc::channel();
        self.listing_gate = Some(ListingGate {
            waiter: release.id,
            tx: Mutex::new(tx),
            rx: Mutex::new(rx),
        });
        self
    }

    pub fn release_file_reads(&self) -> usize {
        self.release_file_reads.load(Ordering::Relaxed)
    }

    pub fn distribution_lookups(&self) -> usize {
        self.distribution_lookups.load(Ordering::Relaxed)
    }
}

impl EventStore for MemoryStore {
    fn event(&self, project_id: u64, event_id: &str) -> Result<Option<Event>, StoreError> {
        Ok(self
            .events
            .get(&(project_id, event_id.to_string()))
            .cloned())
    }
}

impl ReleaseStore for MemoryStore {
    fn release(&self, organization_id: u64, version: &str) -> Result<Option<Release>, StoreError> {
        if self.fail_release_lookup {
            return Err(StoreError::malformed("release", "simulated failure"));
        }
        Ok(self
            .releases
            .iter()
            .find(|r| r.organization_id == organization_id && r.version == version)
            .cloned())
    }

    fn release_files(&self, release: &Release) -> Result<Vec<ReleaseFile>, StoreError> {
        self.release_file_reads.fetch_add(1, Ordering::Relaxed);
        if let Some(gate) = &self.listing_gate {
            if gate.waiter == release.id {
                let rx = gate.rx.lock().unwrap();
                rx.recv_timeout(Duration::from_secs(5))
                    .map_err(|_| StoreError::malformed("release files", "listing gate timed out"))?;
            } else {
                let _ = gate.tx.lock().unwrap().send(());
            }
        }
        Ok(self.files.get(&release.id).cloned().unwrap_or_default())
    }

    fn distributions(
        &self,
        _organization_id: u64,
        release: &Release,
    ) -> Result<Vec<Distribution>, StoreError> {
        Ok(self.dists.get(&release.id).cloned().unwrap_or_default())
    }

    fn distribution(
        &self,
        release: &Release,
        name: Option<&str>,
    ) -> Result<Option<Distribution>, StoreError> {
        self.distribution_lookups.fetch_add(1, Ordering::Relaxed);
        if self.fail_distribution_lookup {
            return Err(StoreError::malformed("distribution", "simulated failure"));
        }
        let Some(name) = name else {
            return Ok(None);
        };
        Ok(self
            .dists
            .get(&release.id)
            .and_then(|ds| ds.iter().find(|d| d.name == name))
            .cloned())
    }

    fn read_manifest(
        &self,
        release: &Release,
        dist: Option<&Distribution>,
        filter: ManifestFilter,
    ) -> Result<ArtifactManifest, StoreError> {
        let what = format!("manifest {:?}", dist.map(|d| d.name.as_str()));
        match self.manifests.get(&(release.id, dist.map(|d| d.id))) {
            None => Err(StoreError::not_found(what)),
            Some(None) => Err(StoreError::malformed(what, "unreadable")),
            Some(Some(m)) if filter == ManifestFilter::NonEmpty && m.entries.is_empty() => {
                Err(StoreError::not_found(what))
            }
            Some(Some(m)) => Ok(m.clone()),
        }
    }

    fn read_file(&self, file: &FileRef) -> Result<Vec<u8>, StoreError> {
        self.blobs
            .get(file.as_str())
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("blob {}", file.as_str())))
    }
}

pub fn release(id: u64, version: &str, user_agent: Option<&str>, artifact_count: u64) -> Release {
    Release {
        id,
        organization_id: 1,
        version: version.to_string(),
        user_agent: user_agent.map(|s| s.to_string()),
        artifact_count,
    }
}

pub fn dist(id: u64, name: &str) -> Distribution {
    Distribution {
        id,
        name: name.to_string(),
    }
}

/// A non-empty release file whose content lives in the blob named like the file.
pub fn release_file(name: &str, dist_id: Option<u64>) -> ReleaseFile {
    ReleaseFile {
        name: name.to_string(),
        file: FileRef::new(name),
        headers: Headers::new(),
        dist_id,
        artifact_count: 1,
    }
}

pub fn with_headers(mut file: ReleaseFile, headers: &[(&str, &str)]) -> ReleaseFile {
    file.headers
        .extend(headers.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    file
}

pub fn artifact(name: &str, file: &str, dist_id: Option<u64>) -> Artifact {
    Artifact {
        name: name.to_string(),
        file: FileRef::new(file),
        headers: Headers::new(),
        dist_id,
    }
}

pub fn frame(filename: Option<&str>, abs_path: Option<&str>) -> StackFrame {
    StackFrame {
        filename: filename.map(|s| s.to_string()),
        abs_path: abs_path.map(|s| s.to_string()),
    }
}

pub fn exception(frames: Vec<StackFrame>) -> ExceptionValue {
    ExceptionValue {
        kind: Some("TypeError".to_string()),
        value: Some("x is undefined".to_string()),
        stacktrace: Some(Stacktrace { frames }),
        raw_stacktrace: None,
    }
}

pub fn event(
    event_id: &str,
    release: Option<&str>,
    dist: Option<&str>,
    exceptions: Vec<ExceptionValue>,
) -> Event {
    Event {
        event_id: event_id.to_string(),
        tags: release
            .map(|r| vec![(RELEASE_TAG.to_string(), r.to_string())])
            .unwrap_or_default(),
        dist: dist.map(|d| d.to_string()),
        exception: Some(ExceptionInterface { values: exceptions }),
    }
}
