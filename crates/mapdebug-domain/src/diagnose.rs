//! Frame diagnosis: resolve a frame to its file, then to its source map, and report the
//! first step that fails.

use crate::extract::{Discovery, discover_reference};
use crate::index::{ArtifactIndex, list_artifacts};
use crate::issue::{Diagnosis, Issue, MissingUserAgentEvidence, UrlNotValidEvidence};
use crate::matcher::{EventDistribution, MatchTarget, find_match};
use crate::model::{Artifact, Event, ExceptionValue, Release, StackFrame};
use crate::normalize::{UrlParts, join_url, normalize};
use crate::policy::DiagnoseConfig;
use crate::store::{EventStore, ReleaseStore, StoreError};
use mapdebug_types::UnifiedPath;
use std::cell::OnceCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Which frame of an event to diagnose.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiagnoseRequest {
    pub organization_id: u64,
    pub exception_idx: usize,
    pub frame_idx: usize,
}

/// The request cannot be answered with a diagnosis.
#[derive(Debug, Error)]
pub enum DiagnoseError {
    #[error("event {event_id} not found")]
    EventNotFound { event_id: String },

    #[error("event has no exception interface")]
    MissingExceptionInterface,

    #[error("exception index {index} out of range (event has {len} exceptions)")]
    ExceptionIndexOutOfRange { index: usize, len: usize },

    #[error("exception {index} has no stacktrace")]
    MissingStacktrace { index: usize },

    #[error("frame index {index} out of range (stacktrace has {len} frames)")]
    FrameIndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Who is at fault for a [`DiagnoseError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultClass {
    BadRequest,
    NotFound,
    Internal,
}

impl DiagnoseError {
    pub fn fault_class(&self) -> FaultClass {
        match self {
            DiagnoseError::EventNotFound { .. } => FaultClass::NotFound,
            DiagnoseError::MissingExceptionInterface
            | DiagnoseError::ExceptionIndexOutOfRange { .. }
            | DiagnoseError::MissingStacktrace { .. }
            | DiagnoseError::FrameIndexOutOfRange { .. } => FaultClass::BadRequest,
            DiagnoseError::Store(_) => FaultClass::Internal,
        }
    }
}

/// Look up the exception at `index`.
pub fn exception_at(event: &Event, index: usize) -> Result<&ExceptionValue, DiagnoseError> {
    let values = &event
        .exception
        .as_ref()
        .ok_or(DiagnoseError::MissingExceptionInterface)?
        .values;
    values
        .get(index)
        .ok_or(DiagnoseError::ExceptionIndexOutOfRange {
            index,
            len: values.len(),
        })
}

/// Frames of the exception at `exception_idx`.
pub fn frames_of(exception: &ExceptionValue, exception_idx: usize) -> Result<&[StackFrame], DiagnoseError> {
    exception
        .stacktrace
        .as_ref()
        .map(|st| st.frames.as_slice())
        .ok_or(DiagnoseError::MissingStacktrace {
            index: exception_idx,
        })
}

/// Diagnoses frames against one store.
///
/// Artifact indexes are cached per release, so diagnosing many frames of the same
/// release lists its artifacts once. Shareable across threads when the store is.
pub struct Diagnoser<S> {
    store: S,
    config: DiagnoseConfig,
    indexes: Mutex<HashMap<u64, Arc<IndexSlot>>>,
}

/// One release's index. `None` until listed; a failed listing leaves it empty.
type IndexSlot = Mutex<Option<Arc<ArtifactIndex>>>;

impl<S: ReleaseStore> Diagnoser<S> {
    pub fn new(store: S, config: DiagnoseConfig) -> Self {
        Self {
            store,
            config,
            indexes: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &DiagnoseConfig {
        &self.config
    }

    /// Artifact index of `release`, listed on first use.
    ///
    /// The cache lock only guards the slot map; listing holds the release's own slot, so
    /// other releases are never blocked behind it.
    pub fn index_for(
        &self,
        release: &Release,
        organization_id: u64,
    ) -> Result<Arc<ArtifactIndex>, StoreError> {
        let slot = {
            let mut cache = self.indexes.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(cache.entry(release.id).or_default())
        };

        let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(index) = slot.as_ref() {
            tracing::debug!(release = %release.version, "artifact index cache hit");
            return Ok(Arc::clone(index));
        }
        let index = Arc::new(list_artifacts(&self.store, release, organization_id)?);
        *slot = Some(Arc::clone(&index));
        Ok(index)
    }

    /// Diagnose one frame of an already loaded event.
    pub fn diagnose(&self, event: &Event, req: &DiagnoseRequest) -> Result<Diagnosis, DiagnoseError> {
        let exception = exception_at(event, req.exception_idx)?;
        if exception.is_source_mapped() {
            tracing::debug!(exception_idx = req.exception_idx, "exception already source mapped");
            return Ok(Diagnosis::AlreadySourceMapped);
        }

        let Some(release) = self.find_release(event, req.organization_id) else {
            return Ok(Issue::MissingRelease.into());
        };

        let frames = frames_of(exception, req.exception_idx)?;
        let frame = frames
            .get(req.frame_idx)
            .ok_or(DiagnoseError::FrameIndexOutOfRange {
                index: req.frame_idx,
                len: frames.len(),
            })?;

        self.diagnose_frame(event, &release, frame, req.organization_id)
    }

    fn find_release(&self, event: &Event, organization_id: u64) -> Option<Release> {
        let Some(version) = event.release_version() else {
            tracing::debug!(event_id = %event.event_id, "event carries no release tag");
            return None;
        };
        match self.store.release(organization_id, version) {
            Ok(Some(release)) => Some(release),
            Ok(None) => {
                tracing::debug!(version, "release not found");
                None
            }
            Err(err) => {
                tracing::debug!(version, error = %err, "release lookup failed");
                None
            }
        }
    }

    fn diagnose_frame(
        &self,
        event: &Event,
        release: &Release,
        frame: &StackFrame,
        organization_id: u64,
    ) -> Result<Diagnosis, DiagnoseError> {
        let filename = frame.filename.as_deref();

        if release.user_agent.as_deref().is_none_or(str::is_empty) {
            return Ok(Issue::MissingUserAgent(MissingUserAgentEvidence {
                version: release.version.clone(),
                filename: filename.map(str::to_string),
            })
            .into());
        }

        if release.artifact_count == 0 {
            return Ok(Issue::MissingSourcemaps.into());
        }

        let abs_path = frame.abs_path.as_deref().unwrap_or_default();
        let unified = match normalize(abs_path) {
            Ok(unified) => unified,
            Err(err) => {
                tracing::debug!(error = %err, "frame url rejected");
                return Ok(Issue::UrlNotValid(UrlNotValidEvidence {
                    abs_path: frame.abs_path.clone(),
                })
                .into());
            }
        };

        let index = self.index_for(release, organization_id)?;
        let dist = DistributionLookup::new(&self.store, release, event.dist.as_deref());
        let max_names = self.config.max_artifact_names;

        let target = MatchTarget {
            abs_path,
            unified: &unified,
            filename,
        };
        let file_dist = dist.for_key(index.artifacts(), &unified)?;
        let artifact = match find_match(index.artifacts(), &target, &file_dist, max_names) {
            Ok(artifact) => artifact,
            Err(failure) => return Ok(Issue::from(failure).into()),
        };
        tracing::debug!(artifact = %artifact.name, "frame file resolved");

        let discovery = discover_reference(
            &artifact.headers,
            || self.store.read_file(&artifact.file),
            &self.config.scan,
        )?;
        let reference = match discovery {
            Discovery::Found(reference) => reference,
            Discovery::NotDeclared | Discovery::CommentOnly => {
                tracing::debug!(artifact = %artifact.name, ?discovery, "no usable source map reference");
                return Ok(Issue::sourcemap_not_found(filename).into());
            }
        };

        let map_url = join_url(abs_path, &reference);
        let map_unified = UrlParts::parse(&map_url).unified_path();
        let map_target = MatchTarget {
            abs_path: &map_url,
            unified: &map_unified,
            filename,
        };
        let map_dist = dist.for_key(index.artifacts(), &map_unified)?;
        let map_artifact = match find_match(index.artifacts(), &map_target, &map_dist, max_names) {
            Ok(artifact) => artifact,
            Err(failure) => return Ok(Issue::from(failure).into()),
        };
        tracing::debug!(map = %map_artifact.name, "source map resolved");

        if self.store.read_file(&map_artifact.file)?.is_empty() {
            return Ok(Issue::sourcemap_not_found(filename).into());
        }

        Ok(Diagnosis::Resolved)
    }
}

/// The event's distribution, looked up at most once and only when an exact-name
/// candidate has to be verified against it.
struct DistributionLookup<'a, S: ?Sized> {
    store: &'a S,
    release: &'a Release,
    name: Option<&'a str>,
    resolved: OnceCell<EventDistribution>,
}

impl<'a, S: ReleaseStore + ?Sized> DistributionLookup<'a, S> {
    fn new(store: &'a S, release: &'a Release, name: Option<&'a str>) -> Self {
        Self {
            store,
            release,
            name,
            resolved: OnceCell::new(),
        }
    }

    fn for_key(
        &self,
        artifacts: &[Artifact],
        key: &UnifiedPath,
    ) -> Result<EventDistribution, StoreError> {
        if self.name.is_none() || !artifacts.iter().any(|a| a.name == key.as_str()) {
            return Ok(EventDistribution::unresolved(self.name));
        }
        if let Some(dist) = self.resolved.get() {
            return Ok(dist.clone());
        }
        let dist = EventDistribution::resolve(self.store, self.release, self.name)?;
        Ok(self.resolved.get_or_init(|| dist).clone())
    }
}

impl<S: EventStore + ReleaseStore> Diagnoser<S> {
    /// Load the event and diagnose one of its frames.
    pub fn diagnose_event(
        &self,
        project_id: u64,
        event_id: &str,
        req: &DiagnoseRequest,
    ) -> Result<Diagnosis, DiagnoseError> {
        let event = self.load_event(project_id, event_id)?;
        self.diagnose(&event, req)
    }

    pub fn load_event(&self, project_id: u64, event_id: &str) -> Result<Event, DiagnoseError> {
        self.store
            .event(project_id, event_id)?
            .ok_or_else(|| DiagnoseError::EventNotFound {
                event_id: event_id.to_string(),
            })
    }
}
