//! The `diagnose` and `frames` use cases: resolve frames of a stored event against its
//! release's artifacts.

use anyhow::Context;
use camino::Utf8Path;
use mapdebug_domain::{
    DiagnoseConfig, DiagnoseError, DiagnoseRequest, Diagnoser, Diagnosis, FaultClass,
    exception_at, frames_of,
};
use mapdebug_settings::{MapdebugConfigV1, Overrides, ResolvedConfig};
use mapdebug_store::FsStore;
use mapdebug_types::{DiagnosisResponse, FrameResponse, FramesResponse};
use rayon::prelude::*;

/// Input for the diagnose use case.
#[derive(Clone, Debug)]
pub struct DiagnoseInput<'a> {
    /// Store directory.
    pub store_root: &'a Utf8Path,
    /// Config file contents (empty string if not found).
    pub config_text: &'a str,
    /// CLI overrides.
    pub overrides: Overrides,
    pub project_id: u64,
    pub event_id: &'a str,
    pub exception_idx: usize,
    pub frame_idx: usize,
}

/// Output from the diagnose use case.
#[derive(Clone, Debug)]
pub struct DiagnoseOutput {
    pub response: DiagnosisResponse,
    pub diagnosis: Diagnosis,
    /// The resolved configuration used.
    pub resolved_config: ResolvedConfig,
}

/// Input for diagnosing every frame of one exception.
#[derive(Clone, Debug)]
pub struct FramesInput<'a> {
    pub store_root: &'a Utf8Path,
    pub config_text: &'a str,
    pub overrides: Overrides,
    pub project_id: u64,
    pub event_id: &'a str,
    pub exception_idx: usize,
}

#[derive(Clone, Debug)]
pub struct FramesOutput {
    pub response: FramesResponse,
    pub resolved_config: ResolvedConfig,
}

fn resolve(config_text: &str, overrides: Overrides) -> anyhow::Result<ResolvedConfig> {
    // Empty is allowed, defaults apply.
    let cfg = if config_text.trim().is_empty() {
        MapdebugConfigV1::default()
    } else {
        mapdebug_settings::parse_config_toml(config_text).context("parse config")?
    };
    mapdebug_settings::resolve_config(cfg, overrides).context("resolve config")
}

fn open(store_root: &Utf8Path, config: DiagnoseConfig) -> anyhow::Result<Diagnoser<FsStore>> {
    let store = FsStore::open(store_root).context("open store")?;
    Ok(Diagnoser::new(store, config))
}

/// Run the diagnose use case: resolve config, open the store, load the event and diagnose
/// one frame.
pub fn run_diagnose(input: DiagnoseInput<'_>) -> anyhow::Result<DiagnoseOutput> {
    let resolved = resolve(input.config_text, input.overrides)?;
    let diagnoser = open(input.store_root, resolved.effective.clone())?;

    tracing::info!(
        event_id = input.event_id,
        exception_idx = input.exception_idx,
        frame_idx = input.frame_idx,
        "diagnosing frame"
    );

    let req = DiagnoseRequest {
        organization_id: resolved.organization_id,
        exception_idx: input.exception_idx,
        frame_idx: input.frame_idx,
    };
    let diagnosis = diagnoser
        .diagnose_event(input.project_id, input.event_id, &req)
        .with_context(|| format!("diagnose event {}", input.event_id))?;

    tracing::info!(
        outcome = diagnosis.issue().map_or("ok", |i| i.code()),
        "diagnosis finished"
    );

    Ok(DiagnoseOutput {
        response: diagnosis.to_response(),
        diagnosis,
        resolved_config: resolved,
    })
}

/// Diagnose every frame of one exception in parallel. Frames share one artifact index.
pub fn run_diagnose_frames(input: FramesInput<'_>) -> anyhow::Result<FramesOutput> {
    let resolved = resolve(input.config_text, input.overrides)?;
    let diagnoser = open(input.store_root, resolved.effective.clone())?;

    let event = diagnoser
        .load_event(input.project_id, input.event_id)
        .with_context(|| format!("load event {}", input.event_id))?;
    let exception = exception_at(&event, input.exception_idx)?;
    let frame_count = frames_of(exception, input.exception_idx)?.len();

    tracing::info!(
        event_id = input.event_id,
        exception_idx = input.exception_idx,
        frame_count,
        "diagnosing frames"
    );

    let frames = (0..frame_count)
        .into_par_iter()
        .map(|frame_idx| {
            let req = DiagnoseRequest {
                organization_id: resolved.organization_id,
                exception_idx: input.exception_idx,
                frame_idx,
            };
            let diagnosis = diagnoser.diagnose(&event, &req)?;
            Ok(FrameResponse {
                frame_idx,
                errors: diagnosis.to_response().errors,
            })
        })
        .collect::<Result<Vec<_>, DiagnoseError>>()
        .with_context(|| format!("diagnose frames of event {}", input.event_id))?;

    let response = FramesResponse {
        exception_idx: input.exception_idx,
        frames,
    };
    tracing::info!(issues = response.issue_count(), "frames diagnosed");

    Ok(FramesOutput {
        response,
        resolved_config: resolved,
    })
}

/// Map a diagnosis to an exit code: 0 = no issue, 2 = issue reported.
pub fn diagnosis_exit_code(diagnosis: &Diagnosis) -> i32 {
    match diagnosis {
        Diagnosis::Resolved | Diagnosis::AlreadySourceMapped => 0,
        Diagnosis::Issue(_) => 2,
    }
}

/// Map a failed run to an exit code: 3 = bad request, 4 = not found, 1 = anything else.
pub fn error_exit_code(err: &anyhow::Error) -> i32 {
    let fault = err
        .chain()
        .find_map(|e| e.downcast_ref::<DiagnoseError>())
        .map(DiagnoseError::fault_class);
    match fault {
        Some(FaultClass::BadRequest) => 3,
        Some(FaultClass::NotFound) => 4,
        Some(FaultClass::Internal) | None => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use mapdebug_types::ids;

    fn write_file(root: &Utf8Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, contents).expect("write file");
    }

    /// One release with `~/bundle.js` + map, and an event whose second frame points
    /// nowhere.
    fn sample_store(tmp: &tempfile::TempDir) -> Utf8PathBuf {
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path");
        write_file(
            &root,
            "events/e1.json",
            r#"{
                "eventId": "e1",
                "tags": [["sentry:release", "1.0"]],
                "exception": {"values": [{"type": "Error", "stacktrace": {"frames": [
                    {"filename": "bundle.js", "absPath": "http://cdn/bundle.js"},
                    {"filename": "vendor.js", "absPath": "http://cdn/vendor.js"},
                    {"filename": "<anonymous>", "absPath": "<anonymous>"}
                ]}}]}
            }"#,
        );
        write_file(
            &root,
            "releases/1.0/release.json",
            r#"{"id": 1, "organizationId": 1, "version": "1.0", "userAgent": "cli"}"#,
        );
        write_file(
            &root,
            "releases/1.0/files.json",
            r#"[
                {"name": "~/bundle.js", "file": "bundle.js", "headers": {"Sourcemap": "bundle.js.map"}},
                {"name": "~/bundle.js.map", "file": "bundle.js.map"}
            ]"#,
        );
        write_file(&root, "blobs/bundle.js", "x();");
        write_file(&root, "blobs/bundle.js.map", r#"{"version":3}"#);
        root
    }

    fn input<'a>(root: &'a Utf8Path, frame_idx: usize) -> DiagnoseInput<'a> {
        DiagnoseInput {
            store_root: root,
            config_text: "",
            overrides: Overrides::default(),
            project_id: 1,
            event_id: "e1",
            exception_idx: 0,
            frame_idx,
        }
    }

    #[test]
    fn resolved_frame_has_clean_response() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let root = sample_store(&tmp);
        let output = run_diagnose(input(&root, 0)).expect("run_diagnose");
        assert_eq!(output.diagnosis, Diagnosis::Resolved);
        assert!(output.response.is_clean());
        assert_eq!(diagnosis_exit_code(&output.diagnosis), 0);
    }

    #[test]
    fn unmatched_frame_reports_an_issue() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let root = sample_store(&tmp);
        let output = run_diagnose(input(&root, 1)).expect("run_diagnose");
        assert_eq!(output.response.errors[0].kind, ids::CODE_NO_URL_MATCH);
        assert_eq!(diagnosis_exit_code(&output.diagnosis), 2);
    }

    #[test]
    fn config_organization_applies() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let root = sample_store(&tmp);
        let output = run_diagnose(DiagnoseInput {
            config_text: "organization_id = 9\n",
            ..input(&root, 0)
        })
        .expect("run_diagnose");
        assert_eq!(output.resolved_config.organization_id, 9);
        assert_eq!(output.response.errors[0].kind, ids::CODE_MISSING_RELEASE);
    }

    #[test]
    fn faults_map_to_exit_codes() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let root = sample_store(&tmp);

        let err = run_diagnose(input(&root, 7)).unwrap_err();
        assert_eq!(error_exit_code(&err), 3);

        let err = run_diagnose(DiagnoseInput {
            event_id: "missing",
            ..input(&root, 0)
        })
        .unwrap_err();
        assert_eq!(error_exit_code(&err), 4);

        let err = run_diagnose(DiagnoseInput {
            config_text: "[scan]\ntail_bytes = 0\n",
            ..input(&root, 0)
        })
        .unwrap_err();
        assert_eq!(error_exit_code(&err), 1);
    }

    #[test]
    fn frames_are_diagnosed_in_order() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let root = sample_store(&tmp);
        let output = run_diagnose_frames(FramesInput {
            store_root: &root,
            config_text: "",
            overrides: Overrides::default(),
            project_id: 1,
            event_id: "e1",
            exception_idx: 0,
        })
        .expect("run_diagnose_frames");

        let frames = &output.response.frames;
        assert_eq!(frames.len(), 3);
        assert_eq!(
            frames.iter().map(|f| f.frame_idx).collect::<Vec<_>>(),
            [0, 1, 2]
        );
        assert!(frames[0].errors.is_empty());
        assert_eq!(frames[1].errors[0].kind, ids::CODE_NO_URL_MATCH);
        assert_eq!(frames[2].errors[0].kind, ids::CODE_URL_NOT_VALID);
        assert_eq!(output.response.issue_count(), 2);
    }

    #[test]
    fn frames_of_unknown_exception_is_bad_request() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let root = sample_store(&tmp);
        let err = run_diagnose_frames(FramesInput {
            store_root: &root,
            config_text: "",
            overrides: Overrides::default(),
            project_id: 1,
            event_id: "e1",
            exception_idx: 4,
        })
        .unwrap_err();
        assert_eq!(error_exit_code(&err), 3);
    }
}
