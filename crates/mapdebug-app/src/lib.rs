//! Use case orchestration for mapdebug.
//!
//! This crate provides the application layer: use cases that coordinate settings, the
//! filesystem store and the diagnosis engine. It is intentionally thin and delegates heavy
//! lifting to the appropriate layers.
//!
//! The CLI crate depends on this; it only handles argument parsing and I/O.

#![forbid(unsafe_code)]

mod diagnose;
mod explain;
mod report;

pub use diagnose::{
    DiagnoseInput, DiagnoseOutput, FramesInput, FramesOutput, diagnosis_exit_code,
    error_exit_code, run_diagnose, run_diagnose_frames,
};
pub use explain::{
    ExplainOutput, IssueDoc, evidence_keys, format_explanation, format_not_found, run_explain,
};
pub use report::{ResponseVariant, parse_response_json, serialize_response, write_output};
