//! Stable DTOs and IDs used across the mapdebug workspace.
//!
//! This crate is intentionally boring:
//! - the response envelope returned to callers
//! - stable issue codes and their messages
//! - the canonical unified artifact path
//! - explain registry for remediation guidance

#![forbid(unsafe_code)]

pub mod explain;
pub mod ids;
pub mod path;
pub mod response;

pub use explain::{ExamplePair, Explanation, lookup_explanation};
pub use path::UnifiedPath;
pub use response::{DiagnosisResponse, FrameResponse, FramesResponse, IssueRecord};
