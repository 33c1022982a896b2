//! Source map resolution and diagnosis (no IO).
//!
//! Input: an event, a frame position, and read access to the release's artifacts through
//! the [`store`] ports.
//! Output: a [`Diagnosis`]: resolved, already source mapped, or the first issue found.

#![forbid(unsafe_code)]

pub mod extract;
pub mod index;
pub mod issue;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod policy;
pub mod store;

mod diagnose;

pub use diagnose::{
    DiagnoseError, DiagnoseRequest, Diagnoser, FaultClass, exception_at, frames_of,
};
pub use issue::{Diagnosis, Issue, MatchFailure};
pub use policy::{DiagnoseConfig, ScanLimits};

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod proptest;
