//! Config parsing and resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves configuration provided as strings.

#![forbid(unsafe_code)]

mod model;
mod resolve;

pub use model::{CONFIG_SCHEMA_V1, MapdebugConfigV1, ScanConfig};
pub use resolve::{DEFAULT_ORGANIZATION_ID, Overrides, ResolvedConfig};

/// Parse `mapdebug.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<MapdebugConfigV1> {
    let cfg: MapdebugConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective config used by the engine (defaults + file + overrides).
pub fn resolve_config(
    cfg: MapdebugConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}
