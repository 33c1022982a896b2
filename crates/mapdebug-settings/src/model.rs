use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const CONFIG_SCHEMA_V1: &str = "mapdebug.config.v1";

/// `mapdebug.toml` schema v1.
///
/// This is a *user-facing* config model: every field is optional and unset fields fall back
/// to the engine defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MapdebugConfigV1 {
    /// Optional schema string for tooling (`mapdebug.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Organization the releases are looked up in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<u64>,

    /// How many artifact names to carry as match evidence. Unset means all of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_artifact_names: Option<u32>,

    #[serde(default)]
    pub scan: ScanConfig,
}

/// Bounds on the content scan for `sourceMappingURL` comments.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScanConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_lines: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail_lines: Option<u32>,

    /// Files with at most this many lines are scanned in full.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_scan_max_lines: Option<u32>,

    /// Trailing bytes of the last scanned line searched for an embedded reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail_bytes: Option<u32>,
}
