use crate::model::{CONFIG_SCHEMA_V1, MapdebugConfigV1};
use mapdebug_domain::{DiagnoseConfig, ScanLimits};

pub const DEFAULT_ORGANIZATION_ID: u64 = 1;

#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub organization_id: Option<u64>,
    pub max_artifact_names: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub organization_id: u64,
    pub effective: DiagnoseConfig,
}

pub fn resolve_config(
    cfg: MapdebugConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    if let Some(schema) = cfg.schema.as_deref()
        && schema != CONFIG_SCHEMA_V1
    {
        anyhow::bail!("unsupported config schema: {schema} (expected {CONFIG_SCHEMA_V1})");
    }

    let organization_id = overrides
        .organization_id
        .or(cfg.organization_id)
        .unwrap_or(DEFAULT_ORGANIZATION_ID);

    let mut scan = ScanLimits::default();
    if let Some(v) = cfg.scan.head_lines {
        scan.head_lines = positive("scan.head_lines", v)?;
    }
    if let Some(v) = cfg.scan.tail_lines {
        scan.tail_lines = positive("scan.tail_lines", v)?;
    }
    if let Some(v) = cfg.scan.full_scan_max_lines {
        scan.full_scan_max_lines = v as usize;
    }
    if let Some(v) = cfg.scan.tail_bytes {
        scan.tail_bytes = positive("scan.tail_bytes", v)?;
    }

    let max_artifact_names = overrides
        .max_artifact_names
        .or(cfg.max_artifact_names)
        .map(|n| n as usize);

    Ok(ResolvedConfig {
        organization_id,
        effective: DiagnoseConfig {
            scan,
            max_artifact_names,
        },
    })
}

fn positive(key: &str, v: u32) -> anyhow::Result<usize> {
    if v == 0 {
        anyhow::bail!("{key} must be greater than 0");
    }
    Ok(v as usize)
}
