//! Response envelope (de)serialization and output writing.

use anyhow::Context;
use camino::Utf8Path;
use mapdebug_types::{DiagnosisResponse, FramesResponse};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq)]
pub enum ResponseVariant {
    Single(DiagnosisResponse),
    Frames(FramesResponse),
}

/// Parse a response written by `diagnose` or `frames`.
pub fn parse_response_json(text: &str) -> anyhow::Result<ResponseVariant> {
    let value: serde_json::Value = serde_json::from_str(text).context("parse response json")?;

    if value.get("frames").is_some() {
        let resp: FramesResponse =
            serde_json::from_value(value).context("parse frames response")?;
        Ok(ResponseVariant::Frames(resp))
    } else if value.get("errors").is_some() {
        let resp: DiagnosisResponse =
            serde_json::from_value(value).context("parse diagnosis response")?;
        Ok(ResponseVariant::Single(resp))
    } else {
        anyhow::bail!("unknown response shape: expected `errors` or `frames`")
    }
}

/// Pretty JSON with a trailing newline.
pub fn serialize_response<T: Serialize>(response: &T) -> anyhow::Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(response).context("serialize response")?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Write `bytes` to `path`, creating parent directories.
pub fn write_output(path: &Utf8Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write {path}"))
}
