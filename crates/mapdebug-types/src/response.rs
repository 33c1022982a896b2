use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One diagnosed issue as returned to callers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IssueRecord {
    /// Stable issue code (see [`crate::ids`]).
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,

    /// Code-specific evidence. Always present on the wire; `null` for codes without evidence.
    #[serde(default)]
    pub data: Option<JsonValue>,
}

/// Response for a single frame diagnosis.
///
/// `errors` holds at most one entry. An empty list means the frame resolved to a non-empty
/// source map, or that the exception was already source mapped.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DiagnosisResponse {
    pub errors: Vec<IssueRecord>,
}

impl DiagnosisResponse {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn with_issue(issue: IssueRecord) -> Self {
        Self {
            errors: vec![issue],
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FrameResponse {
    pub frame_idx: usize,
    pub errors: Vec<IssueRecord>,
}

/// Response for diagnosing every frame of one exception.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FramesResponse {
    pub exception_idx: usize,
    pub frames: Vec<FrameResponse>,
}

impl FramesResponse {
    pub fn issue_count(&self) -> usize {
        self.frames.iter().map(|f| f.errors.len()).sum()
    }
}
