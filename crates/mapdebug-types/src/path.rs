use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Origin-independent artifact lookup key: `~` followed by a URL path.
///
/// Artifacts are uploaded under names like `~/static/app.js`, meaning "this path on any
/// origin". Two URLs that differ only in scheme or host unify to the same key.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct UnifiedPath(String);

impl UnifiedPath {
    pub const MARKER: &'static str = "~";

    /// Build the key for a raw (not percent-decoded) URL path.
    pub fn from_url_path(path: &str) -> Self {
        Self(format!("{}{}", Self::MARKER, path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The URL path this key was built from.
    pub fn url_path(&self) -> &str {
        &self.0[Self::MARKER.len()..]
    }

    /// Last `/`-separated segment. Empty when the path ends with a slash.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(self.0.as_str())
    }
}

impl fmt::Display for UnifiedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UnifiedPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
