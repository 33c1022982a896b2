use camino::{Utf8Path, Utf8PathBuf};

/// Manifest stem for artifacts without a distribution. `escape_component` never yields a
/// leading `_`, so no distribution name maps onto it.
pub const NO_DIST_MANIFEST: &str = "_nodist";

/// Name a release version or distribution is stored under.
///
/// Bytes outside `[A-Za-z0-9.-]` become `%XX`, and so do the dots of an all-dot name. The
/// empty name is `%`. Distinct names always get distinct components.
pub fn escape_component(name: &str) -> String {
    if name.is_empty() {
        return "%".to_string();
    }
    let all_dots = name.bytes().all(|b| b == b'.');
    let mut out = String::with_capacity(name.len());
    for b in name.bytes() {
        if (b.is_ascii_alphanumeric() || b == b'-' || b == b'.') && !all_dots {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// A single path component that cannot escape its directory.
pub fn is_safe_component(s: &str) -> bool {
    !s.is_empty() && s != "." && s != ".." && !s.contains(['/', '\\'])
}

/// A relative path made of safe components.
pub fn is_safe_relative(s: &str) -> bool {
    !s.is_empty() && !s.starts_with('/') && s.split('/').all(is_safe_component)
}

/// Paths inside a store directory.
#[derive(Clone, Debug)]
pub struct Layout {
    root: Utf8PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn event(&self, event_id: &str) -> Utf8PathBuf {
        self.root.join("events").join(format!("{event_id}.json"))
    }

    pub fn release_dir(&self, version: &str) -> Utf8PathBuf {
        self.root.join("releases").join(escape_component(version))
    }

    pub fn release(&self, version: &str) -> Utf8PathBuf {
        self.release_dir(version).join("release.json")
    }

    pub fn release_files(&self, version: &str) -> Utf8PathBuf {
        self.release_dir(version).join("files.json")
    }

    pub fn manifests_dir(&self, version: &str) -> Utf8PathBuf {
        self.release_dir(version).join("manifests")
    }

    pub fn manifest(&self, version: &str, dist: Option<&str>) -> Utf8PathBuf {
        let stem = dist.map_or_else(|| NO_DIST_MANIFEST.to_string(), escape_component);
        self.manifests_dir(version).join(format!("{stem}.json"))
    }

    pub fn blob(&self, file_ref: &str) -> Utf8PathBuf {
        self.root.join("blobs").join(file_ref)
    }
}
