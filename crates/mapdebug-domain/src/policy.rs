/// Bounds on how much of an artifact's content the reference extractor inspects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanLimits {
    /// Leading lines scanned when the file is longer than `full_scan_max_lines`.
    pub head_lines: usize,
    /// Trailing lines scanned when the file is longer than `full_scan_max_lines`.
    pub tail_lines: usize,
    /// Files with at most this many lines are scanned in full.
    pub full_scan_max_lines: usize,
    /// Size of the window at the end of the last candidate line searched for an embedded
    /// reference.
    pub tail_bytes: usize,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            head_lines: 5,
            tail_lines: 5,
            full_scan_max_lines: 10,
            tail_bytes: 300,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct DiagnoseConfig {
    pub scan: ScanLimits,

    /// Cap on the artifact names carried as evidence. `None` carries all of them.
    pub max_artifact_names: Option<usize>,
}
