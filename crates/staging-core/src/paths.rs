use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// File constants
// ---------------------------------------------------------------------------

pub const CHART_FILE: &str = "Chart.yaml";
pub const VALUES_FILE: &str = "values.yaml";

/// Directory-name prefix that marks a chart as a staging environment.
pub const STAGING_PREFIX: &str = "staging-";

/// Discovery pattern, relative to the scan root.
pub const STAGING_CHART_GLOB: &str = "**/staging-*/Chart.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn chart_path(chart_dir: &Path) -> PathBuf {
    chart_dir.join(CHART_FILE)
}

pub fn values_path(chart_dir: &Path) -> PathBuf {
    chart_dir.join(VALUES_FILE)
}

/// The staging name is the chart directory's own name, e.g. `staging-foo`.
pub fn staging_name(chart_dir: &Path) -> String {
    chart_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| chart_dir.display().to_string())
}

/// Full glob for discovery under `root`. The root itself is escaped so
/// metacharacters in checkout paths are matched literally.
pub fn staging_chart_pattern(root: &Path) -> String {
    let root = glob::Pattern::escape(&root.to_string_lossy());
    if root.is_empty() {
        STAGING_CHART_GLOB.to_string()
    } else if root.ends_with('/') {
        format!("{root}{STAGING_CHART_GLOB}")
    } else {
        format!("{root}/{STAGING_CHART_GLOB}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
