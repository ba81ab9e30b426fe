//! Staging discovery and the suspend run.
//!
//! Every `staging-*` chart under the root is handled in turn: resolve the app
//! alias, read its node from `values.yaml`, decide, and write the flag back
//! when the staging can be suspended. Stagings are processed sequentially and
//! share one `BranchCache`.

use crate::chart;
use crate::config::RunOptions;
use crate::decision::{decide, AppComponents, Decision};
use crate::error::Result;
use crate::github::{BranchCache, BranchSource};
use crate::paths;
use crate::values::{is_suspended, with_suspended, ValuesFile};
use serde::Serialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Staging {
    pub name: String,
    pub chart_dir: PathBuf,
}

impl Staging {
    pub fn from_chart_dir(chart_dir: &Path) -> Self {
        Self {
            name: paths::staging_name(chart_dir),
            chart_dir: chart_dir.to_path_buf(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    AlreadySuspended,
    Suspended,
    WouldSuspend,
    Kept { reason: String },
    Failed { error: String },
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::AlreadySuspended => "already suspended",
            Outcome::Suspended => "suspended",
            Outcome::WouldSuspend => "would suspend",
            Outcome::Kept { .. } => "kept",
            Outcome::Failed { .. } => "failed",
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Outcome::Kept { reason } => reason,
            Outcome::Failed { error } => error,
            _ => "",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StagingReport {
    pub name: String,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub stagings: Vec<StagingReport>,
}

impl RunReport {
    pub fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.stagings.iter().filter(|s| pred(&s.outcome)).count()
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }
}

/// Read-only view used by `list`.
#[derive(Debug, Clone, Serialize)]
pub struct StagingSummary {
    pub name: String,
    pub path: PathBuf,
    pub alias: String,
    pub suspended: bool,
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// All chart directories matching `**/staging-*/Chart.yaml` under `root`,
/// in path order. Only regular files count as charts, and wildcards never
/// descend into dot-directories such as `.git/`.
pub fn discover(root: &Path) -> Result<Vec<Staging>> {
    let pattern = paths::staging_chart_pattern(root);
    let options = glob::MatchOptions {
        require_literal_leading_dot: true,
        ..glob::MatchOptions::new()
    };
    let mut stagings = Vec::new();
    for entry in glob::glob_with(&pattern, options)? {
        let chart_file = entry?;
        if !chart_file.is_file() {
            continue;
        }
        if let Some(dir) = chart_file.parent() {
            stagings.push(Staging::from_chart_dir(dir));
        }
    }
    stagings.sort_by(|a, b| a.chart_dir.cmp(&b.chart_dir));
    Ok(stagings)
}

pub fn list(root: &Path) -> Result<Vec<StagingSummary>> {
    discover(root)?
        .into_iter()
        .map(|staging| -> Result<StagingSummary> {
            let alias = chart::app_alias(&staging.chart_dir)?;
            let values = ValuesFile::load(&paths::values_path(&staging.chart_dir))?;
            let suspended = is_suspended(values.app_node(&alias)?);
            Ok(StagingSummary {
                name: staging.name,
                path: staging.chart_dir,
                alias,
                suspended,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Process every staging under `root`.
///
/// The first failure aborts the run unless `options.keep_going` is set, in
/// which case it is recorded as `Outcome::Failed` and the run continues.
pub fn run(root: &Path, source: &dyn BranchSource, options: RunOptions) -> Result<RunReport> {
    let stagings = discover(root)?;
    tracing::info!(
        "found {} staging chart(s) under {}",
        stagings.len(),
        root.display()
    );

    let mut cache = BranchCache::new();
    let mut report = RunReport::default();
    for staging in &stagings {
        match process(staging, &mut cache, source, options) {
            Ok(entry) => report.stagings.push(entry),
            Err(e) if options.keep_going => {
                tracing::error!("{}: {e}", staging.name);
                report.stagings.push(StagingReport {
                    name: staging.name.clone(),
                    path: staging.chart_dir.clone(),
                    alias: None,
                    outcome: Outcome::Failed {
                        error: e.to_string(),
                    },
                });
            }
            Err(e) => return Err(e),
        }
    }
    Ok(report)
}

/// Decide one staging and, when it can go, write `suspended: true`.
pub fn process(
    staging: &Staging,
    cache: &mut BranchCache,
    source: &dyn BranchSource,
    options: RunOptions,
) -> Result<StagingReport> {
    let name = &staging.name;
    let alias = chart::app_alias(&staging.chart_dir)?;
    let mut values = ValuesFile::load(&paths::values_path(&staging.chart_dir))?;
    let node = values.app_node(&alias)?;

    let outcome = if is_suspended(node) {
        tracing::info!("Skipping {name} - already suspended");
        Outcome::AlreadySuspended
    } else {
        let app = AppComponents::from_node(node, &values.path, &alias)?;
        match decide(&app, cache, source)? {
            Decision::Suspend if options.dry_run => {
                tracing::info!("Would suspend {name} (dry run)");
                Outcome::WouldSuspend
            }
            Decision::Suspend => {
                tracing::info!("Suspending {name}");
                let updated = with_suspended(node, true);
                values.set_app_node(&alias, updated)?;
                values.save(&alias)?;
                Outcome::Suspended
            }
            Decision::Keep { reason } => {
                tracing::warn!("Cannot suspend {name} environment. {reason}");
                Outcome::Kept { reason }
            }
        }
    };

    Ok(StagingReport {
        name: name.clone(),
        path: staging.chart_dir.clone(),
        alias: Some(alias),
        outcome,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
