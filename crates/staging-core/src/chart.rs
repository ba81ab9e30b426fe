//! Chart alias resolution.
//!
//! A staging chart wraps the application chart as a dependency named `app`.
//! Helm nests the dependency's values under its alias (or under `app` when no
//! alias is declared), so the alias is the key we look for in `values.yaml`.

use crate::error::{Result, StagingError};
use crate::paths;
use serde::Deserialize;
use std::path::Path;

pub const APP_DEPENDENCY: &str = "app";

#[derive(Debug, Clone, Deserialize)]
pub struct ChartFile {
    #[serde(default)]
    pub dependencies: Vec<ChartDependency>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartDependency {
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
}

impl ChartFile {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let chart: Self = serde_yaml::from_str(&data)?;
        Ok(chart)
    }
}

/// Resolve the values key for the `app` dependency of the chart in `chart_dir`.
pub fn app_alias(chart_dir: &Path) -> Result<String> {
    let path = paths::chart_path(chart_dir);
    let chart = ChartFile::load(&path)?;
    alias_from_chart(&chart, &path)
}

pub fn alias_from_chart(chart: &ChartFile, path: &Path) -> Result<String> {
    let mut apps = chart
        .dependencies
        .iter()
        .filter(|d| d.name == APP_DEPENDENCY);

    let Some(app) = apps.next() else {
        return Err(invalid(path, "no 'app' dependency"));
    };
    if apps.next().is_some() {
        return Err(invalid(path, "multiple 'app' dependencies"));
    }

    Ok(app
        .alias
        .as_deref()
        .filter(|a| !a.is_empty())
        .unwrap_or(APP_DEPENDENCY)
        .to_string())
}

fn invalid(path: &Path, reason: &str) -> StagingError {
    StagingError::InvalidChart {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
