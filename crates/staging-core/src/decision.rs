//! Whether a staging environment may be suspended.
//!
//! A staging is kept while any of its components was deployed from a branch
//! that still exists. `main` and `master` never disappear, so they are not
//! looked up and do not keep a staging alive.

use crate::error::{Result, StagingError};
use crate::github::{BranchCache, BranchSource};
use crate::values::COMPONENTS_KEY;
use serde_yaml::{Mapping, Value};
use std::path::Path;

pub const CODE_REF_KEY: &str = "appCodeRef";
pub const CODE_REPO_KEY: &str = "appCodeRepo";

pub const BRANCH_REF_PREFIX: &str = "refs/heads/";
pub const LONG_LIVED_BRANCHES: &[&str] = &["main", "master"];

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    pub code_ref: Option<String>,
    pub code_repo: Option<String>,
}

/// Component view of an app node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppComponents {
    /// Environment-wide repository, used by components without their own.
    pub code_repo: Option<String>,
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Suspend,
    Keep { reason: String },
}

impl Decision {
    pub fn is_suspend(&self) -> bool {
        matches!(self, Decision::Suspend)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Decision::Suspend => None,
            Decision::Keep { reason } => Some(reason),
        }
    }

    fn keep(reason: String) -> Self {
        Decision::Keep { reason }
    }
}

// ---------------------------------------------------------------------------
// Reading components
// ---------------------------------------------------------------------------

impl AppComponents {
    /// Read `appCodeRepo` and the `components` map from an app node.
    ///
    /// An absent `components` key reads as no components; any other non-map
    /// value is rejected.
    pub fn from_node(node: &Mapping, path: &Path, alias: &str) -> Result<Self> {
        let components = match node.get(COMPONENTS_KEY) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Mapping(map)) => map
                .iter()
                .map(|(name, body)| Component {
                    name: key_name(name),
                    code_ref: non_empty_str(body.get(CODE_REF_KEY)),
                    code_repo: non_empty_str(body.get(CODE_REPO_KEY)),
                })
                .collect(),
            Some(_) => {
                return Err(StagingError::InvalidComponents {
                    path: path.to_path_buf(),
                    alias: alias.to_string(),
                })
            }
        };
        Ok(Self {
            code_repo: non_empty_str(node.get(CODE_REPO_KEY)),
            components,
        })
    }
}

fn key_name(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `refs/heads/feature-x` → `feature-x`; anything else is returned as is.
pub fn branch_name(code_ref: &str) -> &str {
    code_ref.strip_prefix(BRANCH_REF_PREFIX).unwrap_or(code_ref)
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Walk components in declaration order; the first one that keeps the staging
/// alive decides. With no such component the staging is suspended.
pub fn decide(
    app: &AppComponents,
    cache: &mut BranchCache,
    source: &dyn BranchSource,
) -> Result<Decision> {
    for component in &app.components {
        let Some(code_ref) = component.code_ref.as_deref() else {
            return Ok(Decision::keep(format!(
                "No {CODE_REF_KEY} for component {} is defined",
                component.name
            )));
        };

        let Some(repo_url) = component.code_repo.as_deref().or(app.code_repo.as_deref()) else {
            return Ok(Decision::keep(format!(
                "No {CODE_REPO_KEY} for component {} is defined",
                component.name
            )));
        };

        let branch = branch_name(code_ref);
        if LONG_LIVED_BRANCHES.contains(&branch) {
            continue;
        }

        let active = cache.active_branches(source, repo_url)?;
        if active.iter().any(|b| b == branch) {
            return Ok(Decision::keep(format!(
                "Deployed {} component branch {branch} is still active in the app code repository",
                component.name
            )));
        }
    }
    Ok(Decision::Suspend)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
