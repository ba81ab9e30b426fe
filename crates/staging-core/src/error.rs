use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Invalid chart file {}: {reason}", .path.display())]
    InvalidChart { path: PathBuf, reason: String },

    #[error("Invalid values file {}: expected '{alias}' node to be a map", .path.display())]
    InvalidValues { path: PathBuf, alias: String },

    #[error("Invalid values file {}: expected '{alias}.components' to be a map", .path.display())]
    InvalidComponents { path: PathBuf, alias: String },

    #[error("invalid repository url '{0}': expected https://github.com/<owner>/<repo>")]
    InvalidRepoUrl(String),

    #[error("missing GitHub token: pass --token or set GITHUB_TOKEN")]
    MissingToken,

    #[error("GitHub API returned {status} for {url}: {message}")]
    GitHub {
        status: u16,
        url: String,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    GlobPattern(#[from] glob::PatternError),

    #[error(transparent)]
    Glob(#[from] glob::GlobError),
}

pub type Result<T> = std::result::Result<T, StagingError>;
