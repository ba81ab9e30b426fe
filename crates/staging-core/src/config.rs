use crate::error::{Result, StagingError};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Pause after every branch listing call, to stay clear of secondary rate limits.
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 2000;

/// GitHub Actions exposes `with: token:` to the process under this name.
pub const ACTIONS_TOKEN_ENV: &str = "INPUT_TOKEN";

// ---------------------------------------------------------------------------
// GitHubConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub api_url: String,
    pub token: String,
    pub request_delay: Duration,
}

impl GitHubConfig {
    /// Build a config from the first non-blank token candidate.
    ///
    /// Fails with `MissingToken` before any request is made when none is set.
    pub fn new<I>(tokens: I, api_url: &str, request_delay: Duration) -> Result<Self>
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let token = tokens
            .into_iter()
            .flatten()
            .map(|t| t.trim().to_string())
            .find(|t| !t.is_empty())
            .ok_or(StagingError::MissingToken)?;
        let api_url = match api_url.trim() {
            "" => DEFAULT_API_URL.to_string(),
            url => url.trim_end_matches('/').to_string(),
        };
        Ok(Self {
            api_url,
            token,
            request_delay,
        })
    }
}

// ---------------------------------------------------------------------------
// RunOptions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Decide and report, never write.
    pub dry_run: bool,
    /// Record a failing staging and continue with the next one instead of
    /// aborting the run.
    pub keep_going: bool,
}
