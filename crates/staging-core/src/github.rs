//! Branch activity lookup against the GitHub REST API.
//!
//! `BranchSource` is the seam: the production `GitHubClient` lists branches
//! over HTTP, tests substitute an in-memory source. `BranchCache` memoizes
//! results per repository URL for one run and is passed explicitly to
//! whoever needs it.

use crate::config::GitHubConfig;
use crate::error::{Result, StagingError};
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

/// Single page only; repositories with more branches are not paged through.
pub const BRANCHES_PER_PAGE: u32 = 100;

const API_VERSION: &str = "2022-11-28";

// ---------------------------------------------------------------------------
// RepoRef
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

static REPO_URL_RE: OnceLock<Regex> = OnceLock::new();

fn repo_url_re() -> &'static Regex {
    REPO_URL_RE.get_or_init(|| {
        Regex::new(
            r"^(?:https?://(?:www\.)?github\.com/|git@github\.com:)([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+?)(?:\.git)?/?$",
        )
        .unwrap()
    })
}

impl RepoRef {
    pub fn parse(url: &str) -> Result<Self> {
        let caps = repo_url_re()
            .captures(url.trim())
            .ok_or_else(|| StagingError::InvalidRepoUrl(url.to_string()))?;
        Ok(Self {
            owner: caps[1].to_string(),
            repo: caps[2].to_string(),
        })
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

// ---------------------------------------------------------------------------
// BranchSource
// ---------------------------------------------------------------------------

pub trait BranchSource {
    /// Names of the branches that currently exist in `repo`.
    fn list_branches(&self, repo: &RepoRef) -> Result<Vec<String>>;
}

#[derive(Debug, Deserialize)]
struct BranchInfo {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

pub struct GitHubClient {
    http: Client,
    api_url: String,
    token: String,
    request_delay: Duration,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("suspend-stagings/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            token: config.token.clone(),
            request_delay: config.request_delay,
        })
    }

    fn branches_url(&self, repo: &RepoRef) -> String {
        format!("{}/repos/{}/{}/branches", self.api_url, repo.owner, repo.repo)
    }
}

impl BranchSource for GitHubClient {
    fn list_branches(&self, repo: &RepoRef) -> Result<Vec<String>> {
        let url = self.branches_url(repo);
        tracing::debug!("listing branches of {repo}");
        let resp = self
            .http
            .get(&url)
            .query(&[("per_page", BRANCHES_PER_PAGE)])
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.message)
                .unwrap_or(body);
            return Err(StagingError::GitHub {
                status: status.as_u16(),
                url,
                message,
            });
        }

        let branches: Vec<BranchInfo> = resp.json()?;
        if !self.request_delay.is_zero() {
            std::thread::sleep(self.request_delay);
        }
        Ok(branches.into_iter().map(|b| b.name).collect())
    }
}

// ---------------------------------------------------------------------------
// BranchCache
// ---------------------------------------------------------------------------

/// Active branches per repository URL, filled on first use and kept for the
/// rest of the run.
#[derive(Debug, Default)]
pub struct BranchCache {
    entries: HashMap<String, Vec<String>>,
}

impl BranchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_branches(
        &mut self,
        source: &dyn BranchSource,
        repo_url: &str,
    ) -> Result<&[String]> {
        if !self.entries.contains_key(repo_url) {
            let repo = RepoRef::parse(repo_url)?;
            let branches = source.list_branches(&repo)?;
            self.entries.insert(repo_url.to_string(), branches);
        } else {
            tracing::debug!("branch cache hit for {repo_url}");
        }
        Ok(self
            .entries
            .get(repo_url)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use mockito::Matcher;
    use std::cell::RefCell;

    /// In-memory source that records every call.
    #[derive(Default)]
    pub(crate) struct FakeBranches {
        pub repos: HashMap<String, Vec<String>>,
        pub calls: RefCell<Vec<String>>,
    }

    impl FakeBranches {
        pub fn with(repo: &str, branches: &[&str]) -> Self {
            let mut fake = Self::default();
            fake.repos.insert(
                repo.to_string(),
                branches.iter().map(|b| b.to_string()).collect(),
            );
            fake
        }

        pub fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl BranchSource for FakeBranches {
        fn list_branches(&self, repo: &RepoRef) -> Result<Vec<String>> {
            let key = repo.to_string();
            self.calls.borrow_mut().push(key.clone());
            Ok(self.repos.get(&key).cloned().unwrap_or_default())
        }
    }

    fn client(url: &str) -> GitHubClient {
        let config =
            GitHubConfig::new([Some("t0ken".to_string())], url, Duration::ZERO).unwrap();
        GitHubClient::new(&config).unwrap()
    }

    #[test]
    fn parses_repo_url_shapes() {
        for url in [
            "https://github.com/acme/shop",
            "https://github.com/acme/shop.git",
            "https://github.com/acme/shop/",
            "http://www.github.com/acme/shop",
            "git@github.com:acme/shop.git",
        ] {
            let repo = RepoRef::parse(url).unwrap_or_else(|_| panic!("expected valid: {url}"));
            assert_eq!(repo.owner, "acme", "{url}");
            assert_eq!(repo.repo, "shop", "{url}");
        }
    }

    #[test]
    fn keeps_dots_inside_repo_names() {
        let repo = RepoRef::parse("https://github.com/acme/shop.web.git").unwrap();
        assert_eq!(repo.to_string(), "acme/shop.web");
    }

    #[test]
    fn rejects_malformed_repo_urls() {
        for url in [
            "",
            "acme/shop",
            "https://gitlab.com/acme/shop",
            "https://github.com/acme",
            "https://github.com/acme/shop/tree/main",
        ] {
            assert!(
                matches!(RepoRef::parse(url), Err(StagingError::InvalidRepoUrl(_))),
                "expected invalid: {url}"
            );
        }
    }

    #[test]
    fn client_lists_single_page_of_branches() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/repos/acme/shop/branches")
            .match_query(Matcher::UrlEncoded("per_page".into(), "100".into()))
            .match_header("authorization", "Bearer t0ken")
            .match_header("accept", "application/vnd.github+json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"name":"main","protected":true},{"name":"feature-x"}]"#)
            .expect(1)
            .create();

        let repo = RepoRef::parse("https://github.com/acme/shop").unwrap();
        let branches = client(&server.url()).list_branches(&repo).unwrap();
        assert_eq!(branches, ["main", "feature-x"]);
        mock.assert();
    }

    #[test]
    fn client_reports_api_errors() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/repos/acme/gone/branches")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .create();

        let repo = RepoRef::parse("https://github.com/acme/gone").unwrap();
        let err = client(&server.url()).list_branches(&repo).unwrap_err();
        match err {
            StagingError::GitHub {
                status, message, ..
            } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn cache_calls_source_once_per_url() {
        let fake = FakeBranches::with("acme/shop", &["main", "feature-x"]);
        let mut cache = BranchCache::new();
        let url = "https://github.com/acme/shop";

        assert_eq!(cache.active_branches(&fake, url).unwrap(), ["main", "feature-x"]);
        assert_eq!(cache.active_branches(&fake, url).unwrap(), ["main", "feature-x"]);
        assert_eq!(fake.call_count(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cache_rejects_malformed_url_without_calling_source() {
        let fake = FakeBranches::default();
        let mut cache = BranchCache::new();
        assert!(cache.active_branches(&fake, "ftp://example.com/x").is_err());
        assert_eq!(fake.call_count(), 0);
        assert!(cache.is_empty());
    }
}
