use crate::output::{in_github_actions, print_json, workflow_command, Table};
use anyhow::Context;
use clap::Args;
use staging_core::config::{
    GitHubConfig, RunOptions, ACTIONS_TOKEN_ENV, DEFAULT_API_URL, DEFAULT_REQUEST_DELAY_MS,
};
use staging_core::github::GitHubClient;
use staging_core::staging::{self, Outcome, RunReport};
use std::path::Path;
use std::time::Duration;

#[derive(Args)]
pub struct SuspendArgs {
    /// GitHub token used to list repository branches (falls back to INPUT_TOKEN)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Pause after each branch listing call, in milliseconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_DELAY_MS)]
    delay_ms: u64,

    /// Report what would be suspended without writing values files
    #[arg(long)]
    dry_run: bool,

    /// Continue with the remaining stagings when one fails
    #[arg(long)]
    keep_going: bool,
}

pub fn run(root: &Path, args: SuspendArgs, json: bool) -> anyhow::Result<()> {
    let config = GitHubConfig::new(
        [args.token, std::env::var(ACTIONS_TOKEN_ENV).ok()],
        &args.api_url,
        Duration::from_millis(args.delay_ms),
    )?;
    let client = GitHubClient::new(&config).context("failed to build GitHub client")?;
    let options = RunOptions {
        dry_run: args.dry_run,
        keep_going: args.keep_going,
    };

    let report = staging::run(root, &client, options)?;

    if json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }
    if in_github_actions() {
        for entry in &report.stagings {
            if let Outcome::Kept { reason } = &entry.outcome {
                workflow_command(
                    "warning",
                    &format!("Cannot suspend {} environment. {reason}", entry.name),
                );
            }
        }
    }

    let failed = report.failed();
    if failed > 0 {
        anyhow::bail!("{failed} staging(s) failed to process");
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    if report.stagings.is_empty() {
        println!("No staging charts found.");
        return;
    }
    let mut table = Table::new(&["STAGING", "ALIAS", "RESULT", "DETAIL"]);
    for s in &report.stagings {
        table.row(vec![
            s.name.clone(),
            s.alias.clone().unwrap_or_else(|| "-".to_string()),
            s.outcome.label().to_string(),
            s.outcome.detail().to_string(),
        ]);
    }
    table.print();
}
