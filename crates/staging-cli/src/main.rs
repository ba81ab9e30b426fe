mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::suspend::SuspendArgs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "suspend-stagings",
    about = "Suspend staging environments whose deployed branches no longer exist",
    version,
    propagate_version = true
)]
struct Cli {
    /// Directory to scan for staging charts (default: auto-detect from .git/)
    #[arg(long, global = true, env = "STAGING_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mark every staging whose branches are gone as suspended
    Suspend(SuspendArgs),

    /// List staging charts with their app alias and suspended state
    List,

    /// Print the values key of the app dependency of a chart
    Alias {
        /// Chart directory containing Chart.yaml
        chart_dir: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Suspend(args) => cmd::suspend::run(&root, args, cli.json),
        Commands::List => cmd::list::run(&root, cli.json),
        Commands::Alias { chart_dir } => cmd::alias::run(&chart_dir, cli.json),
    };

    if let Err(e) = result {
        if output::in_github_actions() {
            output::workflow_command("error", &format!("suspend-stagings failed: {e:#}"));
        }
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
