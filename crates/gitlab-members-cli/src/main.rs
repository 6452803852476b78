//! group-members - Declarative GitLab group membership management.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use gitlab_members::{GitLabClient, GroupMembersResource, ProviderConfig};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

/// Keep GitLab group memberships in line with a declaration file
#[derive(Parser, Debug)]
#[command(name = "group-members")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    /// Provider configuration file (token, base_url, insecure, cacert_file).
    /// GITLAB_* environment variables override its values.
    #[arg(long, global = true)]
    provider: Option<PathBuf>,

    /// State file
    #[arg(short, long, default_value = "group-members.state.json", global = true)]
    state: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// Human-readable output
    Pretty,
    /// JSON lines for log aggregation
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the membership changes apply would make
    Plan {
        /// Member declaration file
        #[arg(short, long, default_value = "members.yaml")]
        config: PathBuf,
    },

    /// Reconcile the group against the declaration
    Apply {
        /// Member declaration file
        #[arg(short, long, default_value = "members.yaml")]
        config: PathBuf,
    },

    /// Re-read the tracked group into the state file
    Refresh,

    /// Remove the tracked members (owners are kept) and clear the state
    Destroy,

    /// Start tracking an existing group
    Import {
        /// Group ID or full path
        group_id: String,
    },

    /// Show version information
    Version,
}

fn init_logging(verbose: u8, format: LogFormat) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let registry = tracing_subscriber::registry().with(
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("gitlab_members={log_level},group_members={log_level}").into()),
    );

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Version = cli.command {
        println!(
            "group-members {} (gitlab-members {})",
            env!("CARGO_PKG_VERSION"),
            gitlab_members::VERSION
        );
        return Ok(());
    }

    let provider = ProviderConfig::load(cli.provider.as_deref())
        .context("failed to load provider configuration")?;
    tracing::info!(base_url = %provider.base_url, "Using GitLab instance");

    let resource = GroupMembersResource::new(GitLabClient::new(&provider)?);

    match cli.command {
        Commands::Plan { config } => commands::plan(&resource, &config, &cli.state).await?,
        Commands::Apply { config } => commands::apply(&resource, &config, &cli.state).await?,
        Commands::Refresh => commands::refresh(&resource, &cli.state).await?,
        Commands::Destroy => commands::destroy(&resource, &cli.state).await?,
        Commands::Import { group_id } => {
            commands::import(&resource, &group_id, &cli.state).await?
        }
        Commands::Version => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
