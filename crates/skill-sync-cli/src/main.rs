mod commands;
mod config;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use skill_sync_github::GitHubClient;

use crate::config::SyncConfig;

#[derive(Parser)]
#[command(name = "skill-sync")]
#[command(about = "Mirror skill directories from upstream GitHub repositories")]
struct Cli {
    /// Only sync paths and references that have never been synced
    #[arg(long)]
    new_only: bool,
    /// Report drift against upstream without fetching or writing anything
    #[arg(long)]
    check: bool,
    /// Path to the sync manifest (defaults to skills-sync.json under --root)
    #[arg(long)]
    manifest: Option<PathBuf>,
    /// Repository root that local paths are relative to
    #[arg(long, default_value = ".")]
    root: PathBuf,
    /// Log every request and file write
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let config = SyncConfig::resolve(cli.manifest.as_deref(), &cli.root, cli.new_only, |key| {
        std::env::var(key).ok()
    });

    if config.token.is_none() {
        tracing::debug!("GITHUB_TOKEN not set, using unauthenticated requests");
    }

    let client = GitHubClient::new(config.token.clone(), config.api_base_url.clone());

    let mut out = std::io::stdout().lock();
    let status = if cli.check {
        commands::check::run(&config, &client, &mut out).await?
    } else {
        commands::sync::run(&config, &client, &mut out).await?
    };

    Ok(status.into())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_new_only_and_paths() {
        let cli = Cli::parse_from([
            "skill-sync",
            "--new-only",
            "--manifest",
            "custom.json",
            "--root",
            "repo",
        ]);
        assert!(cli.new_only);
        assert!(!cli.check);
        assert_eq!(cli.manifest, Some(PathBuf::from("custom.json")));
        assert_eq!(cli.root, PathBuf::from("repo"));
    }

    #[test]
    fn defaults_to_full_sync_in_current_directory() {
        let cli = Cli::parse_from(["skill-sync"]);
        assert!(!cli.new_only);
        assert_eq!(cli.root, PathBuf::from("."));
        assert!(cli.manifest.is_none());
    }
}
