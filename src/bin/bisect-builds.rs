//! bisect-builds CLI
//!
//! Usage:
//!   bisect-builds range --good <ref> --bad <ref>   List candidate builds
//!   bisect-builds fetch <commit>                   Download and unpack a build
//!   bisect-builds by-version <version>             Resolve a version to a commit
//!   bisect-builds exec-path <commit>               Print a build's entry point

use anyhow::{Context, Result};
use bisect_builds::builds::BuildDate;
use bisect_builds::{
    Arch, Build, BuildAcquirer, BuildKind, Config, Flavor, HistorySource, Os, Quality, RangeRequest,
    Runtime, output,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bisect-builds")]
#[command(about = "Resolve and fetch Visual Studio Code builds for bisecting regressions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Where the build runs
    #[arg(long, global = true, value_enum, default_value = "desktop")]
    runtime: Runtime,

    /// Release channel
    #[arg(short, long, global = true, value_enum, default_value = "insider")]
    quality: Quality,

    /// Packaging variant
    #[arg(long, global = true, value_enum, default_value = "default")]
    flavor: Flavor,

    /// Target platform (defaults to the host)
    #[arg(long, global = true, value_enum)]
    os: Option<Os>,

    /// Target architecture (defaults to the host)
    #[arg(long, global = true, value_enum)]
    arch: Option<Arch>,

    /// Build cache directory
    #[arg(long, global = true)]
    build_root: Option<PathBuf>,

    /// Directory holding the local history files
    #[arg(long, global = true)]
    history_dir: Option<PathBuf>,

    /// Update service base URL
    #[arg(long, global = true)]
    update_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the candidate builds between a good and a bad reference
    Range {
        /// Known good commit or DD-MM-YYYY date (defaults to the oldest build)
        #[arg(short, long)]
        good: Option<String>,

        /// Known bad commit or DD-MM-YYYY date (defaults to the newest build)
        #[arg(short, long)]
        bad: Option<String>,

        /// Commit to leave out of the range (repeatable)
        #[arg(short = 'x', long)]
        exclude: Vec<String>,

        /// Only consider released builds when discovering remotely
        #[arg(long)]
        released_only: bool,

        /// Query the update service instead of the local history
        #[arg(long)]
        discover: bool,
    },

    /// Download, verify and unpack a build
    Fetch {
        /// Build commit
        commit: String,

        /// Delete a cached copy and download again
        #[arg(short, long)]
        force: bool,
    },

    /// Resolve a product version to a build commit
    ByVersion {
        /// Version such as 1.80 or 1.80.1
        version: String,
    },

    /// Print the entry point of a cached build
    ExecPath {
        /// Build commit
        commit: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let mut kind = BuildKind::new(cli.runtime, cli.quality, cli.flavor);
    kind.os = cli.os;
    kind.arch = cli.arch;

    match cli.command {
        Commands::Range {
            good,
            bad,
            exclude,
            released_only,
            discover,
        } => {
            let request = RangeRequest {
                good,
                bad,
                released_only,
                exclude,
                use_discovery: discover,
            };
            let builds = bisect_builds::resolve_range(&config, &kind, &request)?;

            output::action(&format!(
                "{} candidate {} builds, newest first",
                builds.len(),
                kind.quality
            ));
            for (i, build) in builds.iter().enumerate() {
                output::list_item(i, &build.commit, &annotation(build));
            }
        }

        Commands::Fetch { commit, force } => {
            let build = find_build(&config, &kind, &commit);
            let acquirer = BuildAcquirer::new(&config);

            match acquirer
                .acquire(&build, force)
                .with_context(|| format!("Failed to acquire build {}", commit))?
            {
                Some(dir) => {
                    println!("{}", dir.display());
                    println!("{}", acquirer.executable_path(&build)?.display());
                }
                None => output::skip(&format!("{} has no local artifact", build.short_commit())),
            }
        }

        Commands::ByVersion { version } => {
            let history = HistorySource::new(&config).load(&kind);
            let build = bisect_builds::fetch_build_by_version(&config, &kind, &version, &history)
                .with_context(|| format!("Failed to resolve version {}", version))?;
            println!("{}", build.commit);
        }

        Commands::ExecPath { commit } => {
            let build = find_build(&config, &kind, &commit);
            let acquirer = BuildAcquirer::new(&config);
            if !acquirer.is_cached(&build) {
                let dir = acquirer.build_path(&build);
                anyhow::bail!(
                    "Build {} is not cached at {}. Run `bisect-builds fetch {}` first.",
                    commit,
                    dir.display(),
                    commit
                );
            }
            println!("{}", acquirer.executable_path(&build)?.display());
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(root) = &cli.build_root {
        config.build_root = root.clone();
    }
    if let Some(dir) = &cli.history_dir {
        config.history_dir = dir.clone();
    }
    if let Some(url) = &cli.update_url {
        config = config.with_update_url(url.as_str());
    }
    Ok(config)
}

/// The history entry for `commit`, or a bare build when the history does
/// not know it. Alternate-channel asset URLs only come from the history.
fn find_build(config: &Config, kind: &BuildKind, commit: &str) -> Build {
    HistorySource::new(config)
        .load(kind)
        .into_iter()
        .find(|b| b.commit == commit)
        .unwrap_or_else(|| Build::from_commit(*kind, commit))
}

fn annotation(build: &Build) -> String {
    let date = build
        .date
        .as_ref()
        .and_then(BuildDate::to_datetime)
        .map(|d| d.format("%Y-%m-%d").to_string());
    match (build.version.as_deref(), date) {
        (Some(v), Some(d)) => format!("{} ({})", v, d),
        (Some(v), None) => v.to_owned(),
        (None, Some(d)) => d,
        (None, None) => String::new(),
    }
}
