mod compose;
mod config;
mod discovery;
mod docker;
mod env;
mod error;
mod rank;
mod scanner;
mod synth;
mod validate;
mod variant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use discovery::{DiscoverOptions, DiscoveredFile};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use validate::Severity;

#[derive(Parser)]
#[command(name = "compose-scout")]
#[command(
    version,
    about = "Discover docker compose files, rank them and keep a project config in sync"
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct ScanOpts {
    /// Directory to scan (defaults to the current directory)
    path: Option<PathBuf>,

    /// Maximum traversal depth below the scan root
    #[arg(long, default_value_t = scanner::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Additional directory names to skip
    #[arg(long = "exclude", value_name = "DIR")]
    excludes: Vec<String>,

    /// Abandon the scan after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover and rank compose files under a directory
    Scan {
        #[command(flatten)]
        opts: ScanOpts,

        /// Emit the ranked candidates as JSON
        #[arg(long)]
        json: bool,
    },

    /// Synthesize or refresh the project configuration from the best candidate
    Sync {
        #[command(flatten)]
        opts: ScanOpts,
    },

    /// Report structural problems in a compose file (best candidate when no file given)
    Validate {
        /// Compose file to check
        file: Option<PathBuf>,

        /// Emit findings as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the persisted project configuration
    Config {
        /// Project root (defaults to the current directory)
        path: Option<PathBuf>,
    },

    /// Start the stack (compose up -d)
    Up {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        extra: Vec<String>,
    },

    /// Stop the stack (compose down)
    Down {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        extra: Vec<String>,
    },

    /// Show stack status (compose ps)
    Ps {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        extra: Vec<String>,
    },

    /// Follow stack logs (compose logs)
    Logs {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        extra: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    match cli.command {
        Commands::Scan { opts, json } => {
            let root = resolve_root(opts.path.clone())?;
            env::load_env(&root);
            let files = discovery::discover(&root, &discover_options(&opts)).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&files)?);
            } else {
                render_candidates(&files);
            }
        }

        Commands::Sync { opts } => {
            let root = resolve_root(opts.path.clone())?;
            env::load_env(&root);
            let files = discovery::discover(&root, &discover_options(&opts)).await?;
            let winning = files.into_iter().next().context("no candidate to sync from")?;

            let synthesizer = synth::Synthesizer::new(config::config_path(&root));
            let project = synthesizer.refresh(&winning, &root).await?;

            let detected = project.services.values().filter(|s| s.detected).count();
            println!(
                "synced '{}' from {} ({} service(s), {} detected)",
                project.project_name,
                winning.relative_path.display(),
                project.services.len(),
                detected
            );
            println!("invocation: {}", project.compose_invocation);
        }

        Commands::Validate { file, json } => {
            let target = match file {
                Some(file) => file,
                None => {
                    let root = resolve_root(None)?;
                    env::load_env(&root);
                    let files = discovery::discover(&root, &DiscoverOptions::default()).await?;
                    files[0].path.clone()
                }
            };

            let findings = validate::validate(&target);
            if json {
                println!("{}", serde_json::to_string_pretty(&findings)?);
            } else if findings.is_empty() {
                println!("{}: no problems found", target.display());
            } else {
                for finding in &findings {
                    let severity = match finding.severity {
                        Severity::Error => "error",
                        Severity::Warning => "warning",
                    };
                    match &finding.service {
                        Some(service) => println!(
                            "{severity:7} {:20} [{}] {}",
                            finding.code.as_str(),
                            service,
                            finding.message
                        ),
                        None => println!(
                            "{severity:7} {:20} {}",
                            finding.code.as_str(),
                            finding.message
                        ),
                    }
                }
            }

            if findings.iter().any(|f| f.severity == Severity::Error) {
                std::process::exit(1);
            }
        }

        Commands::Config { path } => {
            let root = resolve_root(path)?;
            match config::load(&config::config_path(&root))? {
                Some(project) => println!("{}", serde_json::to_string_pretty(&project)?),
                None => println!(
                    "no configuration at {}; run `compose-scout sync` first",
                    config::config_path(&root).display()
                ),
            }
        }

        Commands::Up { extra } => passthrough("up", &["-d"], extra).await?,
        Commands::Down { extra } => passthrough("down", &[], extra).await?,
        Commands::Ps { extra } => passthrough("ps", &[], extra).await?,
        Commands::Logs { extra } => passthrough("logs", &[], extra).await?,
    }

    Ok(())
}

fn resolve_root(path: Option<PathBuf>) -> Result<PathBuf> {
    let root = match path {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    root.canonicalize()
        .with_context(|| format!("cannot access {}", root.display()))
}

fn discover_options(opts: &ScanOpts) -> DiscoverOptions {
    DiscoverOptions {
        max_depth: opts.max_depth,
        excludes: opts.excludes.clone(),
        timeout: opts.timeout_secs.map(Duration::from_secs),
    }
}

fn render_candidates(files: &[DiscoveredFile]) {
    println!(
        "{:>8}  {:5}  {:12}  {:8}  {:>9}  {:16}  PATH",
        "SCORE", "DEPTH", "ENV", "SERVICES", "SIZE", "MODIFIED"
    );
    for file in files {
        let environment = file
            .environment
            .map(|e| e.as_str())
            .unwrap_or("-");
        let modified = file
            .modified_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let note = match &file.parse_error {
            Some(error) => format!("  ({error})"),
            None => String::new(),
        };
        println!(
            "{:>8}  {:5}  {:12}  {:8}  {:>9}  {:16}  {}{}",
            file.priority_score,
            file.depth,
            environment,
            file.service_count,
            file.size_bytes,
            modified,
            file.relative_path.display(),
            note
        );
    }
}

/// Thin dispatch to the external compose tool; everything after the
/// subcommand is forwarded verbatim.
async fn passthrough(subcommand: &str, defaults: &[&str], extra: Vec<String>) -> Result<()> {
    let root = resolve_root(None)?;
    let project = config::load(&config::config_path(&root))?
        .context("no project configuration found; run `compose-scout sync` first")?;

    let mut args = vec![subcommand.to_string()];
    args.extend(defaults.iter().map(|s| s.to_string()));
    args.extend(extra);

    let code = docker::run_passthrough(&root, &project.compose_invocation, &args).await?;
    std::process::exit(code);
}
