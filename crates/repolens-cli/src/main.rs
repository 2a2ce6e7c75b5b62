//! RepoLens CLI - structural analysis of cloned repositories
//!
//! Thin orchestration over `repolens-core`: walks a repository, builds
//! the import dependency graph, and prints JSON for downstream tooling.
//!
//! # Usage
//!
//! ```bash
//! # Build the dependency graph and print stats
//! repolens analyze ./my-repo
//!
//! # Print the canonical syntax forest for one file
//! repolens parse ./my-repo/src/app.py
//!
//! # Impact of changing a file, with risk assessment
//! repolens impact ./my-repo src/app.py
//!
//! # Circular imports and most-imported ranking
//! repolens cycles ./my-repo
//! repolens rank ./my-repo --limit 10
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use repolens_core::{
    parse_source, Language, RepoAnalyzer, RiskAssessment,
};

/// RepoLens - syntax forests and import dependency graphs
#[derive(Parser, Debug)]
#[command(name = "repolens")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Walk a repository and print dependency-graph statistics
    Analyze {
        /// Repository root
        repo: PathBuf,

        /// Print the full node/edge listing instead of stats
        #[arg(long)]
        full: bool,
    },

    /// Parse one file into its canonical syntax forest
    Parse {
        /// Source file
        file: PathBuf,
    },

    /// Report the blast radius of changing a file
    Impact {
        /// Repository root
        repo: PathBuf,

        /// Repository-relative file path (forward slashes)
        file: String,

        /// Score the change as scoped to a single symbol
        #[arg(long)]
        symbol_scoped: bool,
    },

    /// List circular import chains
    Cycles {
        /// Repository root
        repo: PathBuf,
    },

    /// Rank files by how often they are imported
    Rank {
        /// Repository root
        repo: PathBuf,

        /// Maximum number of files to list
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to initialize logging")?;

    match cli.command {
        Commands::Analyze { repo, full } => {
            let graph = RepoAnalyzer::with_defaults().analyze(&repo)?;
            if full {
                println!("{}", serde_json::to_string_pretty(&graph.export())?);
            } else {
                println!("{}", serde_json::to_string_pretty(&graph.stats())?);
            }
        }

        Commands::Parse { file } => {
            let Some(language) = Language::from_path(&file) else {
                bail!("Unrecognized file type: {}", file.display());
            };
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let name = file.to_string_lossy().replace('\\', "/");
            let forest = parse_source(&content, language, &name);
            println!("{}", serde_json::to_string_pretty(&forest)?);
        }

        Commands::Impact {
            repo,
            file,
            symbol_scoped,
        } => {
            let graph = RepoAnalyzer::with_defaults().analyze(&repo)?;
            let Some(report) = graph.impact(&file) else {
                bail!("File not found in dependency graph: {}", file);
            };
            let has_cycle = graph
                .cycles()
                .iter()
                .any(|cycle| cycle.contains(&file));
            let risk = RiskAssessment::from_impact(&report, has_cycle, symbol_scoped);

            let out = serde_json::json!({
                "impact": report,
                "risk": risk,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }

        Commands::Cycles { repo } => {
            let graph = RepoAnalyzer::with_defaults().analyze(&repo)?;
            println!("{}", serde_json::to_string_pretty(&graph.cycles())?);
        }

        Commands::Rank { repo, limit } => {
            let graph = RepoAnalyzer::with_defaults().analyze(&repo)?;
            let ranked: Vec<_> = graph
                .most_imported(limit)
                .into_iter()
                .map(|(path, in_degree)| {
                    serde_json::json!({ "path": path, "in_degree": in_degree })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&ranked)?);
        }
    }

    Ok(())
}
