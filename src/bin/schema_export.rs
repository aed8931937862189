//! Schema Export CLI
//!
//! Prints the Terraform schema tree for a language version, the changes
//! between two versions, or a tree fingerprint.
//!
//! Usage:
//!   schema-export show --version 0.13.0
//!   schema-export diff --from 0.12.0 --to 0.13.0
//!   schema-export fingerprint

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use terraform_schema::{DiffReport, LanguageVersion, SchemaBuilder, SchemaCache, SchemaTree, ToolConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-export")]
#[command(about = "Export the Terraform configuration schema for a language version")]
struct Cli {
    /// Configuration file layered over the default locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the schema tree as JSON
    Show {
        /// Language version (default: from configuration)
        #[arg(short = 'V', long)]
        version: Option<String>,

        /// Only print the block at this dotted path, e.g. terraform.required_providers
        #[arg(short, long)]
        block: Option<String>,
    },

    /// Report the changes between two versions
    Diff {
        #[arg(short, long)]
        from: String,
        #[arg(short, long)]
        to: String,
        /// Any change is incompatible
        #[arg(long)]
        strict: bool,
    },

    /// Print the fingerprint of a version's tree
    Fingerprint {
        #[arg(short = 'V', long)]
        version: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = ToolConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    let cache = SchemaCache::terraform();

    let tree_for = |version: &LanguageVersion| -> Result<Arc<SchemaTree>> {
        if config.cache.enabled {
            Ok(cache.get_or_build(version)?)
        } else {
            Ok(Arc::new(SchemaBuilder::terraform().build(version)?))
        }
    };

    let resolve = |version: Option<String>| -> Result<LanguageVersion> {
        match version {
            Some(v) => Ok(LanguageVersion::parse(&v)?),
            None => Ok(config.default_version()?),
        }
    };

    match cli.command {
        Commands::Show { version, block } => {
            let version = resolve(version)?;
            let tree = tree_for(&version)?;
            info!(version = %version, blocks = tree.blocks.len(), "built schema tree");

            match block {
                Some(path) => {
                    let segments: Vec<&str> = path.split('.').collect();
                    let block = tree
                        .block_at(&segments)
                        .with_context(|| format!("no block at '{}' in {}", path, version))?;
                    print_json(block, cli.compact)?;
                }
                None => print_json(&*tree, cli.compact)?,
            }
        }

        Commands::Diff { from, to, strict } => {
            let old = tree_for(&LanguageVersion::parse(&from)?)?;
            let new = tree_for(&LanguageVersion::parse(&to)?)?;
            let report = DiffReport::compare(&old, &new, strict || config.schema.strict);
            info!(from = %from, to = %to, "{}", report.summary);

            print_json(&report, cli.compact)?;
            if !report.is_compatible {
                std::process::exit(2);
            }
        }

        Commands::Fingerprint { version } => {
            let version = resolve(version)?;
            let fingerprint = tree_for(&version)?.fingerprint()?;
            println!("{}  {}", fingerprint, version);
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", json);
    Ok(())
}
