mod cmd;
mod context;
mod output;
mod tools;

use clap::{Parser, Subcommand};
use cmd::{cache::CacheSubcommand, config::ConfigSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fis-chaos",
    about = "Cache AWS FIS capabilities and validate generated experiment templates",
    version,
    propagate_version = true
)]
struct Cli {
    /// Cache directory (default: $XDG_CACHE_HOME/aws-chaos-engineering)
    #[arg(long, global = true, env = "FIS_CHAOS_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Config file (default: <cache-dir>/config.yaml when present)
    #[arg(long, global = true, env = "FIS_CHAOS_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run as an MCP stdio server
    Mcp,

    /// Inspect and manage the capability cache
    Cache {
        #[command(subcommand)]
        subcommand: CacheSubcommand,
    },

    /// Validate an experiment template file against cached capabilities
    Validate {
        /// Template JSON (FIS API or CloudFormation shape)
        file: PathBuf,
        /// Region (default: configured default region)
        #[arg(long)]
        region: Option<String>,
    },

    /// Print the system prompt for drafting experiment templates
    Prompt {
        /// Architecture description
        #[arg(long, conflicts_with = "arch_file", required_unless_present = "arch_file")]
        arch: Option<String>,
        /// Read the architecture description from a file
        #[arg(long, value_name = "FILE")]
        arch_file: Option<PathBuf>,
        /// Region (default: configured default region)
        #[arg(long)]
        region: Option<String>,
    },

    /// Show or validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Mcp => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    // stdout carries MCP responses and command output
    // RUST_LOG, when set, replaces the default level entirely
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = context::resolve(cli.cache_dir.as_deref(), cli.config.as_deref()).and_then(
        |ctx| match cli.command {
            Commands::Mcp => cmd::mcp::run(&ctx.into_tool_context()),
            Commands::Cache { subcommand } => cmd::cache::run(&ctx, subcommand, cli.json),
            Commands::Validate { file, region } => {
                cmd::validate::run(&ctx, &file, region.as_deref(), cli.json)
            }
            Commands::Prompt {
                arch,
                arch_file,
                region,
            } => cmd::prompt::run(
                &ctx,
                arch.as_deref(),
                arch_file.as_deref(),
                region.as_deref(),
                cli.json,
            ),
            Commands::Config { subcommand } => cmd::config::run(&ctx, subcommand, cli.json),
        },
    );

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
