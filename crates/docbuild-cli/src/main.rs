mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "docbuild",
    about = "Generate a Sandcastle help project and build it with MSBuild",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from docbuild.yaml or .git/)
    #[arg(long, global = true, env = "DOCBUILD_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a docbuild.yaml for this project
    Init {
        /// XML documentation file produced by the compiler
        #[arg(long)]
        metadata: Option<String>,

        /// Compiled assembly the documentation describes
        #[arg(long)]
        assembly: Option<String>,

        /// Build tool executable (bare names are looked up on PATH)
        #[arg(long)]
        tool: Option<PathBuf>,

        /// Overwrite an existing docbuild.yaml
        #[arg(long)]
        force: bool,
    },

    /// Write the help project descriptor without building
    Generate {
        /// Override sources.metadata
        #[arg(long)]
        metadata: Option<String>,

        /// Override sources.assembly
        #[arg(long)]
        assembly: Option<String>,
    },

    /// Generate the descriptor, run the build tool, and open the result
    Build {
        /// Don't open the artifact after the build
        #[arg(long)]
        no_open: bool,
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
        Commands::Build { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init {
            metadata,
            assembly,
            tool,
            force,
        } => cmd::init::run(
            &root,
            cmd::init::InitArgs {
                metadata,
                assembly,
                tool,
                force,
            },
            cli.json,
        ),
        Commands::Generate { metadata, assembly } => {
            cmd::generate::run(&root, metadata, assembly, cli.json)
        }
        Commands::Build { no_open } => cmd::build::run(&root, no_open, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
