//! rowmap CLI
//!
//! Runs mapping files over JSON Lines input.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod jsonl;

/// rowmap - declarative row-to-row data mapping
#[derive(Parser)]
#[command(name = "rowmap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Mapping file path
    #[arg(short, long, global = true, default_value = "rowmap.yaml")]
    mapping: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter mapping file and sample input
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Check that every transformer in the mapping builds
    Validate,

    /// Print the output keys of a transformer
    Fields {
        /// Transformer name
        transformer: String,
    },

    /// Transform a JSON Lines file
    Run {
        /// Transformer to apply; runs the combine section when omitted
        #[arg(short, long)]
        transformer: Option<String>,

        /// Input file (JSON Lines)
        #[arg(short, long)]
        input: String,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout carries data, so logs go to stderr
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Init { path } => {
            commands::init::run(&path).await?;
        }
        Commands::Validate => {
            commands::validate::run(&cli.mapping).await?;
        }
        Commands::Fields { transformer } => {
            commands::fields::run(&cli.mapping, &transformer).await?;
        }
        Commands::Run {
            transformer,
            input,
            output,
        } => {
            commands::run::run(
                &cli.mapping,
                transformer.as_deref(),
                &input,
                output.as_deref(),
            )
            .await?;
        }
    }

    Ok(())
}
