//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod check;
mod extract;
mod process;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::load_settings;

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "Invoice text extraction and structuring service")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the invoice processing API
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default: from config, else 127.0.0.1:8000)
        bind: Option<String>,
    },

    /// Extract text from a document and print it
    Extract {
        /// PDF, PNG, JPEG or DOCX file
        file: PathBuf,
    },

    /// Extract and structure an invoice, printing the result
    Process {
        /// PDF, PNG, JPEG or DOCX file
        file: PathBuf,
        /// Print the model's output without interpreting it
        #[arg(long)]
        raw: bool,
    },

    /// Check OCR tools and model credentials
    Check,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| settings.bind.clone());
            serve::cmd_serve(&settings, &bind).await
        }
        Commands::Extract { file } => extract::cmd_extract(&settings, &file).await,
        Commands::Process { file, raw } => process::cmd_process(&settings, &file, raw).await,
        Commands::Check => check::cmd_check(&settings).await,
    }
}
