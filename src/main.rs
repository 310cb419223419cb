//! # Nyay Saarthi CLI (`saarthi`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `saarthi serve` | Start the HTTP API |
//! | `saarthi extract <file>` | Run the extraction cascade on a file and print the text |
//! | `saarthi compare <file1> <file2>` | Print a unified diff of two documents |
//!
//! ```bash
//! saarthi --config ./config/saarthi.toml serve
//! saarthi extract contract.pdf
//! saarthi compare contract_v1.pdf contract_v2.pdf
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nyay_saarthi::compare::{diff_lines, document_text};
use nyay_saarthi::config::{load_config, Config};
use nyay_saarthi::extract::{default_strategies, extract_pages, DocumentInput};
use nyay_saarthi::models::NormalizedPage;
use nyay_saarthi::normalize::normalize_pages;
use nyay_saarthi::ocr::OllamaVisionOcr;
use nyay_saarthi::server::run_server;

/// Nyay Saarthi — a legal document assistant: upload, ask in simple
/// Hindi, extract clauses, compare versions.
#[derive(Parser)]
#[command(
    name = "saarthi",
    about = "Nyay Saarthi — legal document Q&A, clause extraction, and comparison",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Missing file falls back to built-in defaults.
    #[arg(long, global = true, default_value = "./config/saarthi.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server.
    Serve,

    /// Extract and normalize a document, printing each page.
    ///
    /// Runs the same cascade the server uses on upload, so it is the
    /// quickest way to check what a given PDF or DOCX will yield.
    Extract {
        /// Document to extract.
        file: PathBuf,
    },

    /// Compare two documents and print a unified line diff.
    Compare {
        /// Baseline document.
        first: PathBuf,
        /// Revised document.
        second: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = if cli.config.exists() {
        load_config(&cli.config)?
    } else {
        Config::minimal()
    };

    match cli.command {
        Commands::Serve => run_server(&config).await,
        Commands::Extract { file } => {
            let pages = extract_file(&config, &file).await?;
            for page in pages {
                println!("--- page {} ---", page.number);
                println!("{}", page.text);
            }
            Ok(())
        }
        Commands::Compare { first, second } => {
            let first_pages = extract_file(&config, &first).await?;
            let second_pages = extract_file(&config, &second).await?;
            let lines = diff_lines(
                &first.display().to_string(),
                &document_text(&first_pages),
                &second.display().to_string(),
                &document_text(&second_pages),
            );
            if lines.is_empty() {
                println!("documents are identical");
            } else {
                for line in lines {
                    println!("{}", line);
                }
            }
            Ok(())
        }
    }
}

async fn extract_file(config: &Config, path: &PathBuf) -> Result<Vec<NormalizedPage>> {
    let source = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();
    let strategies = default_strategies(&config.ocr, Arc::new(OllamaVisionOcr::new(&config.ocr)));
    let input = DocumentInput::from_path(path, &source)?;
    let pages = extract_pages(&input, &strategies).await?;
    Ok(normalize_pages(pages)?)
}
