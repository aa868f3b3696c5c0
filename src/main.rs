//! # docqa CLI
//!
//! ```bash
//! docqa --config ./docqa.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docqa init` | Create the index database and schema |
//! | `docqa ingest <file>` | Load, chunk, embed, and index a document |
//! | `docqa list` | List indexed chunks |
//! | `docqa ask "<question>"` | Answer a question from the indexed documents |
//! | `docqa serve` | Start the HTTP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docqa::{commands, config, logging, migrate, server};

/// docqa: ask questions about your documents and get answers with sources.
#[derive(Parser)]
#[command(name = "docqa", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./docqa.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the index directory, database, and schema. Idempotent.
    Init,

    /// Ingest a PDF, DOCX, TXT, or Markdown file.
    Ingest {
        /// File to ingest.
        file: PathBuf,
        /// Extra metadata attached to every chunk, as `key=value`.
        #[arg(long = "meta", value_parser = parse_key_val)]
        meta: Vec<(String, String)>,
    },

    /// List indexed chunks in insertion order.
    List {
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Answer a question using the indexed documents.
    Ask {
        question: String,
        /// Number of chunks to retrieve (default: `retrieval.top_k`).
        #[arg(short)]
        k: Option<usize>,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

/// Parse a `key=value` pair for `--meta` arguments.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{}'", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    logging::init(&cfg.logging);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!(
                "Index initialized at {} (collection '{}').",
                cfg.index.db_path().display(),
                cfg.index.collection
            );
        }
        Commands::Ingest { file, meta } => {
            commands::run_ingest(&cfg, &file, meta.into_iter().collect()).await?;
        }
        Commands::List { limit, offset } => {
            commands::run_list(&cfg, limit, offset).await?;
        }
        Commands::Ask { question, k } => {
            commands::run_ask(&cfg, &question, k).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
