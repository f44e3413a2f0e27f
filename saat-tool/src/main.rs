//! Saat Tool - CLI for building and searching score-at-a-time indexes
//!
//! # Commands
//!
//! - `build` - build an index from a JSONL corpus
//! - `search` - run queries against an index and emit a TREC run
//! - `info` - display index statistics
//!
//! # Examples
//!
//! ## Build an index from a JSONL corpus
//! ```bash
//! saat-tool build -i ./my_index -d corpus.jsonl --codec vbyte
//! ```
//!
//! ## Run queries and save the TREC run
//! ```bash
//! saat-tool search -i ./my_index -q topics.txt -k 10 --strategy 2d_heap -o run.txt
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod build;
mod search;

#[derive(Parser)]
#[command(name = "saat-tool")]
#[command(version, about = "CLI for score-at-a-time index building and search")]
#[command(after_help = "Use 'saat-tool <command> --help' for more information.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index from a JSONL corpus ({"id": ..., "content": ...})
    Build {
        /// Path to the index directory
        #[arg(short, long)]
        index: PathBuf,

        /// Path to the JSONL corpus (omit if using --stdin)
        #[arg(short, long, required_unless_present = "stdin")]
        documents: Option<PathBuf>,

        /// Read the corpus from stdin instead of a file
        #[arg(long, default_value = "false")]
        stdin: bool,

        /// Posting codec: none, vbyte, block_packed
        #[arg(short, long, default_value = "vbyte")]
        codec: String,

        /// Cap per-term impacts at this value
        #[arg(long, default_value = "255")]
        max_impact: u32,

        /// Log progress every N documents (0 to disable)
        #[arg(short, long, default_value = "100000")]
        progress: usize,
    },

    /// Run queries against an index and emit a TREC run
    Search {
        /// Path to the index directory
        #[arg(short, long)]
        index: PathBuf,

        /// Query file, one `topic_id query text` per line (omit for stdin)
        #[arg(short, long)]
        queries: Option<PathBuf>,

        /// Accumulator strategy: 2d_heap, 1d_heap, simple, blockmax
        #[arg(short, long, default_value = "2d_heap")]
        strategy: String,

        /// Results per query, in [1, 1000]
        #[arg(short = 'k', long, default_value = "10")]
        top_k: usize,

        /// Accumulator page shift (0 derives it from the collection size)
        #[arg(short = 'w', long, default_value = "0")]
        width: u32,

        /// Top-k lower bound; 1 disables early exit, anything larger is
        /// an oracle score that arms it
        #[arg(short, long, default_value = "1")]
        lower_bound: u32,

        /// Run name for the TREC output
        #[arg(short, long, default_value = "saat")]
        run_name: String,

        /// Append (ID:doc->rsv) debug suffixes to each result row
        #[arg(long, default_value = "false")]
        include_internal_ids: bool,

        /// Write the run here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show index statistics
    Info {
        /// Path to the index directory
        #[arg(short, long)]
        index: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("saat_tool=info".parse()?)
                .add_directive("saat_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            index,
            documents,
            stdin,
            codec,
            max_impact,
            progress,
        } => {
            build::build_index(&index, documents.as_deref(), stdin, &codec, max_impact, progress)?;
        }
        Commands::Search {
            index,
            queries,
            strategy,
            top_k,
            width,
            lower_bound,
            run_name,
            include_internal_ids,
            output,
        } => {
            search::run_queries(&search::SearchArgs {
                index,
                queries,
                strategy,
                top_k,
                width,
                lower_bound,
                run_name,
                include_internal_ids,
                output,
            })?;
        }
        Commands::Info { index } => {
            let index = saat_core::InvertedIndex::open(&index)?;
            println!("documents: {}", index.documents());
            println!("terms:     {}", index.vocabulary().len());
            println!("codec:     {}", index.codec().map(|c| c.name()).unwrap_or("?"));
        }
    }

    Ok(())
}
