//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// pgdraft: AI-assisted CSV to PostgreSQL import pipeline
#[derive(Parser)]
#[command(name = "pgdraft")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Infer a schema for a CSV file and generate import artifacts
    Import {
        /// Path to the CSV file
        #[arg(value_name = "CSV")]
        csv: PathBuf,

        /// Number of rows to sample
        #[arg(short = 'n', long, default_value = "100")]
        sample_rows: usize,

        /// Columns per chunk for LLM processing
        #[arg(short, long, default_value = "20")]
        chunk_size: usize,

        /// PostgreSQL connection URL (default: DATABASE_URL env)
        #[arg(short, long)]
        db_url: Option<String>,

        /// Target table name (default: derived from the CSV filename)
        #[arg(short, long)]
        table_name: Option<String>,

        /// Output directory (default: ./output)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Generate configs without writing files
        #[arg(long)]
        dry_run: bool,

        /// Skip LLM inference, use heuristics only
        #[arg(long)]
        no_llm: bool,

        /// LLM provider to use
        #[arg(long, default_value = "anthropic")]
        llm: LlmProviderChoice,

        /// Model to use (provider-specific)
        #[arg(long)]
        model: Option<String>,

        /// Use fixed-size chunking instead of prefix grouping
        #[arg(long)]
        fixed_chunking: bool,
    },

    /// Validate CSV file structure and properties
    Validate {
        /// Path to the CSV file
        #[arg(value_name = "CSV")]
        csv: PathBuf,

        /// Display sample data
        #[arg(short, long)]
        show_sample: bool,
    },

    /// Inspect a failed or interrupted import state
    Resume {
        /// Path to the state file
        #[arg(value_name = "STATE_FILE")]
        state_file: PathBuf,

        /// Force restart from the beginning
        #[arg(short, long)]
        force: bool,
    },
}

/// LLM provider choice for inference
#[derive(Clone, Debug, Default)]
pub enum LlmProviderChoice {
    /// No LLM - heuristic inference only
    None,
    /// Anthropic Claude API (requires ANTHROPIC_API_KEY)
    #[default]
    Anthropic,
    /// Ollama local models (requires Ollama running)
    Ollama,
    /// Mock provider for testing
    Mock,
}

impl std::str::FromStr for LlmProviderChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(LlmProviderChoice::None),
            "anthropic" | "claude" => Ok(LlmProviderChoice::Anthropic),
            "ollama" | "local" => Ok(LlmProviderChoice::Ollama),
            "mock" | "test" => Ok(LlmProviderChoice::Mock),
            _ => Err(format!(
                "Unknown provider: {}. Use: none, anthropic, ollama, or mock.",
                s
            )),
        }
    }
}

impl std::fmt::Display for LlmProviderChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProviderChoice::None => write!(f, "none"),
            LlmProviderChoice::Anthropic => write!(f, "anthropic"),
            LlmProviderChoice::Ollama => write!(f, "ollama"),
            LlmProviderChoice::Mock => write!(f, "mock"),
        }
    }
}
