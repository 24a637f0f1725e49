//! pgdraft CLI - AI-assisted CSV to PostgreSQL import pipeline.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Import {
            csv,
            sample_rows,
            chunk_size,
            db_url,
            table_name,
            output_dir,
            dry_run,
            no_llm,
            llm,
            model,
            fixed_chunking,
        } => commands::import::run(commands::import::ImportArgs {
            csv,
            sample_rows,
            chunk_size,
            db_url,
            table_name,
            output_dir,
            dry_run,
            no_llm,
            llm,
            model,
            fixed_chunking,
        }),

        Commands::Validate { csv, show_sample } => commands::validate::run(csv, show_sample),

        Commands::Resume { state_file, force } => commands::resume::run(state_file, force),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Install the tracing subscriber; `--verbose` switches to debug.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "pgdraft=debug" } else { "pgdraft=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
