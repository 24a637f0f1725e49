//! Import command - infer a schema and generate import artifacts.

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;

use pgdraft::state::ImportPhase;
use pgdraft::{
    AnthropicProvider, DraftConfig, InferenceConfig, InferenceEngine, MockProvider,
    OllamaProvider, ProviderConfig, SampleConfig, SampleReader, StateManager, TableSchema,
    TypeInferenceProvider, generate_all, sanitize_table_name,
};

use crate::cli::LlmProviderChoice;

pub struct ImportArgs {
    pub csv: PathBuf,
    pub sample_rows: usize,
    pub chunk_size: usize,
    pub db_url: Option<String>,
    pub table_name: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub dry_run: bool,
    pub no_llm: bool,
    pub llm: LlmProviderChoice,
    pub model: Option<String>,
    pub fixed_chunking: bool,
}

pub fn run(args: ImportArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.csv.exists() {
        return Err(format!("File not found: {}", args.csv.display()).into());
    }

    // Load configuration, then let CLI flags win.
    let mut config = DraftConfig::load(None)?;
    config.sampling.rows = args.sample_rows;
    config.chunking.columns_per_chunk = args.chunk_size;
    if args.fixed_chunking {
        config.chunking.smart = false;
    }
    if let Some(dir) = args.output_dir {
        config.output.directory = dir;
    }
    if args.dry_run {
        config.output.dry_run = true;
    }

    let db_url = match args.db_url.or_else(|| {
        (!config.database.url.is_empty()).then(|| config.database.url.clone())
    }) {
        Some(url) => url,
        None => {
            return Err(
                "Database URL not provided. Use --db-url or set DATABASE_URL.".into(),
            );
        }
    };

    let table_name = args.table_name.unwrap_or_else(|| {
        let stem = args
            .csv
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "table".to_string());
        sanitize_table_name(&stem)
    });

    println!();
    println!("{}", "pgdraft import".bold());
    println!();
    println!("CSV File:   {}", args.csv.display().to_string().cyan());
    println!("Table Name: {}", table_name.cyan());
    println!(
        "Output Dir: {}",
        config.output.directory.display().to_string().cyan()
    );
    if config.output.dry_run {
        println!("{}", "Mode: DRY RUN".yellow());
    }
    println!();

    // Track progress in a resumable state file.
    let state_file = config
        .output
        .directory
        .join(format!("{table_name}_state.json"));
    let state_manager = StateManager::new(&state_file);
    let mut state = state_manager.create_initial_state(&args.csv, &table_name)?;

    let mut run_import = || -> Result<_, Box<dyn std::error::Error>> {
        // Step 1: sample.
        let reader = SampleReader::with_config(SampleConfig {
            delimiter: None,
            max_rows: config.sampling.rows,
            quote: b'"',
        });
        let sample = reader.sample_file(&args.csv)?;
        state_manager.mark_phase_complete(&mut state, ImportPhase::Sampled)?;
        println!(
            "{} Sampled {} rows, {} columns",
            "✓".green(),
            sample.sample_size,
            sample.headers.len()
        );

        // Step 2: infer.
        state_manager.mark_phase_complete(&mut state, ImportPhase::Inferring)?;
        let engine_config = InferenceConfig {
            chunk_size: config.chunking.columns_per_chunk,
            smart_chunking: config.chunking.smart,
            use_fallback: true,
        };

        let provider = if args.no_llm {
            None
        } else {
            build_provider(&args.llm, args.model.as_deref(), &config)?
        };

        let mut engine = InferenceEngine::with_config(engine_config);
        let schema = match provider {
            Some(provider) => {
                engine = engine.with_provider(provider);
                let runtime = tokio::runtime::Runtime::new()?;
                runtime.block_on(engine.infer(&sample))?
            }
            None => {
                println!(
                    "{} No LLM provider, using heuristic inference",
                    "→".yellow()
                );
                engine.infer_heuristic(&sample)?
            }
        };
        state_manager.mark_phase_complete(&mut state, ImportPhase::Inferred)?;
        println!(
            "{} Inferred types for {} columns",
            "✓".green(),
            schema.columns.len()
        );
        if schema.columns.len() != sample.headers.len() {
            println!(
                "{} Schema has {} of {} source columns",
                "!".yellow(),
                schema.columns.len(),
                sample.headers.len()
            );
        }

        // Step 3: generate.
        let result = generate_all(
            &schema,
            &args.csv,
            &config.output.directory,
            &db_url,
            sample.properties.delimiter,
            None,
            config.output.dry_run,
        )?;
        state_manager.mark_phase_complete(&mut state, ImportPhase::Generated)?;
        println!("{} Generated configuration files", "✓".green());

        Ok((schema, result))
    };

    let (schema, result) = match run_import() {
        Ok(out) => out,
        Err(e) => {
            state_manager.mark_failed(&mut state, e.to_string())?;
            return Err(e);
        }
    };

    print_schema(&schema);

    println!();
    println!("{}", "Generated Files:".bold());
    println!();
    println!(
        "  pgloader config: {}",
        result.loader_config_path.display().to_string().cyan()
    );
    println!(
        "  import script:   {}",
        result.import_script_path.display().to_string().cyan()
    );
    println!(
        "  state file:      {}",
        result.state_file_path.display().to_string().cyan()
    );

    println!();
    if config.output.dry_run {
        println!("{}", "Dry run complete. No files were written.".yellow());
    } else {
        println!("{}", "Next Steps:".bold());
        println!();
        println!("  1. Review the generated files");
        println!("  2. Verify the database connection URL");
        println!(
            "  3. Run the import: {}",
            format!("bash {}", result.import_script_path.display()).cyan()
        );
        println!();
        println!("{}", "✓ Import preparation complete".green());
    }
    println!();

    Ok(())
}

/// Build the configured provider, or None when inference is heuristic-only.
fn build_provider(
    choice: &LlmProviderChoice,
    model: Option<&str>,
    config: &DraftConfig,
) -> Result<Option<Arc<dyn TypeInferenceProvider>>, Box<dyn std::error::Error>> {
    let provider_config = ProviderConfig {
        model: model.unwrap_or(&config.llm.model).to_string(),
        timeout_secs: config.llm.timeout_secs,
        retry_attempts: config.llm.retry_attempts,
        retry_delay_secs: config.llm.retry_delay_secs,
        ..Default::default()
    };

    match choice {
        LlmProviderChoice::None => Ok(None),
        LlmProviderChoice::Anthropic => match std::env::var("ANTHROPIC_API_KEY") {
            Ok(key) => Ok(Some(Arc::new(AnthropicProvider::with_config(
                key,
                provider_config,
            )?))),
            Err(_) => {
                println!(
                    "{} ANTHROPIC_API_KEY not set, falling back to heuristics",
                    "!".yellow()
                );
                Ok(None)
            }
        },
        LlmProviderChoice::Ollama => Ok(Some(Arc::new(OllamaProvider::with_config(
            provider_config,
        )?))),
        LlmProviderChoice::Mock => Ok(Some(Arc::new(MockProvider::new()))),
    }
}

fn print_schema(schema: &TableSchema) {
    println!();
    println!("{}", "Inferred Schema:".bold());
    println!();
    println!(
        "  {:<24} {:<16} {:<8} {}",
        "Column".bold(),
        "Type".bold(),
        "Null".bold(),
        "Constraints".bold()
    );
    for col in &schema.columns {
        let marker = if schema.primary_key.as_deref() == Some(&col.name) {
            " (pk)"
        } else {
            ""
        };
        println!(
            "  {:<24} {:<16} {:<8} {}{}",
            col.name,
            col.pg_type,
            if col.nullable { "yes" } else { "no" },
            if col.constraints.is_empty() {
                "-".to_string()
            } else {
                col.constraints.join(", ")
            },
            marker.magenta(),
        );
    }
}
