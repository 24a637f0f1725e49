//! Generation of the pgloader configuration and import script.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::PerformanceConfig;
use crate::error::{PgDraftError, Result};
use crate::schema::TableSchema;

/// Paths of everything one generation run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub loader_config_path: PathBuf,
    pub import_script_path: PathBuf,
    pub state_file_path: PathBuf,
    pub log_file_path: PathBuf,
}

/// Render the CREATE TABLE statement for a schema.
///
/// The primary key is deliberately absent from the DDL; it is added by
/// the AFTER LOAD step so the bulk load runs without index maintenance.
pub fn render_create_table(schema: &TableSchema) -> String {
    let mut ddl = format!("create table {} (\n", schema.table_name);

    let column_lines: Vec<String> = schema
        .columns
        .iter()
        .map(|col| {
            let mut line = format!("    {} {}", col.name, col.pg_type);
            if !col.nullable {
                line.push_str(" not null");
            }
            for constraint in &col.constraints {
                line.push(' ');
                line.push_str(&constraint.to_lowercase());
            }
            line
        })
        .collect();

    ddl.push_str(&column_lines.join(",\n"));
    ddl.push_str("\n)");
    ddl
}

/// Generate the pgloader configuration file.
pub fn generate_loader_config(
    schema: &TableSchema,
    csv_path: &Path,
    output_dir: &Path,
    database_url: &str,
    delimiter: u8,
    performance: &PerformanceConfig,
    dry_run: bool,
) -> Result<PathBuf> {
    let delimiter = if delimiter == b'\t' {
        "\\t".to_string()
    } else {
        (delimiter as char).to_string()
    };
    let columns = schema.column_names().join(", ");

    let mut config = String::new();
    let _ = writeln!(config, "LOAD CSV");
    let _ = writeln!(config, "     FROM '{}'", csv_path.display());
    let _ = writeln!(config, "     HAVING FIELDS ({columns})");
    let _ = writeln!(config, "     INTO {database_url}");
    let _ = writeln!(config, "     TARGET TABLE {}", schema.table_name);
    let _ = writeln!(config, "     TARGET COLUMNS ({columns})");
    let _ = writeln!(config);
    let _ = writeln!(config, "     WITH skip header = 1,");
    let _ = writeln!(config, "          fields optionally enclosed by '\"',");
    let _ = writeln!(config, "          fields terminated by '{delimiter}',");
    let _ = writeln!(config, "          workers = {},", performance.workers);
    let _ = writeln!(config, "          concurrency = {},", performance.concurrency);
    let _ = writeln!(config, "          batch rows = {},", performance.batch_rows);
    let _ = writeln!(config, "          prefetch rows = {}", performance.prefetch_rows);
    let _ = writeln!(config);
    let _ = writeln!(config, "      SET work_mem to '{}',", performance.work_mem);
    let _ = writeln!(
        config,
        "          maintenance_work_mem to '{}'",
        performance.maintenance_work_mem
    );

    let cast_columns: Vec<_> = schema.columns.iter().filter(|c| c.needs_cast()).collect();
    if !cast_columns.is_empty() {
        let _ = writeln!(config);
        for col in cast_columns {
            if let Some(ref rule) = col.cast_rule {
                let _ = writeln!(
                    config,
                    "     CAST column {}.{} to {} using {}",
                    schema.table_name, col.name, col.pg_type, rule
                );
            }
        }
    }

    let _ = writeln!(config);
    let _ = writeln!(config, "BEFORE LOAD DO");
    let _ = writeln!(
        config,
        "     $$ drop table if exists {}; $$,",
        schema.table_name
    );
    let _ = writeln!(config, "     $$ {}; $$", render_create_table(schema));

    if let Some(ref pk) = schema.primary_key {
        let _ = writeln!(config);
        let _ = writeln!(config, "AFTER LOAD DO");
        let _ = writeln!(
            config,
            "     $$ alter table {} add primary key ({pk}); $$",
            schema.table_name
        );
    }
    let _ = writeln!(config, ";");

    let config_path = output_dir.join(format!("{}.load", schema.table_name));

    if dry_run {
        info!(path = %config_path.display(), "[dry run] would generate pgloader config");
    } else {
        write_file(&config_path, &config)?;
        info!(path = %config_path.display(), "generated pgloader config");
    }

    Ok(config_path)
}

/// Generate the executable bash import script.
pub fn generate_import_script(
    config_path: &Path,
    state_file: &Path,
    log_file: &Path,
    csv_path: &Path,
    table_name: &str,
    output_dir: &Path,
    dry_run: bool,
) -> Result<PathBuf> {
    let script = format!(
        r#"#!/usr/bin/env bash
# Import script for table '{table_name}'
# Generated {date}
#
# Source CSV: {csv}
# State file: {state}

set -euo pipefail

CONFIG_FILE="{config}"
LOG_FILE="{log}"

if ! command -v pgloader >/dev/null 2>&1; then
    echo "error: pgloader is not installed" >&2
    exit 1
fi

echo "Starting import of '{table_name}'..."
pgloader --logfile "$LOG_FILE" "$CONFIG_FILE"

echo "Import complete. Log: $LOG_FILE"
"#,
        table_name = table_name,
        date = Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        csv = csv_path.display(),
        state = state_file.display(),
        config = config_path.display(),
        log = log_file.display(),
    );

    let script_path = output_dir.join(format!("{table_name}_import.sh"));

    if dry_run {
        info!(path = %script_path.display(), "[dry run] would generate import script");
    } else {
        write_file(&script_path, &script)?;
        make_executable(&script_path)?;
        info!(path = %script_path.display(), "generated import script");
    }

    Ok(script_path)
}

/// Generate all artifacts for a schema: config, script, and the state
/// and log paths the script references.
pub fn generate_all(
    schema: &TableSchema,
    csv_path: &Path,
    output_dir: &Path,
    database_url: &str,
    delimiter: u8,
    performance: Option<PerformanceConfig>,
    dry_run: bool,
) -> Result<GenerationResult> {
    info!("generating configuration and scripts");

    if !dry_run {
        std::fs::create_dir_all(output_dir).map_err(|e| PgDraftError::Io {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
    }

    let performance = performance.unwrap_or_else(|| {
        let file_size_gb = std::fs::metadata(csv_path)
            .ok()
            .map(|m| m.len() as f64 / (1024.0 * 1024.0 * 1024.0));
        let detected = PerformanceConfig::auto_detect(file_size_gb);
        info!(
            workers = detected.workers,
            concurrency = detected.concurrency,
            "auto-detected performance config"
        );
        detected
    });

    let loader_config_path = generate_loader_config(
        schema,
        csv_path,
        output_dir,
        database_url,
        delimiter,
        &performance,
        dry_run,
    )?;

    let state_file_path = output_dir.join(format!("{}_state.json", schema.table_name));
    let log_file_path = output_dir.join(format!("{}_import.log", schema.table_name));

    let import_script_path = generate_import_script(
        &loader_config_path,
        &state_file_path,
        &log_file_path,
        csv_path,
        &schema.table_name,
        output_dir,
        dry_run,
    )?;

    if dry_run {
        info!("[dry run] generation complete, no files written");
    } else {
        info!("generation complete");
    }

    Ok(GenerationResult {
        loader_config_path,
        import_script_path,
        state_file_path,
        log_file_path,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).map_err(|e| PgDraftError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(0o755);
    std::fs::set_permissions(path, perms).map_err(|e| PgDraftError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnSchema;
    use tempfile::TempDir;

    fn make_schema() -> TableSchema {
        TableSchema {
            table_name: "startups".to_string(),
            columns: vec![
                ColumnSchema {
                    name: "id".to_string(),
                    pg_type: "integer".to_string(),
                    nullable: false,
                    constraints: vec![],
                    cast_rule: None,
                },
                ColumnSchema {
                    name: "funding_usd".to_string(),
                    pg_type: "numeric".to_string(),
                    nullable: true,
                    constraints: vec![],
                    cast_rule: Some("null if blanks".to_string()),
                },
            ],
            primary_key: Some("id".to_string()),
        }
    }

    #[test]
    fn test_render_create_table() {
        let ddl = render_create_table(&make_schema());
        assert!(ddl.contains("create table startups"));
        assert!(ddl.contains("id integer not null"));
        assert!(ddl.contains("funding_usd numeric"));
        // Primary key is deferred to AFTER LOAD, never inline.
        assert!(!ddl.to_lowercase().contains("primary key"));
    }

    #[test]
    fn test_generate_loader_config() {
        let dir = TempDir::new().unwrap();
        let schema = make_schema();
        let path = generate_loader_config(
            &schema,
            Path::new("/data/startups.csv"),
            dir.path(),
            "postgresql://localhost/db",
            b',',
            &PerformanceConfig::default(),
            false,
        )
        .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("LOAD CSV"));
        assert!(contents.contains("TARGET TABLE startups"));
        assert!(contents.contains("workers = 4"));
        assert!(contents.contains("CAST column startups.funding_usd to numeric using null if blanks"));
        assert!(contents.contains("alter table startups add primary key (id)"));
    }

    #[test]
    fn test_no_after_load_without_primary_key() {
        let dir = TempDir::new().unwrap();
        let mut schema = make_schema();
        schema.primary_key = None;

        let path = generate_loader_config(
            &schema,
            Path::new("/data/startups.csv"),
            dir.path(),
            "postgresql://localhost/db",
            b',',
            &PerformanceConfig::default(),
            false,
        )
        .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("AFTER LOAD"));
    }

    #[test]
    fn test_generate_all() {
        let dir = TempDir::new().unwrap();
        let csv = dir.path().join("startups.csv");
        std::fs::write(&csv, "id,funding_usd\n1,100.0\n").unwrap();

        let result = generate_all(
            &make_schema(),
            &csv,
            dir.path(),
            "postgresql://localhost/db",
            b',',
            None,
            false,
        )
        .unwrap();

        assert!(result.loader_config_path.exists());
        assert!(result.import_script_path.exists());

        let script = std::fs::read_to_string(&result.import_script_path).unwrap();
        assert!(script.starts_with("#!/usr/bin/env bash"));
        assert!(script.contains("pgloader"));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let csv = dir.path().join("startups.csv");
        std::fs::write(&csv, "id\n1\n").unwrap();

        let result = generate_all(
            &make_schema(),
            &csv,
            dir.path(),
            "postgresql://localhost/db",
            b',',
            None,
            true,
        )
        .unwrap();

        assert!(!result.loader_config_path.exists());
        assert!(!result.import_script_path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_script_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let csv = dir.path().join("startups.csv");
        std::fs::write(&csv, "id\n1\n").unwrap();

        let result = generate_all(
            &make_schema(),
            &csv,
            dir.path(),
            "postgresql://localhost/db",
            b',',
            None,
            false,
        )
        .unwrap();

        let mode = std::fs::metadata(&result.import_script_path)
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}
