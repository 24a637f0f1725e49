//! Configuration loading: YAML file plus environment overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PgDraftError, Result};

/// CSV sampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Rows to sample from the head of the file.
    pub rows: usize,
    /// Expected file encoding.
    pub encoding: String,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            rows: 100,
            encoding: "utf-8".to_string(),
        }
    }
}

/// Column chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum columns per inference chunk.
    pub columns_per_chunk: usize,
    /// Keep related columns together when chunking.
    pub smart: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            columns_per_chunk: 20,
            smart: true,
        }
    }
}

/// LLM provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Provider name (none, anthropic, ollama, mock).
    pub provider: String,
    /// Model identifier.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Retry attempts per chunk.
    pub retry_attempts: u32,
    /// Base retry delay in seconds.
    pub retry_delay_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            timeout_secs: 30,
            retry_attempts: 3,
            retry_delay_secs: 5,
        }
    }
}

/// Database connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub url: String,
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for generated files.
    pub directory: PathBuf,
    /// Generate nothing, just report what would be written.
    pub dry_run: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./output"),
            dry_run: false,
        }
    }
}

/// pgloader performance settings, auto-detected from file size.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub workers: usize,
    pub concurrency: usize,
    pub batch_rows: usize,
    pub prefetch_rows: usize,
    pub work_mem: String,
    pub maintenance_work_mem: String,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            concurrency: 1,
            batch_rows: 25_000,
            prefetch_rows: 100_000,
            work_mem: "256MB".to_string(),
            maintenance_work_mem: "512MB".to_string(),
        }
    }
}

impl PerformanceConfig {
    /// Pick settings appropriate for the input size.
    pub fn auto_detect(file_size_gb: Option<f64>) -> Self {
        match file_size_gb {
            Some(size) if size >= 10.0 => Self {
                workers: 8,
                concurrency: 2,
                batch_rows: 50_000,
                prefetch_rows: 200_000,
                work_mem: "512MB".to_string(),
                maintenance_work_mem: "1GB".to_string(),
            },
            Some(size) if size < 0.5 => Self {
                workers: 2,
                batch_rows: 10_000,
                prefetch_rows: 50_000,
                ..Default::default()
            },
            _ => Self::default(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftConfig {
    pub sampling: SamplingConfig,
    pub chunking: ChunkingConfig,
    pub llm: LlmSettings,
    pub database: DatabaseConfig,
    pub output: OutputConfig,
}

impl DraftConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| PgDraftError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config: DraftConfig = serde_yaml::from_str(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from the default location (`config/default.yaml` when
    /// present), falling back to defaults; environment variables win.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = config_path
            .map(Path::to_path_buf)
            .or_else(|| {
                let default = PathBuf::from("config/default.yaml");
                default.exists().then_some(default)
            });

        match path {
            Some(p) if p.exists() => Self::from_yaml(p),
            _ => {
                let mut config = Self::default();
                config.apply_env_overrides();
                Ok(config)
            }
        }
    }

    /// Apply `PGDRAFT_*` and `DATABASE_URL` environment overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("PGDRAFT_SAMPLING_ROWS") {
            if let Ok(rows) = v.parse() {
                self.sampling.rows = rows;
            }
        }
        if let Ok(v) = std::env::var("PGDRAFT_CHUNKING_COLUMNS_PER_CHUNK") {
            if let Ok(size) = v.parse() {
                self.chunking.columns_per_chunk = size;
            }
        }
        if let Ok(v) = std::env::var("PGDRAFT_LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Ok(v) = std::env::var("PGDRAFT_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("PGDRAFT_OUTPUT_DIRECTORY") {
            self.output.directory = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("DATABASE_URL") {
            self.database.url = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DraftConfig::default();
        assert_eq!(config.sampling.rows, 100);
        assert_eq!(config.chunking.columns_per_chunk, 20);
        assert!(config.chunking.smart);
        assert_eq!(config.llm.retry_attempts, 3);
        assert_eq!(config.output.directory, PathBuf::from("./output"));
        assert!(!config.output.dry_run);
    }

    #[test]
    fn test_from_yaml() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "sampling:\n  rows: 50\nchunking:\n  columns_per_chunk: 10\n  smart: false\n"
        )
        .unwrap();

        let config = DraftConfig::from_yaml(file.path()).unwrap();
        assert_eq!(config.sampling.rows, 50);
        assert_eq!(config.chunking.columns_per_chunk, 10);
        assert!(!config.chunking.smart);
        // Untouched sections keep defaults.
        assert_eq!(config.llm.timeout_secs, 30);
    }

    #[test]
    fn test_missing_file_errors() {
        assert!(DraftConfig::from_yaml("/nonexistent/config.yaml").is_err());
    }

    #[test]
    fn test_performance_auto_detect() {
        let small = PerformanceConfig::auto_detect(Some(0.1));
        assert_eq!(small.workers, 2);

        let large = PerformanceConfig::auto_detect(Some(20.0));
        assert_eq!(large.workers, 8);
        assert_eq!(large.concurrency, 2);

        let unknown = PerformanceConfig::auto_detect(None);
        assert_eq!(unknown.workers, 4);
    }
}
