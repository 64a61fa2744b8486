//! Configuration management for Subpulse.
//!
//! This module handles loading and merging configuration from multiple sources,
//! lowest precedence first:
//! - Built-in defaults
//! - Config file (`subpulse.yaml` or `--config`)
//! - `.env` files and environment variables
//! - Command-line flags

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Providers that can be selected with `--provider`.
pub const KNOWN_PROVIDERS: [&str; 3] = ["openai", "openai-compatible", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// LLM provider ("openai", "openai-compatible", "ollama")
    pub provider: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Custom API base URL
    pub endpoint: Option<String>,

    /// API key resolved from `api_key_env`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Organization header value resolved from `organization_env`
    pub organization: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Environment variable holding the organization id
    pub organization_env: String,

    /// Maximum completion tokens per request
    pub max_tokens: u32,

    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,

    /// Seconds one completion request may take before it is abandoned
    pub request_timeout_secs: u64,

    /// Directory holding `<subreddit>_<kind>.zst` archives
    pub data_dir: PathBuf,

    /// Root directory for run artifacts
    pub output_dir: PathBuf,

    /// Directory of prompt overrides (`<id>.yml`)
    pub prompts_dir: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Append-mode run log
    pub log_file: Option<PathBuf>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    pub analysis: AnalysisSettings,

    pub estimation: EstimationSettings,
}

/// Chunking and pacing parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisSettings {
    /// Records per chunk
    pub chunk_size: usize,

    /// Maximum chunks analyzed per archive
    pub max_chunks: usize,

    /// Minimum delay between consecutive chunk requests
    pub request_interval_secs: u64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            chunk_size: 100,
            max_chunks: 5,
            request_interval_secs: 5,
        }
    }
}

impl AnalysisSettings {
    /// Hard cap on records ingested from one archive.
    pub fn ingest_limit(&self) -> usize {
        self.chunk_size.saturating_mul(self.max_chunks)
    }
}

/// Size estimation parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EstimationSettings {
    /// Archives below this size are counted exactly
    pub exact_count_threshold_bytes: u64,

    /// Records read when sampling a large archive
    pub sample_size: u64,

    /// Assumed compressed bytes per record for the heuristic fallback
    pub fallback_bytes_per_item: u64,

    /// Progress log interval during the exact count
    pub count_log_interval: u64,

    /// Progress log interval during ingestion
    pub ingest_log_interval: u64,
}

impl Default for EstimationSettings {
    fn default() -> Self {
        Self {
            exact_count_threshold_bytes: 500 * 1024 * 1024,
            sample_size: 1_000,
            fallback_bytes_per_item: 500,
            count_log_interval: 50_000,
            ingest_log_interval: 10_000,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    analysis: Option<AnalysisSection>,
    estimation: Option<EstimationSection>,
    paths: Option<PathsSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    request_timeout_secs: Option<u64>,
    api_key_env: Option<String>,
    organization_env: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisSection {
    chunk_size: Option<usize>,
    max_chunks: Option<usize>,
    request_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EstimationSection {
    exact_count_threshold_bytes: Option<u64>,
    sample_size: Option<u64>,
    fallback_bytes_per_item: Option<u64>,
    count_log_interval: Option<u64>,
    ingest_log_interval: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PathsSection {
    data_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    prompts_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
    file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            endpoint: None,
            api_key: None,
            organization: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            organization_env: "OPENAI_ORG_ID".to_string(),
            max_tokens: 4000,
            temperature: 0.7,
            request_timeout_secs: 300,
            data_dir: PathBuf::from("."),
            output_dir: PathBuf::from("./output"),
            prompts_dir: None,
            log_level: None,
            log_file: None,
            verbose: false,
            no_color: false,
            analysis: AnalysisSettings::default(),
            estimation: EstimationSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `.env`, the config file and the environment.
    ///
    /// Environment variables:
    /// - `SUBPULSE_CONFIG`: Path to config file
    /// - `SUBPULSE_PROVIDER`: LLM provider
    /// - `SUBPULSE_MODEL`: Model identifier
    /// - `SUBPULSE_ENDPOINT`: API base URL
    /// - `SUBPULSE_DATA_DIR` / `SUBPULSE_OUTPUT_DIR`: Archive and output roots
    /// - `OPENAI_API_KEY` / `OPENAI_ORG_ID` (names configurable)
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use subpulse_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None).expect("Failed to load config");
    /// println!("Model: {}", config.model);
    /// ```
    pub fn load(config_file: Option<PathBuf>) -> AppResult<Self> {
        load_dotenv();

        let mut config = Self::default();

        config.config_file = config_file
            .or_else(|| std::env::var("SUBPULSE_CONFIG").ok().map(PathBuf::from));

        let config_path = match config.config_file {
            Some(ref cf) => {
                if !cf.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        cf
                    )));
                }
                Some(cf.clone())
            }
            None => {
                let local = PathBuf::from("subpulse.yaml");
                local.exists().then_some(local)
            }
        };

        if let Some(path) = config_path {
            config = config.merge_yaml(&path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("SUBPULSE_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("SUBPULSE_MODEL") {
            config.model = model;
        }

        if let Ok(endpoint) = std::env::var("SUBPULSE_ENDPOINT") {
            config.endpoint = Some(endpoint);
        }

        if let Ok(dir) = std::env::var("SUBPULSE_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var("SUBPULSE_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }

        config.api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        config.organization = std::env::var(&config.organization_env)
            .ok()
            .filter(|o| !o.trim().is_empty());

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let file: ConfigFile = serde_yaml::from_str(contents)?;
        let mut result = self.clone();

        if let Some(llm) = file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if llm.endpoint.is_some() {
                result.endpoint = llm.endpoint;
            }
            if let Some(max_tokens) = llm.max_tokens {
                result.max_tokens = max_tokens;
            }
            if let Some(temperature) = llm.temperature {
                result.temperature = temperature;
            }
            if let Some(secs) = llm.request_timeout_secs {
                result.request_timeout_secs = secs;
            }
            if let Some(env) = llm.api_key_env {
                result.api_key_env = env;
            }
            if let Some(env) = llm.organization_env {
                result.organization_env = env;
            }
        }

        if let Some(analysis) = file.analysis {
            if let Some(v) = analysis.chunk_size {
                result.analysis.chunk_size = v;
            }
            if let Some(v) = analysis.max_chunks {
                result.analysis.max_chunks = v;
            }
            if let Some(v) = analysis.request_interval_secs {
                result.analysis.request_interval_secs = v;
            }
        }

        if let Some(est) = file.estimation {
            if let Some(v) = est.exact_count_threshold_bytes {
                result.estimation.exact_count_threshold_bytes = v;
            }
            if let Some(v) = est.sample_size {
                result.estimation.sample_size = v;
            }
            if let Some(v) = est.fallback_bytes_per_item {
                result.estimation.fallback_bytes_per_item = v;
            }
            if let Some(v) = est.count_log_interval {
                result.estimation.count_log_interval = v;
            }
            if let Some(v) = est.ingest_log_interval {
                result.estimation.ingest_log_interval = v;
            }
        }

        if let Some(paths) = file.paths {
            if let Some(dir) = paths.data_dir {
                result.data_dir = dir;
            }
            if let Some(dir) = paths.output_dir {
                result.output_dir = dir;
            }
            if paths.prompts_dir.is_some() {
                result.prompts_dir = paths.prompts_dir;
            }
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if logging.file.is_some() {
                result.log_file = logging.file;
            }
        }

        Ok(result)
    }

    /// Apply global CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        endpoint: Option<String>,
        log_level: Option<String>,
        log_file: Option<PathBuf>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if endpoint.is_some() {
            self.endpoint = endpoint;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if log_file.is_some() {
            self.log_file = log_file;
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Apply per-run CLI overrides for paths and chunking.
    pub fn with_run_overrides(
        mut self,
        data_dir: Option<PathBuf>,
        output_dir: Option<PathBuf>,
        chunk_size: Option<usize>,
        max_chunks: Option<usize>,
    ) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(dir) = output_dir {
            self.output_dir = dir;
        }
        if let Some(n) = chunk_size {
            self.analysis.chunk_size = n;
        }
        if let Some(n) = max_chunks {
            self.analysis.max_chunks = n;
        }
        self
    }

    /// Whether the configured provider needs an API key.
    pub fn provider_requires_key(&self) -> bool {
        self.provider.eq_ignore_ascii_case("openai")
    }

    /// Return the API key, failing fast when the provider needs one.
    ///
    /// This is the only configuration check that aborts a run: it must pass
    /// before any archive is read or any request is sent.
    pub fn require_api_key(&self) -> AppResult<Option<&str>> {
        match self.api_key.as_deref() {
            Some(key) => Ok(Some(key)),
            None if self.provider_requires_key() => Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                self.api_key_env
            ))),
            None => Ok(None),
        }
    }

    /// Timeout applied to every completion request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.to_lowercase();
        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if provider == "openai-compatible" && self.endpoint.is_none() {
            return Err(AppError::Config(
                "Provider openai-compatible requires an endpoint".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "request timeout must be at least 1 second".to_string(),
            ));
        }

        if self.analysis.chunk_size == 0 {
            return Err(AppError::Config("chunk size must be at least 1".to_string()));
        }

        if self.analysis.max_chunks == 0 {
            return Err(AppError::Config("max chunks must be at least 1".to_string()));
        }

        if self.estimation.sample_size == 0 {
            return Err(AppError::Config("sample size must be at least 1".to_string()));
        }

        if self.estimation.fallback_bytes_per_item == 0 {
            return Err(AppError::Config(
                "fallback bytes per item must be at least 1".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::Config(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }

        Ok(())
    }

    /// Output directory of one subreddit's run.
    pub fn subreddit_output_dir(&self, subreddit: &str) -> PathBuf {
        self.output_dir.join(subreddit)
    }
}

/// Load `.env` from the working directory, falling back to its parent.
///
/// Variables already present in the environment are left untouched.
fn load_dotenv() {
    for candidate in [PathBuf::from(".env"), PathBuf::from("../.env")] {
        if candidate.exists() {
            match dotenv::from_path(&candidate) {
                Ok(()) => {
                    tracing::debug!("Loaded environment from {:?}", candidate);
                    return;
                }
                Err(e) => tracing::warn!("Failed to load {:?}: {}", candidate, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_tokens, 4000);
        assert_eq!(config.request_timeout(), Duration::from_secs(300));
        assert_eq!(config.analysis.chunk_size, 100);
        assert_eq!(config.analysis.max_chunks, 5);
        assert_eq!(config.analysis.ingest_limit(), 500);
        assert_eq!(config.estimation.exact_count_threshold_bytes, 524_288_000);
        assert!(!config.verbose);
    }

    #[test]
    fn test_merge_yaml() {
        let yaml = r#"
llm:
  provider: ollama
  model: llama3.2
  maxTokens: 1500
  requestTimeoutSecs: 45
analysis:
  chunkSize: 50
  maxChunks: 15
  requestIntervalSecs: 0
estimation:
  sampleSize: 200
paths:
  outputDir: /tmp/out
logging:
  level: warn
  color: false
"#;
        let config = AppConfig::default().merge_yaml_str(yaml).unwrap();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.max_tokens, 1500);
        assert_eq!(config.request_timeout_secs, 45);
        assert_eq!(config.analysis.chunk_size, 50);
        assert_eq!(config.analysis.max_chunks, 15);
        assert_eq!(config.analysis.request_interval_secs, 0);
        assert_eq!(config.estimation.sample_size, 200);
        assert_eq!(config.estimation.fallback_bytes_per_item, 500);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.log_level, Some("warn".to_string()));
        assert!(config.no_color);
    }

    #[test]
    fn test_merge_yaml_rejects_garbage() {
        assert!(AppConfig::default().merge_yaml_str("llm: [1, 2").is_err());
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(
            Some("ollama".to_string()),
            Some("mistral".to_string()),
            None,
            None,
            None,
            true,
            false,
        );

        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "mistral");
        assert!(config.verbose);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_run_overrides() {
        let config = AppConfig::default().with_run_overrides(
            Some(PathBuf::from("data")),
            None,
            Some(25),
            Some(2),
        );
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.output_dir, PathBuf::from("./output"));
        assert_eq!(config.analysis.ingest_limit(), 50);
    }

    #[test]
    fn test_require_api_key() {
        let mut config = AppConfig::default();
        assert!(matches!(config.require_api_key(), Err(AppError::Config(_))));

        config.api_key = Some("sk-test".to_string());
        assert_eq!(config.require_api_key().unwrap(), Some("sk-test"));

        let mut local = AppConfig::default();
        local.provider = "ollama".to_string();
        assert_eq!(local.require_api_key().unwrap(), None);
    }

    #[test]
    fn test_validate() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.analysis.chunk_size = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.temperature = 3.5;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.provider = "openai-compatible".to_string();
        assert!(config.validate().is_err());
        config.endpoint = Some("http://localhost:8000/v1".to_string());
        assert!(config.validate().is_ok());
    }
}
