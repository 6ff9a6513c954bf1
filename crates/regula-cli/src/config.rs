//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use regula_extractor::{OcrStageConfig, RuleStageConfig, DEFAULT_FILE_PREFIX};
use regula_llm::gemini::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use regula_llm::{GeminiConfig, LlmError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "regula.toml";

/// Complete `regula.toml` contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegulaConfig {
    /// Gemini connection settings
    pub gemini: GeminiSettings,

    /// Transcription stage
    pub ocr: OcrStageConfig,

    /// Rule derivation stage
    pub rules: RuleStageConfig,

    /// Database merge
    pub merge: MergeSettings,
}

/// Gemini connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    /// API endpoint
    pub base_url: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Model transcribing documents
    pub ocr_model: String,

    /// Model deriving rules
    pub rules_model: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            ocr_model: "gemini-2.5-flash".to_string(),
            rules_model: "gemini-2.0-flash-lite".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl GeminiSettings {
    /// Client settings for one model, reading the key from the environment.
    pub fn client_config(&self, model: &str) -> std::result::Result<GeminiConfig, LlmError> {
        Ok(GeminiConfig::from_env(&self.api_key_env, model)?
            .with_base_url(self.base_url.as_str())
            .with_timeout(Duration::from_secs(self.timeout_secs)))
    }
}

/// Database merge settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeSettings {
    /// Folder holding the per-case record files
    pub input_root: PathBuf,

    /// Database file to write
    pub output_file: PathBuf,

    /// Record file name prefix
    pub file_prefix: String,

    /// Case numbers left out of the database
    pub excluded_ids: Vec<u64>,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from("./reguly"),
            output_file: PathBuf::from("./rules_database.json"),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            excluded_ids: Vec::new(),
        }
    }
}

impl RegulaConfig {
    /// Files consulted in order when no path is given explicitly.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("regula").join("config.toml"));
        }
        paths
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise the first existing file from
    /// [`search_paths`](Self::search_paths) is used, falling back to the
    /// defaults. Returns the file that was read, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(CliError::ConfigNotFound(path.to_path_buf()));
            }
            return Ok((Self::from_file(path)?, Some(path.to_path_buf())));
        }
        Self::load_first(&Self::search_paths())
    }

    /// Load the first existing file among `candidates`.
    pub fn load_first(candidates: &[PathBuf]) -> Result<(Self, Option<PathBuf>)> {
        match candidates.iter().find(|p| p.is_file()) {
            Some(path) => Ok((Self::from_file(path)?, Some(path.clone()))),
            None => Ok((Self::default(), None)),
        }
    }

    /// Read and validate one configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate TOML.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        self.ocr
            .validate()
            .map_err(|e| CliError::Config(format!("[ocr] {}", e)))?;
        self.rules
            .validate()
            .map_err(|e| CliError::Config(format!("[rules] {}", e)))?;
        if self.gemini.api_key_env.trim().is_empty() {
            return Err(CliError::Config("[gemini] api_key_env must not be empty".into()));
        }
        if self.gemini.timeout_secs == 0 {
            return Err(CliError::Config("[gemini] timeout_secs must be greater than 0".into()));
        }
        if self.merge.file_prefix.is_empty() {
            return Err(CliError::Config("[merge] file_prefix must not be empty".into()));
        }
        Ok(())
    }

    /// Write the configuration to `path`, refusing to overwrite unless `force`.
    pub fn save(&self, path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(CliError::AlreadyExists(path.to_path_buf()));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}
