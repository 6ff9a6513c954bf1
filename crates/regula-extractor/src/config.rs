//! Configuration for the two extraction stages

use crate::ExtractorError;
use regex::Regex;
use regula_pipeline::{PipelineConfig, PipelineOverrides};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default pattern extracting the case number from a folder name
pub const DEFAULT_CASE_PATTERN: &str = r"(?i)\bwypadek\s*(\d+)";

/// Default file name prefix of per-case records
pub const DEFAULT_FILE_PREFIX: &str = "regula_wypadek_";

/// Configuration for the transcription stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrStageConfig {
    /// Folder with one subfolder of scanned documents per case
    pub input_root: PathBuf,

    /// Folder receiving the mirrored `.txt` transcriptions
    pub output_root: PathBuf,

    /// Maximum number of documents per run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Recognized document extensions (case-insensitive, without dot)
    pub extensions: Vec<String>,

    /// Pause between processing-status polls (milliseconds)
    pub poll_interval_ms: u64,

    /// Give up on a document still processing after this long (seconds)
    pub processing_timeout_secs: u64,

    /// Worker pool and retry settings; unset keys keep [`PipelineConfig::ocr`]
    #[serde(deserialize_with = "ocr_pipeline")]
    pub pipeline: PipelineConfig,
}

impl Default for OcrStageConfig {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from("./dane/karty wypadku - zanonimizowane"),
            output_root: PathBuf::from("./wyniki_tekst"),
            limit: Some(200),
            extensions: vec!["pdf".to_string()],
            poll_interval_ms: 2_000,
            processing_timeout_secs: 600,
            pipeline: PipelineConfig::ocr(),
        }
    }
}

impl OcrStageConfig {
    /// Status poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Processing timeout as a Duration
    pub fn processing_timeout(&self) -> Duration {
        Duration::from_secs(self.processing_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExtractorError> {
        if self.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(ExtractorError::Config(
                "at least one document extension is required".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ExtractorError::Config(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.processing_timeout_secs == 0 {
            return Err(ExtractorError::Config(
                "processing_timeout_secs must be greater than 0".to_string(),
            ));
        }
        self.pipeline
            .validate()
            .map_err(|e| ExtractorError::Config(e.to_string()))
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        toml::from_str(toml_str)
            .map_err(|e| ExtractorError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExtractorError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}

/// Configuration for the rule derivation stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleStageConfig {
    /// Folder with one subfolder of `.txt` documents per case
    pub input_root: PathBuf,

    /// Folder receiving one record file per case
    pub output_root: PathBuf,

    /// Regex whose first capture group is the case number
    pub case_pattern: String,

    /// Record file name prefix, followed by the case number and `.json`
    pub file_prefix: String,

    /// Maximum number of cases per run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Worker pool and retry settings; unset keys keep [`PipelineConfig::rules`]
    #[serde(deserialize_with = "rules_pipeline")]
    pub pipeline: PipelineConfig,
}

impl Default for RuleStageConfig {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from("./wyniki_tekst"),
            output_root: PathBuf::from("./reguly"),
            case_pattern: DEFAULT_CASE_PATTERN.to_string(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            limit: None,
            pipeline: PipelineConfig::rules(),
        }
    }
}

impl RuleStageConfig {
    /// Compile the case-number pattern
    pub fn compiled_pattern(&self) -> Result<Regex, ExtractorError> {
        let pattern =
            Regex::new(&self.case_pattern).map_err(|e| ExtractorError::InvalidPattern(e.to_string()))?;
        if pattern.captures_len() < 2 {
            return Err(ExtractorError::InvalidPattern(format!(
                "'{}' has no capture group for the case number",
                self.case_pattern
            )));
        }
        Ok(pattern)
    }

    /// Rough duration of a run over `tasks` cases, from the per-task delay
    pub fn estimated_duration(&self, tasks: usize) -> Duration {
        let workers = self.pipeline.concurrency.max(1) as u32;
        self.pipeline
            .request_delay()
            .saturating_mul(u32::try_from(tasks).unwrap_or(u32::MAX))
            / workers
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExtractorError> {
        self.compiled_pattern()?;
        if self.file_prefix.contains(['/', '\\']) {
            return Err(ExtractorError::Config(
                "file_prefix must not contain path separators".to_string(),
            ));
        }
        self.pipeline
            .validate()
            .map_err(|e| ExtractorError::Config(e.to_string()))
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        toml::from_str(toml_str)
            .map_err(|e| ExtractorError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExtractorError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}

fn ocr_pipeline<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PipelineConfig, D::Error> {
    Ok(PipelineOverrides::deserialize(deserializer)?.over(PipelineConfig::ocr()))
}

fn rules_pipeline<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PipelineConfig, D::Error> {
    Ok(PipelineOverrides::deserialize(deserializer)?.over(PipelineConfig::rules()))
}
