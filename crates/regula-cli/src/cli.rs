//! CLI command definitions and argument parsing.

use crate::config::MergeSettings;
use clap::{Parser, Subcommand};
use regula_extractor::{OcrStageConfig, RuleStageConfig};
use regula_pipeline::PipelineConfig;
use std::path::PathBuf;

/// Regula - Turn scanned accident case files into expert rules.
#[derive(Debug, Parser)]
#[command(name = "regula")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "REGULA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Transcribe scanned documents into text files
    Ocr(OcrArgs),

    /// Derive one expert rule per case from the transcriptions
    Rules(RulesArgs),

    /// Merge the per-case rules into the rule database
    Merge(MergeArgs),

    /// Write a configuration file with the default settings
    InitConfig(InitConfigArgs),
}

/// Pool overrides shared by both stages.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct PoolArgs {
    /// Maximum number of tasks this run
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Number of concurrent workers
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Attempts per task, including the first
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Shared request budget per minute
    #[arg(long)]
    pub requests_per_minute: Option<u32>,
}

impl PoolArgs {
    fn apply(&self, limit: &mut Option<usize>, pipeline: &mut PipelineConfig) {
        if self.limit.is_some() {
            *limit = self.limit;
        }
        if let Some(concurrency) = self.concurrency {
            pipeline.concurrency = concurrency;
        }
        if let Some(attempts) = self.max_attempts {
            pipeline.max_attempts = attempts;
        }
        if self.requests_per_minute.is_some() {
            pipeline.requests_per_minute = self.requests_per_minute;
        }
    }
}

/// Arguments for the ocr command.
#[derive(Debug, Clone, Parser)]
pub struct OcrArgs {
    /// Folder with one subfolder per case
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Folder receiving the transcriptions
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub pool: PoolArgs,
}

impl OcrArgs {
    /// Apply the overrides to the stage configuration.
    pub fn apply(&self, config: &mut OcrStageConfig) {
        if let Some(input) = &self.input {
            config.input_root = input.clone();
        }
        if let Some(output) = &self.output {
            config.output_root = output.clone();
        }
        self.pool.apply(&mut config.limit, &mut config.pipeline);
    }
}

/// Arguments for the rules command.
#[derive(Debug, Clone, Parser)]
pub struct RulesArgs {
    /// Folder with the transcribed case folders
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Folder receiving the rule files
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pause before each task in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    #[command(flatten)]
    pub pool: PoolArgs,
}

impl RulesArgs {
    /// Apply the overrides to the stage configuration.
    pub fn apply(&self, config: &mut RuleStageConfig) {
        if let Some(input) = &self.input {
            config.input_root = input.clone();
        }
        if let Some(output) = &self.output {
            config.output_root = output.clone();
        }
        if let Some(delay) = self.delay_ms {
            config.pipeline.request_delay_ms = delay;
        }
        self.pool.apply(&mut config.limit, &mut config.pipeline);
    }
}

/// Arguments for the merge command.
#[derive(Debug, Clone, Parser)]
pub struct MergeArgs {
    /// Folder holding the rule files
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Database file to write
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Case numbers to leave out, in addition to the configured ones
    #[arg(short, long, value_delimiter = ',')]
    pub exclude: Vec<u64>,
}

impl MergeArgs {
    /// Apply the overrides to the merge settings.
    pub fn apply(&self, settings: &mut MergeSettings) {
        if let Some(input) = &self.input {
            settings.input_root = input.clone();
        }
        if let Some(output) = &self.output {
            settings.output_file = output.clone();
        }
        settings.excluded_ids.extend(&self.exclude);
        settings.excluded_ids.sort_unstable();
        settings.excluded_ids.dedup();
    }
}

/// Arguments for the init-config command.
#[derive(Debug, Clone, Parser)]
pub struct InitConfigArgs {
    /// Where to write the file
    #[arg(default_value = crate::config::LOCAL_CONFIG_FILE)]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_ocr_overrides() {
        let cli = parse(&["regula", "ocr", "--limit", "10", "-j", "5", "--input", "/scans"]);
        let Command::Ocr(args) = cli.command else {
            panic!("expected ocr");
        };

        let mut config = OcrStageConfig::default();
        args.apply(&mut config);
        assert_eq!(config.limit, Some(10));
        assert_eq!(config.pipeline.concurrency, 5);
        assert_eq!(config.input_root, PathBuf::from("/scans"));
        assert_eq!(config.output_root, OcrStageConfig::default().output_root);
    }

    #[test]
    fn test_rules_overrides_keep_unset_values() {
        let cli = parse(&["regula", "rules", "--requests-per-minute", "15"]);
        let Command::Rules(args) = cli.command else {
            panic!("expected rules");
        };

        let mut config = RuleStageConfig::default();
        args.apply(&mut config);
        assert_eq!(config.pipeline.requests_per_minute, Some(15));
        assert_eq!(config.pipeline.request_delay_ms, 5000);
        assert_eq!(config.limit, None);
    }

    #[test]
    fn test_merge_exclusions_are_merged() {
        let cli = parse(&["regula", "merge", "--exclude", "23,5", "-e", "7"]);
        let Command::Merge(args) = cli.command else {
            panic!("expected merge");
        };

        let mut settings = MergeSettings {
            excluded_ids: vec![5, 40],
            ..MergeSettings::default()
        };
        args.apply(&mut settings);
        assert_eq!(settings.excluded_ids, vec![5, 7, 23, 40]);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["regula", "init-config", "-v", "--config", "x.toml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        let Command::InitConfig(args) = cli.command else {
            panic!("expected init-config");
        };
        assert_eq!(args.path, PathBuf::from("regula.toml"));
        assert!(!args.force);
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["regula"]).is_err());
    }
}
