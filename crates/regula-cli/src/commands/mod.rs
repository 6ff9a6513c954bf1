//! Command implementations.

pub mod init;
pub mod merge;
pub mod ocr;
pub mod rules;

pub use self::init::execute_init_config;
pub use self::merge::execute_merge;
pub use self::ocr::execute_ocr;
pub use self::rules::execute_rules;

use crate::cli::Command;
use crate::config::RegulaConfig;
use crate::output::Formatter;
use anyhow::{Context, Result};
use std::path::Path;

/// Run one command.
///
/// init-config never reads a configuration file, so a broken or missing
/// `--config` does not stop it from writing a fresh one.
pub async fn execute(command: Command, config_path: Option<&Path>, formatter: &Formatter) -> Result<()> {
    match command {
        Command::InitConfig(args) => execute_init_config(args, formatter),
        Command::Ocr(args) => execute_ocr(args, &load_config(config_path)?, formatter).await,
        Command::Rules(args) => execute_rules(args, &load_config(config_path)?, formatter).await,
        Command::Merge(args) => execute_merge(args, &load_config(config_path)?, formatter),
    }
}

fn load_config(path: Option<&Path>) -> Result<RegulaConfig> {
    let (config, source) = RegulaConfig::load(path).context("Failed to load configuration")?;
    match &source {
        Some(path) => tracing::debug!(path = %path.display(), "Configuration loaded"),
        None => tracing::debug!("No configuration file found, using defaults"),
    }
    Ok(config)
}
