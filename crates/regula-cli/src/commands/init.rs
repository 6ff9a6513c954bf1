//! Init-config command implementation.

use crate::cli::InitConfigArgs;
use crate::config::RegulaConfig;
use crate::output::Formatter;
use anyhow::Result;

/// Execute the init-config command.
pub fn execute_init_config(args: InitConfigArgs, formatter: &Formatter) -> Result<()> {
    RegulaConfig::default().save(&args.path, args.force)?;
    println!(
        "{}",
        formatter.success(&format!("Configuration written to {}", args.path.display()))
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_config_writes_loadable_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("regula.toml");
        let args = InitConfigArgs {
            path: path.clone(),
            force: false,
        };

        execute_init_config(args.clone(), &Formatter::new(false)).unwrap();
        let (config, source) = RegulaConfig::load(Some(&path)).unwrap();
        assert_eq!(config, RegulaConfig::default());
        assert_eq!(source, Some(path));

        assert!(execute_init_config(args, &Formatter::new(false)).is_err());
    }
}
