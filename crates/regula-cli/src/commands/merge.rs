//! Merge command implementation.

use crate::cli::MergeArgs;
use crate::config::RegulaConfig;
use crate::output::Formatter;
use anyhow::{Context, Result};
use regula_store::Aggregator;
use std::collections::BTreeSet;

/// Execute the merge command.
pub fn execute_merge(args: MergeArgs, config: &RegulaConfig, formatter: &Formatter) -> Result<()> {
    let mut settings = config.merge.clone();
    args.apply(&mut settings);

    let excluded: BTreeSet<u64> = settings.excluded_ids.iter().copied().collect();
    if !excluded.is_empty() {
        println!(
            "{}",
            formatter.info(&format!("Excluding {} case(s)", excluded.len()))
        );
    }

    let report = Aggregator::new(settings.file_prefix.as_str())
        .aggregate(&settings.input_root, &settings.output_file, &excluded)
        .with_context(|| format!("Cannot merge {}", settings.input_root.display()))?;

    println!("{}", formatter.merge_report(&report));
    Ok(())
}
