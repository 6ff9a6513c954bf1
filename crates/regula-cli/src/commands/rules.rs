//! Rules command implementation.

use crate::cli::RulesArgs;
use crate::config::RegulaConfig;
use crate::output::{format_duration, Formatter};
use anyhow::{Context, Result};
use regula_extractor::{discover_cases, RuleJob};
use regula_gatekeeper::Gatekeeper;
use regula_llm::GeminiClient;
use regula_pipeline::{Pipeline, TracingSink};
use tracing::info;

/// Execute the rules command.
pub async fn execute_rules(args: RulesArgs, config: &RegulaConfig, formatter: &Formatter) -> Result<()> {
    let mut stage = config.rules.clone();
    args.apply(&mut stage);
    stage.validate().context("Invalid rules settings")?;
    let pattern = stage.compiled_pattern()?;

    let found = discover_cases(
        &stage.input_root,
        &stage.output_root,
        &pattern,
        &stage.file_prefix,
        stage.limit,
    )
    .with_context(|| format!("Cannot scan {}", stage.input_root.display()))?;

    println!(
        "{}",
        formatter.info(&format!(
            "{} case(s) to analyze, {} skipped, {} unreadable",
            found.tasks.len(),
            found.skipped,
            found.unreadable
        ))
    );
    if found.tasks.is_empty() {
        println!("{}", formatter.success("Nothing to do"));
        return Ok(());
    }

    let estimate = stage.estimated_duration(found.tasks.len());
    if !estimate.is_zero() {
        println!(
            "{}",
            formatter.info(&format!("Estimated duration: {}", format_duration(estimate)))
        );
    }

    let gemini_config = config.gemini.client_config(&config.gemini.rules_model)?;
    let gemini = GeminiClient::new(gemini_config)?;
    info!(model = gemini.model(), "Rules client ready");

    let pipeline = Pipeline::new(RuleJob::new(gemini, Gatekeeper::default()), stage.pipeline.clone())?;
    let summary = pipeline
        .run(found.tasks, found.skipped, &mut TracingSink)
        .await;

    println!("{}", formatter.run_summary("Rules", &summary, &stage.output_root));
    Ok(())
}
