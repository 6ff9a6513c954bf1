//! Ocr command implementation.

use crate::cli::OcrArgs;
use crate::config::RegulaConfig;
use crate::output::Formatter;
use anyhow::{Context, Result};
use regula_extractor::{discover_documents, OcrJob};
use regula_llm::{DocumentTextClient, GeminiClient};
use regula_pipeline::{Pipeline, TracingSink};
use tracing::info;

/// Execute the ocr command.
pub async fn execute_ocr(args: OcrArgs, config: &RegulaConfig, formatter: &Formatter) -> Result<()> {
    let mut stage = config.ocr.clone();
    args.apply(&mut stage);
    stage.validate().context("Invalid OCR settings")?;

    let found = discover_documents(
        &stage.input_root,
        &stage.output_root,
        &stage.extensions,
        stage.limit,
    )
    .with_context(|| format!("Cannot scan {}", stage.input_root.display()))?;

    println!(
        "{}",
        formatter.info(&format!(
            "{} document(s) to transcribe, {} already done, {} unreadable",
            found.tasks.len(),
            found.skipped,
            found.unreadable
        ))
    );
    if found.tasks.is_empty() {
        println!("{}", formatter.success("Nothing to do"));
        return Ok(());
    }

    let gemini_config = config.gemini.client_config(&config.gemini.ocr_model)?;
    let gemini = GeminiClient::new(gemini_config)?;
    info!(model = gemini.model(), "Transcription client ready");

    let client = DocumentTextClient::new(gemini)
        .with_poll_interval(stage.poll_interval())
        .with_processing_timeout(stage.processing_timeout());
    let pipeline = Pipeline::new(OcrJob::new(client), stage.pipeline.clone())?;

    let summary = pipeline
        .run(found.tasks, found.skipped, &mut TracingSink)
        .await;

    println!("{}", formatter.run_summary("OCR", &summary, &stage.output_root));
    Ok(())
}
