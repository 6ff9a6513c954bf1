//! Output formatting for the CLI.

use colored::*;
use regula_pipeline::RunSummary;
use regula_store::AggregateReport;
use std::path::Path;
use std::time::Duration;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Failures listed individually after a run.
const MAX_LISTED_FAILURES: usize = 20;

/// Output formatter.
pub struct Formatter {
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(color_enabled: bool) -> Self {
        Self { color_enabled }
    }

    /// Summary of a finished stage run.
    pub fn run_summary(&self, stage: &str, summary: &RunSummary, output_root: &Path) -> String {
        let counters = &summary.counters;
        let mut builder = Builder::default();
        row(&mut builder, stage, "");
        row(&mut builder, "Processed", counters.processed);
        row(&mut builder, "Skipped", counters.skipped);
        row(&mut builder, "Errors", counters.errors);
        row(&mut builder, "Elapsed", format_duration(summary.elapsed));
        row(&mut builder, "Output", output_root.display());

        let mut out = table(builder);

        if !summary.failures.is_empty() {
            out.push('\n');
            for failure in summary.failures.iter().take(MAX_LISTED_FAILURES) {
                let reason = failure.error.as_deref().unwrap_or("unknown error");
                out.push_str(&self.error(&format!("{}: {}", failure.task_id, first_line(reason))));
                out.push('\n');
            }
            let hidden = summary.failures.len().saturating_sub(MAX_LISTED_FAILURES);
            if hidden > 0 {
                out.push_str(&self.warning(&format!("... and {} more", hidden)));
                out.push('\n');
            }
        }

        let line = if counters.errors == 0 {
            self.success(&format!("{} finished", stage))
        } else {
            self.warning(&format!("{} finished with {} error(s)", stage, counters.errors))
        };
        out.push('\n');
        out.push_str(&line);
        out
    }

    /// Summary and statistics of a merge.
    pub fn merge_report(&self, report: &AggregateReport) -> String {
        let mut summary = Builder::default();
        row(&mut summary, "Merge", "");
        row(&mut summary, "Loaded", report.loaded.len());
        row(&mut summary, "Excluded", join_ids(&report.excluded));
        row(&mut summary, "Errors", report.errors.len());
        row(&mut summary, "Output", report.output.display());

        let stats = &report.statistics;
        let mut status = Builder::default();
        row(&mut status, "Status", "Count");
        for (value, count) in &stats.by_status {
            row(&mut status, value.as_str(), count);
        }

        let mut category = Builder::default();
        row(&mut category, "Category", "Count");
        for (value, count) in stats.categories_by_count() {
            row(&mut category, value.as_str(), count);
        }

        let mut risk = Builder::default();
        row(&mut risk, "Rejection risk", "Count");
        for (value, count) in &stats.by_risk {
            row(&mut risk, value.as_str(), count);
        }

        let mut out = [table(summary), table(status), table(category), table(risk)].join("\n");
        out.push('\n');
        for failure in &report.errors {
            out.push_str(&self.error(&format!(
                "{}: {}",
                failure.file,
                first_line(&failure.message)
            )));
            out.push('\n');
        }
        out.push_str(&self.success(&format!(
            "Rule database written with {} record(s)",
            stats.total
        )));
        out
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn row(builder: &mut Builder, key: &str, value: impl ToString) {
    builder.push_record([key.to_string(), value.to_string()]);
}

fn table(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

fn join_ids(ids: &[u64]) -> String {
    if ids.is_empty() {
        return "none".to_string();
    }
    ids.iter().map(u64::to_string).collect::<Vec<_>>().join(", ")
}

/// Human-readable duration, e.g. `1h 02m 05s`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h {:02}m {:02}s", h, m, s)
    } else if m > 0 {
        format!("{}m {:02}s", m, s)
    } else if secs > 0 {
        format!("{}s", s)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regula_domain::{ExtractionResult, ProblemCategory};
    use regula_pipeline::Counters;
    use regula_store::{DatabaseStatistics, LoadFailure};
    use std::path::PathBuf;

    fn summary(errors: usize) -> RunSummary {
        let mut counters = Counters::new(2);
        let mut failures = Vec::new();
        counters.record(&ExtractionResult::success("a.pdf", 1));
        for i in 0..errors {
            let failure = ExtractionResult::failure(format!("f{}.pdf", i), "Failed after 3 attempts: 429\nbody", 3);
            counters.record(&failure);
            failures.push(failure);
        }
        RunSummary {
            counters,
            dispatched: 1 + errors,
            elapsed: Duration::from_millis(1500),
            failures,
        }
    }

    #[test]
    fn test_run_summary_table() {
        let formatter = Formatter::new(false);
        let output = formatter.run_summary("OCR", &summary(0), Path::new("./wyniki_tekst"));
        assert!(output.contains("Processed"));
        assert!(output.contains("./wyniki_tekst"));
        assert!(output.ends_with("✓ OCR finished"));
    }

    #[test]
    fn test_run_summary_lists_failures() {
        let formatter = Formatter::new(false);
        let output = formatter.run_summary("Rules", &summary(25), Path::new("./reguly"));
        assert!(output.contains("✗ f0.pdf: Failed after 3 attempts: 429\n"));
        assert!(!output.contains("body"));
        assert!(output.contains("... and 5 more"));
        assert!(output.contains("finished with 25 error(s)"));
    }

    #[test]
    fn test_merge_report_sorts_categories() {
        let mut statistics = DatabaseStatistics::default();
        statistics.total = 3;
        statistics.by_category.insert(ProblemCategory::Other, 1);
        statistics.by_category.insert(ProblemCategory::Intoxication, 2);
        let report = AggregateReport {
            loaded: vec![1, 2, 3],
            excluded: vec![4],
            errors: vec![LoadFailure {
                case_id: 5,
                file: "regula_wypadek_5.json".to_string(),
                message: "Invalid JSON: eof".to_string(),
            }],
            statistics,
            output: PathBuf::from("db.json"),
        };

        let output = Formatter::new(false).merge_report(&report);
        let intoxication = output.find("INTOXICATION").unwrap();
        let other = output.find("OTHER").unwrap();
        let external = output.find("EXTERNAL_CAUSE").unwrap();
        assert!(intoxication < other && other < external);
        assert!(output.contains("✗ regula_wypadek_5.json: Invalid JSON: eof"));
        assert!(output.ends_with("with 3 record(s)"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_secs(5)), "5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 05s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 02m 05s");
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.info("test"), "ℹ test");
    }
}
