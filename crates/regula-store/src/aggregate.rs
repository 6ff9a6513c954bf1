//! Merging per-case records into the database file

use crate::{DatabaseStatistics, RuleDatabase, StoreError, TaggedRecord};
use regula_gatekeeper::Gatekeeper;
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// Default record file name prefix
pub const DEFAULT_PREFIX: &str = "regula_wypadek_";

/// A record file that could not be merged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    /// Case number from the file name
    pub case_id: u64,

    /// File name
    pub file: String,

    /// Why it was rejected
    pub message: String,
}

/// What an aggregation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateReport {
    /// Case numbers merged, ascending
    pub loaded: Vec<u64>,

    /// Case numbers present but excluded on request
    pub excluded: Vec<u64>,

    /// Files that were unreadable or invalid
    pub errors: Vec<LoadFailure>,

    /// Statistics written to the database
    pub statistics: DatabaseStatistics,

    /// Database file written
    pub output: PathBuf,
}

/// Merges record files named `<prefix><n>.json`
#[derive(Debug, Clone)]
pub struct Aggregator {
    prefix: String,
    gatekeeper: Gatekeeper,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl Aggregator {
    /// Create an aggregator for files with the given prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            gatekeeper: Gatekeeper::default(),
        }
    }

    /// Replace the Gatekeeper checking each file
    pub fn with_gatekeeper(mut self, gatekeeper: Gatekeeper) -> Self {
        self.gatekeeper = gatekeeper;
        self
    }

    /// Case number of a record file name, if it follows the naming scheme
    ///
    /// The number is plain ASCII digits without a leading zero, so each case
    /// has exactly one file name.
    pub fn case_id(&self, file_name: &str) -> Option<u64> {
        let digits = file_name.strip_prefix(&self.prefix)?.strip_suffix(".json")?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if digits.len() > 1 && digits.starts_with('0') {
            return None;
        }
        digits.parse().ok()
    }

    /// Merge every record in `folder` into `output`
    ///
    /// Bad files are reported and left out; they never abort the merge.
    ///
    /// # Errors
    ///
    /// `NoRecords` when nothing could be merged (no file is written), `Io`
    /// when the folder cannot be listed or the output cannot be written.
    pub fn aggregate(
        &self,
        folder: &Path,
        output: &Path,
        excluded_ids: &BTreeSet<u64>,
    ) -> Result<AggregateReport, StoreError> {
        let mut files = self.record_files(folder)?;
        files.sort_by_key(|(id, _)| *id);

        let mut records = Vec::new();
        let mut loaded = Vec::new();
        let mut excluded = Vec::new();
        let mut errors = Vec::new();

        for (case_id, path) in files {
            let file = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            if excluded_ids.contains(&case_id) {
                info!(case_id, "Skipping excluded case");
                excluded.push(case_id);
                continue;
            }

            match self.load(&path) {
                Ok(record) => {
                    loaded.push(case_id);
                    records.push(TaggedRecord {
                        case_id,
                        source_file: file,
                        record,
                    });
                }
                Err(message) => {
                    warn!(case_id, file = %file, error = %message, "Skipping invalid record");
                    errors.push(LoadFailure {
                        case_id,
                        file,
                        message,
                    });
                }
            }
        }

        if records.is_empty() {
            return Err(StoreError::NoRecords);
        }

        let database = RuleDatabase::new(records, excluded_ids.iter().copied().collect());
        let statistics = database.metadata.statistics.clone();
        write_database(output, &database)?;

        info!(
            loaded = loaded.len(),
            excluded = excluded.len(),
            errors = errors.len(),
            output = %output.display(),
            "Rule database written"
        );

        Ok(AggregateReport {
            loaded,
            excluded,
            errors,
            statistics,
            output: output.to_path_buf(),
        })
    }

    fn record_files(&self, folder: &Path) -> Result<Vec<(u64, PathBuf)>, StoreError> {
        let entries = fs::read_dir(folder).map_err(|source| StoreError::Io {
            path: folder.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!(folder = %folder.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match self.case_id(&name) {
                Some(id) => files.push((id, path)),
                None => warn!(file = %name, "Ignoring file that is not a case record"),
            }
        }
        Ok(files)
    }

    fn load(&self, path: &Path) -> Result<regula_domain::StructuredRecord, String> {
        let text = fs::read_to_string(path).map_err(|e| format!("Read error: {}", e))?;
        self.gatekeeper.parse(&text).map_err(|e| e.to_string())
    }
}

/// Merge with the default prefix
///
/// See [`Aggregator::aggregate`].
pub fn aggregate(
    folder: &Path,
    output: &Path,
    excluded_ids: &BTreeSet<u64>,
) -> Result<AggregateReport, StoreError> {
    Aggregator::default().aggregate(folder, output, excluded_ids)
}

fn write_database(output: &Path, database: &RuleDatabase) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(database)?;
    let io_error = |source| StoreError::Io {
        path: output.to_path_buf(),
        source,
    };

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
    file.write_all(json.as_bytes()).map_err(io_error)?;
    file.write_all(b"\n").map_err(io_error)?;
    file.as_file().sync_all().map_err(io_error)?;
    file.persist(output).map_err(|e| io_error(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_id_from_file_name() {
        let aggregator = Aggregator::default();
        assert_eq!(aggregator.case_id("regula_wypadek_12.json"), Some(12));
        assert_eq!(aggregator.case_id("regula_wypadek_x.json"), None);
        assert_eq!(aggregator.case_id("regula_wypadek_12.json.bak"), None);
        assert_eq!(aggregator.case_id("rules_database.json"), None);
    }

    #[test]
    fn test_case_id_has_one_spelling() {
        let aggregator = Aggregator::default();
        assert_eq!(aggregator.case_id("regula_wypadek_0.json"), Some(0));
        assert_eq!(aggregator.case_id("regula_wypadek_70.json"), Some(70));
        assert_eq!(aggregator.case_id("regula_wypadek_007.json"), None);
        assert_eq!(aggregator.case_id("regula_wypadek_+7.json"), None);
        assert_eq!(aggregator.case_id("regula_wypadek_.json"), None);
        assert_eq!(aggregator.case_id("regula_wypadek_ 7.json"), None);
    }

    #[test]
    fn test_custom_prefix() {
        let aggregator = Aggregator::new("case_");
        assert_eq!(aggregator.case_id("case_3.json"), Some(3));
        assert_eq!(aggregator.case_id("regula_wypadek_3.json"), None);
    }
}
