//! Task discovery for both stages
//!
//! Discovery walks the immediate subfolders of a root in lexical order and
//! turns every input without an existing output into a [`Task`]. Completed
//! work is detected purely by the presence of the output file, so running
//! discovery again after a run yields only what is still missing.

use crate::ExtractorError;
use regex::Regex;
use regula_domain::Task;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Pending work found by one discovery pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Tasks to run, in discovery order
    pub tasks: Vec<Task>,

    /// Work units skipped (output exists, or no inputs)
    pub skipped: usize,

    /// Entries that could not be read
    pub unreadable: usize,
}

impl Discovery {
    fn limit_reached(&self, limit: Option<usize>) -> bool {
        limit.is_some_and(|l| self.tasks.len() >= l)
    }
}

/// Find documents to transcribe
///
/// Every case folder under `input_root` is mirrored under `output_root`. A
/// document `<case>/<name>.<ext>` becomes a task writing
/// `<output_root>/<case>/<name>.txt`.
///
/// # Errors
///
/// Only an unreadable `input_root` is fatal.
pub fn discover_documents(
    input_root: &Path,
    output_root: &Path,
    extensions: &[String],
    limit: Option<usize>,
) -> Result<Discovery, ExtractorError> {
    let mut discovery = Discovery::default();
    if discovery.limit_reached(limit) {
        return Ok(discovery);
    }

    let extensions: Vec<String> = extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    for case_dir in case_folders(input_root, &mut discovery)? {
        let Some(case_name) = case_dir.file_name() else {
            continue;
        };
        let out_dir = output_root.join(case_name);
        if let Err(e) = fs::create_dir_all(&out_dir) {
            warn!(path = %out_dir.display(), error = %e, "Cannot create output folder");
            discovery.unreadable += 1;
            continue;
        }

        let Some(files) = folder_files(&case_dir, &mut discovery) else {
            continue;
        };
        let inputs: Vec<PathBuf> = files
            .into_iter()
            .filter(|f| has_extension(f, &extensions))
            .collect();

        if inputs.is_empty() {
            debug!(folder = %case_dir.display(), "Skipping folder without documents");
            discovery.skipped += 1;
            continue;
        }

        let mut destinations = HashSet::new();
        for input in inputs {
            let (Some(stem), Some(file_name)) = (input.file_stem(), input.file_name()) else {
                continue;
            };
            let mut output_name = stem.to_os_string();
            output_name.push(".txt");
            let destination = out_dir.join(output_name);

            // Each output file has exactly one writer
            if !destinations.insert(destination.clone()) {
                warn!(
                    path = %input.display(),
                    destination = %destination.display(),
                    "Skipping document with the same output as an earlier one"
                );
                discovery.skipped += 1;
                continue;
            }

            if destination.exists() {
                debug!(path = %destination.display(), "Skipping (already exists)");
                discovery.skipped += 1;
                continue;
            }

            let id = file_name.to_string_lossy().into_owned();
            discovery.tasks.push(Task::new(id, input, destination));

            if discovery.limit_reached(limit) {
                info!(limit = ?limit, "Document limit reached");
                return Ok(discovery);
            }
        }
    }

    Ok(discovery)
}

/// Find cases to derive rules for
///
/// A folder under `text_root` whose name yields a case number `n` becomes a
/// task writing `<rules_root>/<prefix><n>.json`. Folders without a number
/// are ignored. `rules_root` is created if absent.
///
/// # Errors
///
/// An unreadable `text_root` or an uncreatable `rules_root` is fatal.
pub fn discover_cases(
    text_root: &Path,
    rules_root: &Path,
    pattern: &Regex,
    prefix: &str,
    limit: Option<usize>,
) -> Result<Discovery, ExtractorError> {
    fs::create_dir_all(rules_root).map_err(|e| ExtractorError::discovery(rules_root, e))?;

    let mut discovery = Discovery::default();
    if discovery.limit_reached(limit) {
        return Ok(discovery);
    }
    let mut seen = HashSet::new();

    for case_dir in case_folders(text_root, &mut discovery)? {
        let folder_name = case_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let Some(number) = case_number(pattern, &folder_name) else {
            debug!(folder = %folder_name, "Ignoring folder without case number");
            continue;
        };

        let Some(files) = folder_files(&case_dir, &mut discovery) else {
            continue;
        };
        if !files.iter().any(|f| has_extension(f, &["txt".to_string()])) {
            debug!(folder = %folder_name, "Skipping folder without text files");
            discovery.skipped += 1;
            continue;
        }

        if !seen.insert(number) {
            warn!(folder = %folder_name, case = number, "Duplicate case number, skipping folder");
            discovery.skipped += 1;
            continue;
        }

        let destination = rules_root.join(format!("{}{}.json", prefix, number));
        if destination.exists() {
            debug!(path = %destination.display(), "Skipping (already exists)");
            discovery.skipped += 1;
            continue;
        }

        discovery
            .tasks
            .push(Task::new(number.to_string(), case_dir, destination));

        if discovery.limit_reached(limit) {
            info!(limit = ?limit, "Case limit reached");
            break;
        }
    }

    Ok(discovery)
}

/// Extract the case number from a folder name
pub fn case_number(pattern: &Regex, folder_name: &str) -> Option<u64> {
    pattern
        .captures(folder_name)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Sorted entries of a directory; unreadable entries are counted and left out
fn sorted_entries(dir: &Path, discovery: &mut Discovery) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        match entry {
            Ok(entry) => entries.push(entry.path()),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Skipping unreadable entry");
                discovery.unreadable += 1;
            }
        }
    }
    entries.sort();
    Ok(entries)
}

fn case_folders(root: &Path, discovery: &mut Discovery) -> Result<Vec<PathBuf>, ExtractorError> {
    let entries = sorted_entries(root, discovery).map_err(|e| ExtractorError::discovery(root, e))?;
    Ok(entries.into_iter().filter(|p| p.is_dir()).collect())
}

fn folder_files(dir: &Path, discovery: &mut Discovery) -> Option<Vec<PathBuf>> {
    match sorted_entries(dir, discovery) {
        Ok(entries) => Some(entries.into_iter().filter(|p| p.is_file()).collect()),
        Err(e) => {
            let err = ExtractorError::discovery(dir, e);
            warn!(error = %err, "Skipping unreadable folder");
            discovery.unreadable += 1;
            None
        }
    }
}

pub(crate) fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
}
