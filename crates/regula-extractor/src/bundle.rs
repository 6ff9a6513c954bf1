//! Loading a case folder's documents

use crate::discovery::has_extension;
use crate::ExtractorError;
use regula_domain::{DocumentBundle, DocumentRole};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Text standing in for a role with no document
pub const MISSING_PLACEHOLDER: &str = "[DOKUMENT NIEDOSTĘPNY]";

/// A bundle together with the text of every role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedBundle {
    /// Located documents
    pub bundle: DocumentBundle,

    /// Text per role, in role order; placeholders for missing or unreadable documents
    pub sections: Vec<(DocumentRole, String)>,
}

impl LoadedBundle {
    /// Role names without a document
    pub fn missing(&self) -> Vec<String> {
        self.bundle.missing()
    }

    /// Text for one role
    pub fn text(&self, role: DocumentRole) -> &str {
        self.sections
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, text)| text.as_str())
            .unwrap_or(MISSING_PLACEHOLDER)
    }
}

/// Locate and read the documents of one case folder
///
/// Only `.txt` files take part in role matching, visited in lexical order.
/// A document that cannot be read is replaced by an error note rather than
/// failing the case.
///
/// # Errors
///
/// Fails when the folder itself cannot be listed.
pub async fn load_bundle(folder: &Path) -> Result<LoadedBundle, ExtractorError> {
    let mut files: Vec<PathBuf> = Vec::new();
    let mut entries = tokio::fs::read_dir(folder)
        .await
        .map_err(|e| ExtractorError::discovery(folder, e))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ExtractorError::discovery(folder, e))?
    {
        let path = entry.path();
        if has_extension(&path, &["txt".to_string()]) {
            files.push(path);
        }
    }
    files.sort();

    let bundle = DocumentBundle::from_files(&files);
    let mut sections = Vec::with_capacity(DocumentRole::ALL.len());
    for (role, path) in bundle.iter() {
        let text = match path {
            None => MISSING_PLACEHOLDER.to_string(),
            Some(path) => match tokio::fs::read_to_string(path).await {
                Ok(text) => text,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Document unreadable");
                    format!("[BŁĄD ODCZYTU: {}]", e)
                }
            },
        };
        sections.push((role, text));
    }

    Ok(LoadedBundle { bundle, sections })
}
