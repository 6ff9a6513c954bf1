//! Document roles and the per-case bundle of located documents

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The fixed set of documents a case folder may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocumentRole {
    /// Accident card ("karta wypadku")
    IncidentCard,

    /// Legal opinion ("opinia")
    LegalOpinion,

    /// Statement of the injured person ("wyjaśnienia poszkodowanego")
    VictimStatement,

    /// Accident notification ("zawiadomienie o wypadku")
    AccidentNotification,
}

impl DocumentRole {
    /// All roles, in prompt order
    pub const ALL: [DocumentRole; 4] = [
        DocumentRole::IncidentCard,
        DocumentRole::LegalOpinion,
        DocumentRole::VictimStatement,
        DocumentRole::AccidentNotification,
    ];

    /// Role name as recorded in `missing_documents`
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentRole::IncidentCard => "incident_card",
            DocumentRole::LegalOpinion => "legal_opinion",
            DocumentRole::VictimStatement => "victim_statement",
            DocumentRole::AccidentNotification => "accident_notification",
        }
    }

    /// Heading used for this role's section in generation prompts
    pub fn heading(&self) -> &'static str {
        match self {
            DocumentRole::IncidentCard => "KARTA WYPADKU",
            DocumentRole::LegalOpinion => "OPINIA PRAWNA",
            DocumentRole::VictimStatement => "WYJAŚNIENIA POSZKODOWANEGO",
            DocumentRole::AccidentNotification => "ZAWIADOMIENIE O WYPADKU",
        }
    }

    /// Lowercase file-name fragments identifying this role
    pub fn patterns(&self) -> &'static [&'static str] {
        match self {
            DocumentRole::IncidentCard => &["karta wypadku", "karta_wypadku"],
            DocumentRole::LegalOpinion => &["opinia"],
            DocumentRole::VictimStatement => &[
                "wyjaśnień poszkodowanego",
                "wyjaśnienia poszkodowanego",
                "wyjasnienia poszkodowanego",
            ],
            DocumentRole::AccidentNotification => &["zawiadomienie o wypadku", "zawiadomienie_o_wypadku"],
        }
    }

    /// Whether a file name belongs to this role (case-insensitive)
    pub fn matches(&self, file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        self.patterns().iter().any(|p| lower.contains(p))
    }

    /// Parse a role from its recorded name
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.as_str() == s)
    }
}

impl std::fmt::Display for DocumentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Documents located for one case, keyed by role
///
/// Every role is present as a key; absent documents map to `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentBundle {
    documents: BTreeMap<DocumentRole, Option<PathBuf>>,
}

impl DocumentBundle {
    /// Bundle with every role missing
    pub fn empty() -> Self {
        Self {
            documents: DocumentRole::ALL.iter().map(|r| (*r, None)).collect(),
        }
    }

    /// Build a bundle from a list of candidate files.
    ///
    /// Files are considered in the order given; each role takes the first
    /// file whose name matches it.
    pub fn from_files<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut bundle = Self::empty();
        for file in files {
            let path = file.as_ref();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            for role in DocumentRole::ALL {
                if bundle.get(role).is_none() && role.matches(name) {
                    bundle.documents.insert(role, Some(path.to_path_buf()));
                }
            }
        }
        bundle
    }

    /// Path located for a role, if any
    pub fn get(&self, role: DocumentRole) -> Option<&Path> {
        self.documents.get(&role).and_then(|p| p.as_deref())
    }

    /// Iterate over all roles with their optional path
    pub fn iter(&self) -> impl Iterator<Item = (DocumentRole, Option<&Path>)> {
        self.documents.iter().map(|(r, p)| (*r, p.as_deref()))
    }

    /// Names of roles that have no document, in role order
    pub fn missing(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, p)| p.is_none())
            .map(|(r, _)| r.as_str().to_string())
            .collect()
    }

    /// Whether every role has a document
    pub fn is_complete(&self) -> bool {
        self.documents.values().all(Option::is_some)
    }
}

impl Default for DocumentBundle {
    fn default() -> Self {
        Self::empty()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    const NAMES: [&str; 6] = [
        "karta wypadku.txt",
        "opinia.txt",
        "wyjaśnienia poszkodowanego.txt",
        "zawiadomienie o wypadku.txt",
        "notatka.txt",
        "zdjecie.txt",
    ];

    proptest! {
        /// Property: every role is either located or reported missing, never both
        #[test]
        fn test_bundle_partitions_roles(picks in proptest::collection::vec(0..NAMES.len(), 0..10)) {
            let files: Vec<String> = picks.iter().map(|i| format!("/case/{}", NAMES[*i])).collect();
            let bundle = DocumentBundle::from_files(&files);
            let missing = bundle.missing();

            for role in DocumentRole::ALL {
                let located = bundle.get(role).is_some();
                prop_assert_ne!(located, missing.contains(&role.as_str().to_string()));
            }
            prop_assert_eq!(bundle.is_complete(), missing.is_empty());
        }

        /// Property: matching ignores letter case
        #[test]
        fn test_matching_ignores_case(prefix in "[a-z0-9 ]{0,8}", upper in any::<bool>()) {
            for role in DocumentRole::ALL {
                let name = format!("{}{}.txt", prefix, role.patterns()[0]);
                let name = if upper { name.to_uppercase() } else { name };
                prop_assert!(role.matches(&name));
            }
        }
    }
}
