//! The merged rule database

use regula_domain::{DecisionStatus, ProblemCategory, RiskLevel, StructuredRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Format version written to `_metadata.version`
pub const DATABASE_VERSION: &str = "1.0";

/// A record tagged with its origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedRecord {
    /// Case number from the file name
    #[serde(rename = "_case_id")]
    pub case_id: u64,

    /// File the record was read from
    #[serde(rename = "_source_file")]
    pub source_file: String,

    /// The record itself
    #[serde(flatten)]
    pub record: StructuredRecord,
}

/// Counts over the merged records
///
/// Every enumeration value is present, with zero when no record has it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseStatistics {
    /// Number of records
    pub total: usize,

    /// Records per decision status
    pub by_status: BTreeMap<DecisionStatus, usize>,

    /// Records per problem category
    pub by_category: BTreeMap<ProblemCategory, usize>,

    /// Records per rejection risk
    pub by_risk: BTreeMap<RiskLevel, usize>,
}

impl Default for DatabaseStatistics {
    fn default() -> Self {
        Self {
            total: 0,
            by_status: DecisionStatus::ALL.iter().map(|s| (*s, 0)).collect(),
            by_category: ProblemCategory::ALL.iter().map(|c| (*c, 0)).collect(),
            by_risk: RiskLevel::ALL.iter().map(|r| (*r, 0)).collect(),
        }
    }
}

impl DatabaseStatistics {
    /// Compute statistics over a set of records
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a StructuredRecord>) -> Self {
        let mut stats = Self::default();
        for record in records {
            stats.record(record);
        }
        stats
    }

    fn record(&mut self, record: &StructuredRecord) {
        self.total += 1;
        *self.by_status.entry(record.decision.status).or_insert(0) += 1;
        *self
            .by_category
            .entry(record.expert_rule.problem_category)
            .or_insert(0) += 1;
        *self
            .by_risk
            .entry(record.conclusions_for_bot.rejection_risk)
            .or_insert(0) += 1;
    }

    /// Categories ordered by descending count, ties in enumeration order
    pub fn categories_by_count(&self) -> Vec<(ProblemCategory, usize)> {
        let mut categories: Vec<_> = self.by_category.iter().map(|(c, n)| (*c, *n)).collect();
        categories.sort_by(|a, b| b.1.cmp(&a.1));
        categories
    }
}

/// Database header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    /// Format version
    pub version: String,

    /// Number of records
    pub count: usize,

    /// Case numbers excluded on request
    pub excluded_ids: Vec<u64>,

    /// Summary statistics
    pub statistics: DatabaseStatistics,
}

/// The complete database file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDatabase {
    /// Header
    #[serde(rename = "_metadata")]
    pub metadata: DatabaseMetadata,

    /// Records in ascending case order
    pub records: Vec<TaggedRecord>,
}

impl RuleDatabase {
    /// Assemble a database from tagged records
    pub fn new(records: Vec<TaggedRecord>, excluded_ids: Vec<u64>) -> Self {
        let statistics = DatabaseStatistics::from_records(records.iter().map(|r| &r.record));
        Self {
            metadata: DatabaseMetadata {
                version: DATABASE_VERSION.to_string(),
                count: records.len(),
                excluded_ids,
                statistics,
            },
            records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_statistics_have_every_key() {
        let stats = DatabaseStatistics::default();
        assert_eq!(stats.by_status.len(), 2);
        assert_eq!(stats.by_category.len(), 5);
        assert_eq!(stats.by_risk.len(), 3);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["by_risk"]["MEDIUM"], 0);
        assert_eq!(json["by_status"]["NOT_RECOGNIZED"], 0);
    }

    #[test]
    fn test_categories_by_count() {
        let mut stats = DatabaseStatistics::default();
        stats.by_category.insert(ProblemCategory::Intoxication, 3);
        stats.by_category.insert(ProblemCategory::Suddenness, 1);

        let ordered = stats.categories_by_count();
        assert_eq!(ordered[0], (ProblemCategory::Intoxication, 3));
        assert_eq!(ordered[1], (ProblemCategory::Suddenness, 1));
        assert_eq!(ordered[2], (ProblemCategory::ExternalCause, 0));
    }
}
