//! StructuredRecord - the expert rule derived for one accident case
//!
//! Field names are the persisted JSON names. Enum values serialize in
//! SCREAMING_SNAKE_CASE and are closed sets; anything outside them is a
//! validation failure, never coerced.

use serde::{Deserialize, Serialize};

/// Event metadata. Free text; "unknown" sentinels are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMeta {
    /// Date of the event (YYYY-MM-DD or a sentinel)
    pub event_date: String,

    /// Time of the event (HH:MM or a sentinel)
    pub event_time: String,

    /// Where the event happened
    pub location: String,

    /// Injury as described in the medical documentation
    pub injury: String,
}

/// Outcome of the case as decided by the insurer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionStatus {
    /// Recognized as a work accident
    Recognized,

    /// Not recognized as a work accident
    NotRecognized,
}

impl DecisionStatus {
    /// All values of the enumeration
    pub const ALL: [DecisionStatus; 2] = [DecisionStatus::Recognized, DecisionStatus::NotRecognized];

    /// Get the wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionStatus::Recognized => "RECOGNIZED",
            DecisionStatus::NotRecognized => "NOT_RECOGNIZED",
        }
    }

    /// Parse an exact wire name
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s)
    }
}

/// Decision analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Recognized or not
    pub status: DecisionStatus,

    /// Why the claim was rejected ("BRAK" when recognized)
    pub rejection_reason: String,

    /// Verbatim quote from the legal opinion supporting the decision
    pub legal_basis_quote: String,
}

/// Legal problem a case turns on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemCategory {
    /// External cause of the injury
    ExternalCause,

    /// Suddenness of the event
    Suddenness,

    /// Connection between the event and work
    WorkConnection,

    /// Intoxication of the injured person
    Intoxication,

    /// Anything else
    Other,
}

impl ProblemCategory {
    /// All values of the enumeration
    pub const ALL: [ProblemCategory; 5] = [
        ProblemCategory::ExternalCause,
        ProblemCategory::Suddenness,
        ProblemCategory::WorkConnection,
        ProblemCategory::Intoxication,
        ProblemCategory::Other,
    ];

    /// Get the wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemCategory::ExternalCause => "EXTERNAL_CAUSE",
            ProblemCategory::Suddenness => "SUDDENNESS",
            ProblemCategory::WorkConnection => "WORK_CONNECTION",
            ProblemCategory::Intoxication => "INTOXICATION",
            ProblemCategory::Other => "OTHER",
        }
    }

    /// Parse an exact wire name
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s)
    }
}

/// The rule distilled from the case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpertRule {
    /// Short description of the circumstances
    pub condition: String,

    /// "IF … AND … THEN … BECAUSE …"
    pub logic: String,

    /// Legal problem category
    pub problem_category: ProblemCategory,
}

/// Risk that a similar case gets rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// Low
    Low,

    /// Medium
    Medium,

    /// High
    High,
}

impl RiskLevel {
    /// All values of the enumeration
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    /// Get the wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }

    /// Parse an exact wire name
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s)
    }
}

/// Guidance for the decision chatbot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConclusions {
    /// What to ask about in similar cases
    pub what_to_look_for: String,

    /// Rejection risk for similar cases
    pub rejection_risk: RiskLevel,
}

/// Complete, validated record for one case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredRecord {
    /// Event metadata
    pub meta: EventMeta,

    /// Decision analysis
    pub decision: Decision,

    /// Key facts, at least one
    pub key_facts: Vec<String>,

    /// Distilled rule
    pub expert_rule: ExpertRule,

    /// Chatbot guidance
    pub conclusions_for_bot: BotConclusions,

    /// Document roles that were unavailable for the case
    #[serde(default)]
    pub missing_documents: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_names_match_serde() {
        for status in DecisionStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        for category in ProblemCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
        for risk in RiskLevel::ALL {
            let json = serde_json::to_string(&risk).unwrap();
            assert_eq!(json, format!("\"{}\"", risk.as_str()));
        }
    }

    #[test]
    fn test_parse_is_exact() {
        assert_eq!(DecisionStatus::parse("RECOGNIZED"), Some(DecisionStatus::Recognized));
        assert_eq!(DecisionStatus::parse("recognized"), None);
        assert_eq!(DecisionStatus::parse("MAYBE"), None);
        assert_eq!(ProblemCategory::parse("INTOXICATION"), Some(ProblemCategory::Intoxication));
        assert_eq!(RiskLevel::parse("MEDIUM"), Some(RiskLevel::Medium));
    }

    #[test]
    fn test_missing_documents_defaults_to_empty() {
        let json = r#"{
            "meta": {"event_date": "2023-01-05", "event_time": "NIEZNANA", "location": "warsztat", "injury": "złamanie"},
            "decision": {"status": "NOT_RECOGNIZED", "rejection_reason": "brak przyczyny zewnętrznej", "legal_basis_quote": "..."},
            "key_facts": ["upadek"],
            "expert_rule": {"condition": "upadek", "logic": "IF a AND b THEN c BECAUSE d", "problem_category": "EXTERNAL_CAUSE"},
            "conclusions_for_bot": {"what_to_look_for": "świadkowie", "rejection_risk": "HIGH"}
        }"#;
        let record: StructuredRecord = serde_json::from_str(json).unwrap();
        assert!(record.missing_documents.is_empty());
        assert_eq!(record.decision.status, DecisionStatus::NotRecognized);
    }
}
