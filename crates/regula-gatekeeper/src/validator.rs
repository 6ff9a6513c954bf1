//! Record validation logic

use crate::{ValidationConfig, ValidationError};
use regula_domain::{DecisionStatus, ProblemCategory, RiskLevel, StructuredRecord};
use serde_json::{Map, Value};
use std::fmt;

const ROOT_FIELDS: [&str; 6] = [
    "meta",
    "decision",
    "key_facts",
    "expert_rule",
    "conclusions_for_bot",
    "missing_documents",
];
const META_FIELDS: [&str; 4] = ["event_date", "event_time", "location", "injury"];
const DECISION_FIELDS: [&str; 3] = ["status", "rejection_reason", "legal_basis_quote"];
const RULE_FIELDS: [&str; 3] = ["condition", "logic", "problem_category"];
const CONCLUSION_FIELDS: [&str; 2] = ["what_to_look_for", "rejection_risk"];

/// A single violated constraint, located by its field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Required field absent
    MissingField {
        /// Dotted field path
        path: String,
    },

    /// Field present with the wrong JSON type
    WrongType {
        /// Dotted field path
        path: String,
        /// Expected JSON type
        expected: &'static str,
    },

    /// String outside a closed enumeration
    InvalidEnum {
        /// Dotted field path
        path: String,
        /// Value found
        value: String,
        /// Accepted values
        allowed: Vec<&'static str>,
    },

    /// List that must not be empty
    EmptyList {
        /// Dotted field path
        path: String,
    },

    /// Field not part of the schema (strict mode only)
    UnknownField {
        /// Dotted field path
        path: String,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MissingField { path } => write!(f, "{}: missing field", path),
            Violation::WrongType { path, expected } => {
                write!(f, "{}: expected {}", path, expected)
            }
            Violation::InvalidEnum {
                path,
                value,
                allowed,
            } => write!(
                f,
                "{}: {:?} is not one of {}",
                path,
                value,
                allowed.join(", ")
            ),
            Violation::EmptyList { path } => {
                write!(f, "{}: must contain at least one entry", path)
            }
            Violation::UnknownField { path } => write!(f, "{}: unknown field", path),
        }
    }
}

/// Every violation found in one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Violations in document order
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Whether the document satisfied every constraint
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }
}

/// Remove an enclosing markdown code fence
///
/// Handles a leading "```json" or "```" and a trailing "```". Text without a
/// fence is returned trimmed.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest.trim_start();
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest.trim_start();
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim_end();
    }
    text
}

/// The Gatekeeper validates completion output before it is persisted
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    config: ValidationConfig,
}

impl Default for Gatekeeper {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

impl Gatekeeper {
    /// Create a new Gatekeeper with the given configuration
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Parse and validate a raw response
    ///
    /// # Errors
    ///
    /// `InvalidJson` when the text does not parse, `Schema` when any
    /// constraint is violated.
    pub fn parse(&self, raw: &str) -> Result<StructuredRecord, ValidationError> {
        let value = self.parse_value(raw)?;
        self.accept(value)
    }

    /// Parse a raw response, recording which documents were unavailable
    ///
    /// `missing_documents` in the response is replaced by `missing` before
    /// validation.
    pub fn parse_with_missing(
        &self,
        raw: &str,
        missing: &[String],
    ) -> Result<StructuredRecord, ValidationError> {
        let mut value = self.parse_value(raw)?;
        if let Value::Object(root) = &mut value {
            root.insert("missing_documents".to_string(), Value::from(missing.to_vec()));
        }
        self.accept(value)
    }

    /// Check a JSON document against every record constraint
    pub fn validate(&self, value: &Value) -> ValidationReport {
        let mut report = ValidationReport::default();

        let Some(root) = value.as_object() else {
            report.push(Violation::WrongType {
                path: "$".to_string(),
                expected: "object",
            });
            return report;
        };
        self.unknown_fields(root, "", &ROOT_FIELDS, &mut report);

        if let Some(meta) = object_field(root, "", "meta", &mut report) {
            for key in META_FIELDS {
                text_field(meta, "meta", key, &mut report);
            }
            self.unknown_fields(meta, "meta", &META_FIELDS, &mut report);
        }

        if let Some(decision) = object_field(root, "", "decision", &mut report) {
            let allowed = DecisionStatus::ALL.iter().map(|s| s.as_str()).collect();
            enum_field(decision, "decision", "status", allowed, &mut report);
            text_field(decision, "decision", "rejection_reason", &mut report);
            text_field(decision, "decision", "legal_basis_quote", &mut report);
            self.unknown_fields(decision, "decision", &DECISION_FIELDS, &mut report);
        }

        text_list(root, "key_facts", true, &mut report);

        if let Some(rule) = object_field(root, "", "expert_rule", &mut report) {
            text_field(rule, "expert_rule", "condition", &mut report);
            text_field(rule, "expert_rule", "logic", &mut report);
            let allowed = ProblemCategory::ALL.iter().map(|c| c.as_str()).collect();
            enum_field(rule, "expert_rule", "problem_category", allowed, &mut report);
            self.unknown_fields(rule, "expert_rule", &RULE_FIELDS, &mut report);
        }

        if let Some(bot) = object_field(root, "", "conclusions_for_bot", &mut report) {
            text_field(bot, "conclusions_for_bot", "what_to_look_for", &mut report);
            let allowed = RiskLevel::ALL.iter().map(|r| r.as_str()).collect();
            enum_field(bot, "conclusions_for_bot", "rejection_risk", allowed, &mut report);
            self.unknown_fields(bot, "conclusions_for_bot", &CONCLUSION_FIELDS, &mut report);
        }

        if root.contains_key("missing_documents") {
            text_list(root, "missing_documents", false, &mut report);
        }

        report
    }

    fn parse_value(&self, raw: &str) -> Result<Value, ValidationError> {
        let text = strip_code_fences(raw);
        serde_json::from_str(text).map_err(|e| ValidationError::InvalidJson {
            message: e.to_string(),
            preview: text.chars().take(self.config.preview_chars).collect(),
        })
    }

    fn accept(&self, value: Value) -> Result<StructuredRecord, ValidationError> {
        let report = self.validate(&value);
        if !report.is_valid() {
            return Err(ValidationError::Schema(report.violations));
        }

        // Every constraint serde enforces was checked above
        let mut record: StructuredRecord =
            serde_json::from_value(value).map_err(|e| ValidationError::InvalidJson {
                message: e.to_string(),
                preview: String::new(),
            })?;
        self.normalize(&mut record);
        Ok(record)
    }

    fn normalize(&self, record: &mut StructuredRecord) {
        let meta = &mut record.meta;
        for field in [
            &mut meta.event_date,
            &mut meta.event_time,
            &mut meta.location,
            &mut meta.injury,
        ] {
            if !self.config.is_sentinel(field) {
                let trimmed = field.trim();
                if trimmed.len() != field.len() {
                    *field = trimmed.to_string();
                }
            }
        }
    }

    fn unknown_fields(
        &self,
        object: &Map<String, Value>,
        parent: &str,
        known: &[&str],
        report: &mut ValidationReport,
    ) {
        if !self.config.reject_unknown_fields {
            return;
        }
        for key in object.keys() {
            if !known.contains(&key.as_str()) {
                report.push(Violation::UnknownField {
                    path: join(parent, key),
                });
            }
        }
    }
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn required<'a>(
    object: &'a Map<String, Value>,
    parent: &str,
    key: &str,
    report: &mut ValidationReport,
) -> Option<&'a Value> {
    let value = object.get(key);
    if value.is_none() {
        report.push(Violation::MissingField {
            path: join(parent, key),
        });
    }
    value
}

fn object_field<'a>(
    object: &'a Map<String, Value>,
    parent: &str,
    key: &str,
    report: &mut ValidationReport,
) -> Option<&'a Map<String, Value>> {
    let value = required(object, parent, key, report)?;
    let nested = value.as_object();
    if nested.is_none() {
        report.push(Violation::WrongType {
            path: join(parent, key),
            expected: "object",
        });
    }
    nested
}

fn text_field(object: &Map<String, Value>, parent: &str, key: &str, report: &mut ValidationReport) {
    if let Some(value) = required(object, parent, key, report) {
        if !value.is_string() {
            report.push(Violation::WrongType {
                path: join(parent, key),
                expected: "string",
            });
        }
    }
}

fn enum_field(
    object: &Map<String, Value>,
    parent: &str,
    key: &str,
    allowed: Vec<&'static str>,
    report: &mut ValidationReport,
) {
    let Some(value) = required(object, parent, key, report) else {
        return;
    };
    match value.as_str() {
        Some(s) if allowed.contains(&s) => {}
        Some(s) => report.push(Violation::InvalidEnum {
            path: join(parent, key),
            value: s.to_string(),
            allowed,
        }),
        None => report.push(Violation::WrongType {
            path: join(parent, key),
            expected: "string",
        }),
    }
}

fn text_list(
    object: &Map<String, Value>,
    key: &str,
    non_empty: bool,
    report: &mut ValidationReport,
) {
    let Some(value) = required(object, "", key, report) else {
        return;
    };
    let Some(items) = value.as_array() else {
        report.push(Violation::WrongType {
            path: key.to_string(),
            expected: "array",
        });
        return;
    };
    if non_empty && items.is_empty() {
        report.push(Violation::EmptyList {
            path: key.to_string(),
        });
    }
    for (idx, item) in items.iter().enumerate() {
        if !item.is_string() {
            report.push(Violation::WrongType {
                path: format!("{}[{}]", key, idx),
                expected: "string",
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regula_domain::DecisionStatus;
    use serde_json::json;

    fn valid_record() -> Value {
        json!({
            "meta": {
                "event_date": " 2023-03-14 ",
                "event_time": "NIEZNANA",
                "location": "hala produkcyjna",
                "injury": "złamanie kości przedramienia"
            },
            "decision": {
                "status": "RECOGNIZED",
                "rejection_reason": "BRAK",
                "legal_basis_quote": "zdarzenie spełnia definicję wypadku przy pracy"
            },
            "key_facts": ["poślizgnięcie na mokrej posadzce"],
            "expert_rule": {
                "condition": "upadek na śliskiej nawierzchni",
                "logic": "IF upadek AND mokra posadzka THEN uznany BECAUSE przyczyna zewnętrzna",
                "problem_category": "EXTERNAL_CAUSE"
            },
            "conclusions_for_bot": {
                "what_to_look_for": "stan nawierzchni",
                "rejection_risk": "LOW"
            }
        })
    }

    #[test]
    fn test_valid_record_accepted() {
        let gatekeeper = Gatekeeper::default();
        let record = gatekeeper.parse(&valid_record().to_string()).unwrap();

        assert_eq!(record.decision.status, DecisionStatus::Recognized);
        assert_eq!(record.meta.event_date, "2023-03-14");
        assert_eq!(record.meta.event_time, "NIEZNANA");
        assert!(record.missing_documents.is_empty());
    }

    #[test]
    fn test_empty_key_facts_rejected() {
        let mut value = valid_record();
        value["key_facts"] = json!([]);

        let err = Gatekeeper::default().parse(&value.to_string()).unwrap_err();
        assert_eq!(
            err.violations(),
            &[Violation::EmptyList {
                path: "key_facts".to_string()
            }]
        );
    }

    #[test]
    fn test_invalid_status_not_coerced() {
        let mut value = valid_record();
        value["decision"]["status"] = json!("MAYBE");

        let err = Gatekeeper::default().parse(&value.to_string()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("decision.status"));
        assert!(message.contains("MAYBE"));
        assert!(matches!(
            err.violations()[0],
            Violation::InvalidEnum { ref value, .. } if value == "MAYBE"
        ));
    }

    #[test]
    fn test_all_violations_reported_in_order() {
        let value = json!({
            "meta": {"event_date": "2023-01-01", "event_time": 12, "location": "biuro"},
            "decision": {"status": "RECOGNIZED", "rejection_reason": "BRAK", "legal_basis_quote": "..."},
            "key_facts": ["a", 2],
            "expert_rule": {"condition": "c", "logic": "l", "problem_category": "WEATHER"},
            "conclusions_for_bot": {"what_to_look_for": "w", "rejection_risk": "LOW"}
        });

        let report = Gatekeeper::default().validate(&value);
        let paths: Vec<String> = report
            .violations
            .iter()
            .map(|v| v.to_string().split(':').next().unwrap_or_default().to_string())
            .collect();

        assert_eq!(
            paths,
            vec![
                "meta.event_time",
                "meta.injury",
                "key_facts[1]",
                "expert_rule.problem_category"
            ]
        );
        assert!(report.violations.len() > 1);
    }

    #[test]
    fn test_error_message_leads_with_first_violation() {
        let mut value = valid_record();
        value.as_object_mut().unwrap().remove("meta");
        value["key_facts"] = json!([]);

        let err = Gatekeeper::default().parse(&value.to_string()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Schema violation: meta: missing field (+1 more)"
        );
    }

    #[test]
    fn test_code_fences_stripped() {
        let raw = format!("```json\n{}\n```", valid_record());
        assert!(Gatekeeper::default().parse(&raw).is_ok());

        let raw = format!("  ```\n{}```  ", valid_record());
        assert!(Gatekeeper::default().parse(&raw).is_ok());

        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_invalid_json_keeps_preview() {
        let raw = format!("Oto wynik: {}", "x".repeat(2000));
        let err = Gatekeeper::default().parse(&raw).unwrap_err();

        match err {
            ValidationError::InvalidJson { preview, .. } => {
                assert_eq!(preview.chars().count(), 500);
                assert!(preview.starts_with("Oto wynik"));
            }
            other => panic!("expected InvalidJson, got {:?}", other),
        }
    }

    #[test]
    fn test_non_object_root() {
        let err = Gatekeeper::default().parse("[1, 2]").unwrap_err();
        assert_eq!(
            err.violations(),
            &[Violation::WrongType {
                path: "$".to_string(),
                expected: "object"
            }]
        );
    }

    #[test]
    fn test_missing_documents_overwritten() {
        let mut value = valid_record();
        value["missing_documents"] = json!(["invented"]);

        let missing = vec!["legal_opinion".to_string()];
        let record = Gatekeeper::default()
            .parse_with_missing(&value.to_string(), &missing)
            .unwrap();
        assert_eq!(record.missing_documents, missing);
    }

    #[test]
    fn test_sentinels_kept_verbatim() {
        let mut value = valid_record();
        value["meta"]["location"] = json!("  warsztat ");
        value["meta"]["injury"] = json!("brak");

        let record = Gatekeeper::default().parse(&value.to_string()).unwrap();
        assert_eq!(record.meta.location, "warsztat");
        assert_eq!(record.meta.injury, "brak");
    }

    #[test]
    fn test_unknown_fields_strict_only() {
        let mut value = valid_record();
        value["confidence"] = json!(0.9);
        value["meta"]["weather"] = json!("rain");

        assert!(Gatekeeper::default().validate(&value).is_valid());

        let report = Gatekeeper::new(ValidationConfig::strict()).validate(&value);
        assert_eq!(
            report.violations,
            vec![
                Violation::UnknownField {
                    path: "confidence".to_string()
                },
                Violation::UnknownField {
                    path: "meta.weather".to_string()
                },
            ]
        );
    }
}
