//! Gatekeeper configuration

/// Tokens meaning "unknown" that are kept verbatim in meta fields
pub const DEFAULT_SENTINELS: [&str; 4] = ["BRAK", "NIEZNANA", "brak", "nieznana"];

/// Configuration for validation rules
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Meta values left untouched by normalization
    pub sentinels: Vec<String>,

    /// Characters of an unparseable response kept in the error
    pub preview_chars: usize,

    /// Report fields that are not part of the record schema
    pub reject_unknown_fields: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            sentinels: DEFAULT_SENTINELS.iter().map(|s| s.to_string()).collect(),
            preview_chars: 500,
            reject_unknown_fields: false,
        }
    }
}

impl ValidationConfig {
    /// Create a strict configuration (unknown fields rejected)
    pub fn strict() -> Self {
        Self {
            reject_unknown_fields: true,
            ..Self::default()
        }
    }

    /// Whether a meta value is an "unknown" sentinel
    pub fn is_sentinel(&self, value: &str) -> bool {
        self.sentinels.iter().any(|s| s == value)
    }
}
