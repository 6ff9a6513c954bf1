//! Prompt engineering for rule derivation

use crate::bundle::LoadedBundle;

/// Builds the rule-derivation prompt for one case
pub struct PromptBuilder<'a> {
    bundle: &'a LoadedBundle,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(bundle: &'a LoadedBundle) -> Self {
        Self { bundle }
    }

    /// Build the complete prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        // 1. Role and task
        prompt.push_str(ROLE_INSTRUCTIONS);
        prompt.push_str("\n\nDOKUMENTACJA WYPADKU:\n\n");

        // 2. One section per document role
        for (role, text) in &self.bundle.sections {
            prompt.push_str(&format!("=== {} ===\n", role.heading()));
            prompt.push_str(text.trim_end());
            prompt.push_str("\n\n");
        }

        // 3. Missing documents note
        let missing = self.bundle.missing();
        if !missing.is_empty() {
            prompt.push_str(&format!(
                "UWAGA: Brakujące dokumenty: {}. Bazuj na dostępnych dokumentach.\n\n",
                missing.join(", ")
            ));
        }

        // 4. Output format
        prompt.push_str(OUTPUT_INSTRUCTIONS);

        prompt
    }
}

const ROLE_INSTRUCTIONS: &str = "Jesteś ekspertem ds. prawa pracy i wypadków przy pracy w Polsce.
Twoim zadaniem jest przeanalizować dokumentację wypadku i wygenerować regułę ekspercką.";

const OUTPUT_INSTRUCTIONS: &str = r#"INSTRUKCJE:
1. Przeanalizuj wszystkie dostępne dokumenty.
2. Wyciągnij kluczowe informacje o wypadku.
3. Określ, czy wypadek został uznany (RECOGNIZED) czy nieuznany (NOT_RECOGNIZED) za wypadek przy pracy.
4. Zidentyfikuj główny problem prawny i sformułuj regułę ekspercką.
5. Odpowiedz TYLKO czystym JSON-em, bez znaczników markdown.

WYMAGANE WARTOŚCI ENUM:
- decision.status: tylko "RECOGNIZED" lub "NOT_RECOGNIZED"
- expert_rule.problem_category: tylko "EXTERNAL_CAUSE" (przyczyna zewnętrzna), "SUDDENNESS" (nagłość), "WORK_CONNECTION" (związek z pracą), "INTOXICATION" (stan nietrzeźwości) lub "OTHER" (inne)
- conclusions_for_bot.rejection_risk: tylko "LOW", "MEDIUM" lub "HIGH"

SCHEMAT JSON (odpowiedz dokładnie w tym formacie):
{
  "meta": {
    "event_date": "YYYY-MM-DD (lub NIEZNANA jeśli brak)",
    "event_time": "HH:MM (lub NIEZNANA jeśli brak)",
    "location": "opis miejsca",
    "injury": "opis urazu"
  },
  "decision": {
    "status": "RECOGNIZED lub NOT_RECOGNIZED",
    "rejection_reason": "opis powodu (lub BRAK jeśli uznany)",
    "legal_basis_quote": "dosłowny cytat z opinii prawnej"
  },
  "key_facts": [
    "fakt 1",
    "fakt 2"
  ],
  "expert_rule": {
    "condition": "zwięzły opis okoliczności",
    "logic": "IF [okoliczności] AND [warunek] THEN [decyzja] BECAUSE [uzasadnienie]",
    "problem_category": "jedna z: EXTERNAL_CAUSE, SUDDENNESS, WORK_CONNECTION, INTOXICATION, OTHER"
  },
  "conclusions_for_bot": {
    "what_to_look_for": "wskazówka dla podobnych spraw",
    "rejection_risk": "LOW, MEDIUM lub HIGH"
  }
}
"#;
