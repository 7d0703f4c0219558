//! Prompt text for labeling calls.
//!
//! Everything here is advisory to the model. Only the schema enums and the
//! response validation are enforced.

use triage_core::{AllowedLabels, BatchItem};

use crate::schema::ADVISORY_MAX_WORDS;

/// Words the resident-facing message must not use.
pub const PROHIBITED_WORDS: &[&str] = &[
    "inspect",
    "repair",
    "replace",
    "investigate",
    "fix",
    "diagnose",
    "troubleshoot",
    "assess",
    "evaluate",
];

fn quoted_list<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .map(|v| format!("\"{}\"", v.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// System instructions for a labeling call restricted to `allowed`.
pub fn build_instructions(allowed: &AllowedLabels) -> String {
    format!(
        "\
You are an automated property management assistant. Your task is to analyze resident-submitted \
maintenance requests, classify them, and provide a legally safe, minimal-risk suggested action \
for the resident while they wait.

Return ONLY valid JSON matching the provided schema. Do not include markdown formatting or extra text.

### OUTPUT REQUIREMENTS ###
- Return exactly ONE result object per input item.
- Preserve the same id from the input item in each output object.
- Priority MUST be exactly one of: [{priorities}]
- Service_Category MUST be exactly one of: [{categories}]
- Suggested_Actions must follow the rules below.

### SUGGESTED_ACTIONS RULES (resident-facing) ###
- Audience: Address the resident directly (use \"you/your\").
- Length: Exactly ONE sentence, strictly UNDER {max_words} words.
- Tone: Warm, friendly, comforting, and reassuring. Acknowledge their inconvenience gently.
- Content: Very general, minimal legal risk. Focus only on immediate safety, isolating the issue, and waiting.
- Prohibited: Do NOT include repair steps, diagnostics, tools, parts, or chemicals.
- Prohibited words: do NOT use {prohibited}.
- Escalation: If immediate danger is implied (gas smell, sparks, major flooding, smoke), advise \
evacuating and contacting emergency services or the property emergency line.
",
        priorities = quoted_list(&allowed.priorities),
        categories = quoted_list(&allowed.categories),
        max_words = ADVISORY_MAX_WORDS,
        prohibited = quoted_list(PROHIBITED_WORDS),
    )
}

/// User turn carrying the batch as a JSON array.
pub fn build_user_contents(items: &[BatchItem]) -> Result<String, serde_json::Error> {
    let payload = serde_json::to_string(items)?;
    Ok(format!("Label these requests.\n\nINPUT_ITEMS_JSON:\n{payload}\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_spell_out_vocabularies() {
        let allowed = AllowedLabels::new(["01-Emergency", "03-Routine"], ["Electrical", "Plumbing"]);
        let text = build_instructions(&allowed);
        assert!(text.contains("Priority MUST be exactly one of: [\"01-Emergency\", \"03-Routine\"]"));
        assert!(text.contains("Service_Category MUST be exactly one of: [\"Electrical\", \"Plumbing\"]"));
        assert!(text.contains("strictly UNDER 30 words"));
        assert!(text.contains("\"troubleshoot\""));
        assert!(text.contains("Preserve the same id"));
    }

    #[test]
    fn user_contents_embed_items_json() {
        let items = vec![BatchItem {
            id: 42,
            ts: "2024-03-01 10:00".into(),
            comment: "Smell of gas in the hallway".into(),
            resident_selected_priority: None,
            resident_selected_category: None,
        }];
        let text = build_user_contents(&items).unwrap();
        assert!(text.starts_with("Label these requests."));
        let json_start = text.find('[').unwrap();
        let parsed: serde_json::Value = serde_json::from_str(text[json_start..].trim()).unwrap();
        assert_eq!(parsed[0]["id"], 42);
        assert_eq!(parsed[0]["comment"], "Smell of gas in the hallway");
    }
}
