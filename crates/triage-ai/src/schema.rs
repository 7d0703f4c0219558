//! Structured-output contract for a labeling call.

use serde_json::{Value, json};
use triage_core::AllowedLabels;

/// Hard cap on the resident-facing message, enforced by the schema and
/// re-checked on every response.
pub const MAX_MESSAGE_CHARS: usize = 140;

/// Word limit the instructions ask for. Not enforceable through the schema;
/// longer messages are accepted and logged.
pub const ADVISORY_MAX_WORDS: usize = 30;

/// JSON Schema for `{"results": [label, ...]}` with the priority and
/// category enums fixed to `allowed`.
pub fn build_schema(allowed: &AllowedLabels) -> Value {
    json!({
        "type": "object",
        "properties": {
            "results": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer" },
                        "Priority": {
                            "type": "string",
                            "description": "One of the allowed Priority labels.",
                            "enum": allowed.priorities,
                        },
                        "Service_Category": {
                            "type": "string",
                            "description": "One of the allowed Service Category labels.",
                            "enum": allowed.categories,
                        },
                        "Suggested_Actions": {
                            "type": "string",
                            "description": "One sentence, under 30 words, very general, no repair steps.",
                            "maxLength": MAX_MESSAGE_CHARS,
                        },
                    },
                    "required": ["id", "Priority", "Service_Category", "Suggested_Actions"],
                    "additionalProperties": false,
                },
            },
        },
        "required": ["results"],
    })
}
