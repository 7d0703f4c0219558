//! One labeling call per batch, with the reply checked against the contract.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use triage_core::{AllowedLabels, BatchItem, LabelResult};

use crate::LabelError;
use crate::client::{LabelClient, LabelRequest};
use crate::prompt::{build_instructions, build_user_contents};
use crate::schema::{ADVISORY_MAX_WORDS, MAX_MESSAGE_CHARS, build_schema};

/// Vocabulary, schema and instructions shared by every call in a run.
#[derive(Debug, Clone)]
pub struct LabelContract {
    allowed: AllowedLabels,
    schema: Value,
    instructions: String,
}

impl LabelContract {
    pub fn new(allowed: AllowedLabels) -> Self {
        let schema = build_schema(&allowed);
        let instructions = build_instructions(&allowed);
        Self {
            allowed,
            schema,
            instructions,
        }
    }

    pub fn allowed(&self) -> &AllowedLabels {
        &self.allowed
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Build the request for one batch.
    pub fn request(&self, items: &[BatchItem]) -> Result<LabelRequest, LabelError> {
        Ok(LabelRequest {
            instructions: self.instructions.clone(),
            contents: build_user_contents(items)?,
            schema: self.schema.clone(),
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope {
    Wrapped { results: Vec<LabelResult> },
    Bare(Vec<LabelResult>),
}

/// Label `items` in a single call.
///
/// The batch either comes back whole and valid or fails; partial results are
/// never returned.
pub async fn label_batch(
    client: &dyn LabelClient,
    items: &[BatchItem],
    contract: &LabelContract,
) -> Result<Vec<LabelResult>, LabelError> {
    let request = contract.request(items)?;
    let raw = client.generate(&request).await?;
    debug!(bytes = raw.len(), "received model response");
    validate_response(&raw, items, contract.allowed())
}

/// Parse and check a raw reply against the submitted batch.
///
/// Requires one result per submitted id, labels from the allowed sets and a
/// message within [`MAX_MESSAGE_CHARS`]. Messages over the advisory word
/// count are kept with a warning.
pub fn validate_response(
    raw: &str,
    items: &[BatchItem],
    allowed: &AllowedLabels,
) -> Result<Vec<LabelResult>, LabelError> {
    let envelope: Envelope = serde_json::from_str(raw.trim())
        .map_err(|e| LabelError::Validation(format!("response does not match schema: {e}")))?;
    let mut results = match envelope {
        Envelope::Wrapped { results } => results,
        Envelope::Bare(results) => results,
    };

    if results.len() != items.len() {
        return Err(LabelError::Validation(format!(
            "expected {} results, got {}",
            items.len(),
            results.len()
        )));
    }

    let submitted: HashSet<i64> = items.iter().map(|i| i.id).collect();
    let mut returned = HashSet::with_capacity(results.len());

    for result in &mut results {
        result.priority = result.priority.trim().to_string();
        result.category = result.category.trim().to_string();
        result.suggested_actions = result.suggested_actions.trim().to_string();

        if !submitted.contains(&result.id) {
            return Err(LabelError::Validation(format!(
                "unexpected id {}",
                result.id
            )));
        }
        if !returned.insert(result.id) {
            return Err(LabelError::Validation(format!(
                "id {} returned more than once",
                result.id
            )));
        }
        if !allowed.allows_priority(&result.priority) {
            return Err(LabelError::Validation(format!(
                "id {}: priority '{}' is not an allowed label",
                result.id, result.priority
            )));
        }
        if !allowed.allows_category(&result.category) {
            return Err(LabelError::Validation(format!(
                "id {}: category '{}' is not an allowed label",
                result.id, result.category
            )));
        }
        let chars = result.suggested_actions.chars().count();
        if chars > MAX_MESSAGE_CHARS {
            return Err(LabelError::Validation(format!(
                "id {}: suggested action is {chars} characters (max {MAX_MESSAGE_CHARS})",
                result.id
            )));
        }
        let words = result.suggested_actions.split_whitespace().count();
        if words >= ADVISORY_MAX_WORDS {
            warn!(id = result.id, words, "suggested action exceeds advisory word count");
        }
    }

    Ok(results)
}
