//! Shared ticket types passed between the store, the labeler, and the CLI.

use serde::{Deserialize, Serialize};

/// A resident-submitted maintenance request from the source dataset.
///
/// Text fields are trimmed on load; missing values become empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub id: i64,
    /// Free-form submission timestamp, passed through to the classifier as-is.
    pub timestamp: String,
    pub comment: String,
    /// Resident-selected priority.
    pub priority: String,
    /// Resident-selected service category.
    pub category: String,
}

/// A classifier label for one ticket.
///
/// Serialized with the field names of the prediction ledger so that the
/// append log, the snapshot, and the model response share one shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelResult {
    pub id: i64,
    #[serde(rename = "Priority")]
    pub priority: String,
    #[serde(rename = "Service_Category")]
    pub category: String,
    /// One resident-facing sentence.
    #[serde(rename = "Suggested_Actions")]
    pub suggested_actions: String,
}

/// Outbound payload for one ticket in a classification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItem {
    pub id: i64,
    pub ts: String,
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resident_selected_priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resident_selected_category: Option<String>,
}

impl From<&SourceRecord> for BatchItem {
    fn from(record: &SourceRecord) -> Self {
        Self {
            id: record.id,
            ts: record.timestamp.clone(),
            comment: record.comment.clone(),
            resident_selected_priority: None,
            resident_selected_category: None,
        }
    }
}

/// A source record joined with its AI label, as shown in the demo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoExample {
    pub id: i64,
    pub resident_priority: String,
    pub resident_category: String,
    pub comment: String,
    pub ai_priority: String,
    pub ai_category: String,
    pub suggested_actions: String,
}

impl DemoExample {
    /// Join a source record with its label. Ids are assumed to match.
    pub fn join(record: &SourceRecord, label: &LabelResult) -> Self {
        Self {
            id: record.id,
            resident_priority: record.priority.clone(),
            resident_category: record.category.clone(),
            comment: record.comment.clone(),
            ai_priority: label.priority.clone(),
            ai_category: label.category.clone(),
            suggested_actions: label.suggested_actions.clone(),
        }
    }

    /// The cached AI label for this example.
    pub fn label(&self) -> LabelResult {
        LabelResult {
            id: self.id,
            priority: self.ai_priority.clone(),
            category: self.ai_category.clone(),
            suggested_actions: self.suggested_actions.clone(),
        }
    }
}
