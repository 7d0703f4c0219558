//! Single-request re-triage against the labeled vocabulary.

use std::path::Path;
use std::slice;

use anyhow::{Context, bail, ensure};
use chrono::{DateTime, Local};
use tracing::info;
use triage_ai::{LabelClient, LabelContract, label_batch};
use triage_core::{AllowedLabels, BatchItem, DemoExample, LabelResult};
use triage_store::{Ledger, load_demo};

pub const MAX_COMMENT_WORDS: usize = 100;
pub const DEFAULT_RESIDENT_PRIORITY: &str = "03-Routine";

/// A request typed in by a resident.
#[derive(Debug, Clone)]
pub struct TypedRequest {
    pub comment: String,
    pub priority: Option<String>,
    pub category: Option<String>,
}

/// Every curated example, in artifact order.
pub fn list_examples(demo_path: &Path) -> anyhow::Result<Vec<DemoExample>> {
    load_demo(demo_path).with_context(|| format!("reading {}", demo_path.display()))
}

/// Find a curated example by id.
pub fn lookup_example(demo_path: &Path, id: i64) -> anyhow::Result<DemoExample> {
    list_examples(demo_path)?
        .into_iter()
        .find(|e| e.id == id)
        .with_context(|| format!("no demo example with id {id}"))
}

/// Labels the model may choose from: the snapshot's labels, or the demo
/// artifact's resident labels when there is no usable snapshot.
pub fn allowed_for_retriage(ledger: &Ledger, demo_path: &Path) -> anyhow::Result<AllowedLabels> {
    let snapshot = ledger.load_snapshot().context("reading ledger snapshot")?;
    let allowed = AllowedLabels::from_results(snapshot.values());
    if allowed.is_usable() {
        return Ok(allowed);
    }

    if demo_path.exists() {
        let examples =
            load_demo(demo_path).with_context(|| format!("reading {}", demo_path.display()))?;
        let allowed = AllowedLabels::from_demo_examples(&examples);
        if allowed.is_usable() {
            info!(path = %demo_path.display(), "using demo example labels");
            return Ok(allowed);
        }
    }
    bail!("no labels available; run `triage label` or `triage curate` first")
}

/// Validate a typed request and turn it into the single item to label.
pub fn build_item(
    request: &TypedRequest,
    allowed: &AllowedLabels,
    now: DateTime<Local>,
) -> anyhow::Result<BatchItem> {
    let comment = request.comment.trim();
    ensure!(!comment.is_empty(), "request text is empty");
    let words = comment.split_whitespace().count();
    ensure!(
        words <= MAX_COMMENT_WORDS,
        "request is {words} words; keep it to {MAX_COMMENT_WORDS}"
    );

    let priority = match request.priority.as_deref().map(str::trim) {
        Some(p) => p.to_string(),
        None if allowed.allows_priority(DEFAULT_RESIDENT_PRIORITY) => {
            DEFAULT_RESIDENT_PRIORITY.to_string()
        }
        None => allowed
            .priorities
            .first()
            .cloned()
            .context("no priorities available")?,
    };
    ensure!(
        allowed.allows_priority(&priority),
        "unknown priority '{priority}'; expected one of: {}",
        allowed.priorities.join(", ")
    );

    let category = match request.category.as_deref().map(str::trim) {
        Some(c) => c.to_string(),
        None => allowed
            .categories
            .first()
            .cloned()
            .context("no categories available")?,
    };
    ensure!(
        allowed.allows_category(&category),
        "unknown category '{category}'; expected one of: {}",
        allowed.categories.join(", ")
    );

    Ok(BatchItem {
        id: 1,
        ts: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        comment: comment.to_string(),
        resident_selected_priority: Some(priority),
        resident_selected_category: Some(category),
    })
}

/// Label one typed request with the same contract as batch runs.
pub async fn retriage_request(
    client: &dyn LabelClient,
    request: &TypedRequest,
    allowed: AllowedLabels,
    now: DateTime<Local>,
) -> anyhow::Result<(BatchItem, LabelResult)> {
    let item = build_item(request, &allowed, now)?;
    let contract = LabelContract::new(allowed);
    let label = label_batch(client, slice::from_ref(&item), &contract)
        .await
        .context("re-triaging request")?
        .into_iter()
        .next()
        .context("model returned no result")?;
    Ok((item, label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::json;
    use tempfile::TempDir;
    use triage_ai::{LabelError, LabelRequest};
    use triage_store::{OnLedgerCorrupt, write_demo};

    struct EmergencyClient;

    #[async_trait]
    impl LabelClient for EmergencyClient {
        async fn generate(&self, request: &LabelRequest) -> Result<String, LabelError> {
            assert!(request.contents.contains("resident_selected_priority"));
            Ok(json!({"results": [{
                "id": 1,
                "Priority": "01-Emergency",
                "Service_Category": "Electrical",
                "Suggested_Actions": "Please stay away from the sparking outlet and call the emergency line now."
            }]})
            .to_string())
        }
    }

    fn allowed() -> AllowedLabels {
        AllowedLabels::new(
            ["01-Emergency", "02-Urgent", "03-Routine"],
            ["Electrical", "Plumbing"],
        )
    }

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
    }

    fn request(comment: &str) -> TypedRequest {
        TypedRequest {
            comment: comment.into(),
            priority: None,
            category: None,
        }
    }

    fn ledger(dir: &TempDir) -> Ledger {
        Ledger::new(
            dir.path().join("predictions.csv"),
            dir.path().join("predictions.jsonl"),
            OnLedgerCorrupt::TreatAsEmpty,
        )
    }

    fn example(id: i64, priority: &str, category: &str) -> DemoExample {
        DemoExample {
            id,
            resident_priority: priority.into(),
            resident_category: category.into(),
            comment: format!("example {id}"),
            ai_priority: "02-Urgent".into(),
            ai_category: category.into(),
            suggested_actions: "Help is on the way.".into(),
        }
    }

    #[test]
    fn defaults_resident_selection() {
        let item = build_item(&request("  Outlet is sparking  "), &allowed(), now()).unwrap();
        assert_eq!(item.id, 1);
        assert_eq!(item.ts, "2024-06-01 09:30:00");
        assert_eq!(item.comment, "Outlet is sparking");
        assert_eq!(item.resident_selected_priority.as_deref(), Some("03-Routine"));
        assert_eq!(item.resident_selected_category.as_deref(), Some("Electrical"));
    }

    #[test]
    fn falls_back_to_first_priority() {
        let allowed = AllowedLabels::new(["01-Emergency", "02-Urgent"], ["Pest"]);
        let item = build_item(&request("Mice"), &allowed, now()).unwrap();
        assert_eq!(item.resident_selected_priority.as_deref(), Some("01-Emergency"));
    }

    #[test]
    fn rejects_empty_long_or_unknown() {
        assert!(build_item(&request("   "), &allowed(), now()).is_err());

        let long = vec!["word"; MAX_COMMENT_WORDS + 1].join(" ");
        assert!(build_item(&request(&long), &allowed(), now()).is_err());
        let limit = vec!["word"; MAX_COMMENT_WORDS].join(" ");
        assert!(build_item(&request(&limit), &allowed(), now()).is_ok());

        let mut bad = request("Leak");
        bad.priority = Some("00-Never".into());
        assert!(build_item(&bad, &allowed(), now()).is_err());

        let mut bad = request("Leak");
        bad.category = Some("Roofing".into());
        assert!(build_item(&bad, &allowed(), now()).is_err());
    }

    #[tokio::test]
    async fn retriage_returns_validated_label() {
        let mut typed = request("The outlet in my kitchen is sparking");
        typed.priority = Some("02-Urgent".into());
        let (item, label) = retriage_request(&EmergencyClient, &typed, allowed(), now())
            .await
            .unwrap();
        assert_eq!(item.resident_selected_priority.as_deref(), Some("02-Urgent"));
        assert_eq!(label.priority, "01-Emergency");
        assert_eq!(label.category, "Electrical");
    }

    #[tokio::test]
    async fn retriage_rejects_labels_outside_vocabulary() {
        let narrow = AllowedLabels::new(["03-Routine"], ["Plumbing"]);
        let result = retriage_request(&EmergencyClient, &request("Leak"), narrow, now()).await;
        assert!(result.is_err());
    }

    #[test]
    fn allowed_prefers_snapshot_then_demo() {
        let tmp = TempDir::new().unwrap();
        let ledger = ledger(&tmp);
        let demo = tmp.path().join("demo_examples.csv");

        assert!(allowed_for_retriage(&ledger, &demo).is_err());

        write_demo(&demo, &[example(4, "03-Routine", "Pest")]).unwrap();
        let from_demo = allowed_for_retriage(&ledger, &demo).unwrap();
        assert_eq!(from_demo.priorities, vec!["03-Routine"]);
        assert_eq!(from_demo.categories, vec!["Pest"]);

        ledger
            .append(&[LabelResult {
                id: 9,
                priority: "01-Emergency".into(),
                category: "Electrical".into(),
                suggested_actions: "Stay clear.".into(),
            }])
            .unwrap();
        ledger.merge().unwrap();
        let from_snapshot = allowed_for_retriage(&ledger, &demo).unwrap();
        assert_eq!(from_snapshot.priorities, vec!["01-Emergency"]);
    }

    #[test]
    fn lookup_finds_cached_example() {
        let tmp = TempDir::new().unwrap();
        let demo = tmp.path().join("demo_examples.csv");
        write_demo(&demo, &[example(4, "03-Routine", "Pest"), example(8, "02-Urgent", "HVAC")])
            .unwrap();

        assert_eq!(lookup_example(&demo, 8).unwrap().resident_category, "HVAC");
        assert!(lookup_example(&demo, 5).is_err());
    }

    #[test]
    fn list_keeps_artifact_order() {
        let tmp = TempDir::new().unwrap();
        let demo = tmp.path().join("demo_examples.csv");
        assert!(list_examples(&demo).is_err());

        write_demo(&demo, &[example(8, "02-Urgent", "HVAC"), example(4, "03-Routine", "Pest")])
            .unwrap();
        let ids: Vec<i64> = list_examples(&demo).unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![8, 4]);
    }
}
