//! Purpose: Define a stable, structured schema for non-fatal stderr notices.
//! Exports: `Notice`, `notice_json`, `skipped_row_notice`.
//! Role: Shared contract helper for CLI diagnostics such as skipped malformed rows.
//! Invariants: Notices are non-fatal and never alter stdout payloads.
//! Invariants: JSON schema is stable once published; fields are additive-only.
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::results::load::RowFailure;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: String,
    pub time: String,
    pub cmd: String,
    pub input: String,
    pub message: String,
    pub details: Map<String, Value>,
}

/// Wrap a notice as `{"notice": {...}}`.
pub fn notice_json(notice: &Notice) -> Value {
    json!({ "notice": notice })
}

pub fn skipped_row_notice(cmd: &str, time: String, failure: &RowFailure) -> Notice {
    let mut details = Map::new();
    details.insert("query_id".to_string(), json!(failure.query_id));
    details.insert("column".to_string(), json!(failure.column.name()));
    Notice {
        kind: "skip".to_string(),
        time,
        cmd: cmd.to_string(),
        input: failure.path.display().to_string(),
        message: failure.message.clone(),
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::{notice_json, skipped_row_notice};
    use crate::results::load::RowFailure;
    use crate::results::record::Column;
    use std::path::PathBuf;

    #[test]
    fn skipped_row_notice_has_required_fields() {
        let failure = RowFailure {
            path: PathBuf::from("results/1k_10.csv"),
            query_id: 17,
            column: Column::Actions,
            message: "tag is not followed by digits".to_string(),
        };
        let notice = skipped_row_notice("actions", "2026-02-01T00:00:00Z".to_string(), &failure);

        let value = notice_json(&notice);
        let obj = value
            .get("notice")
            .and_then(|v| v.as_object())
            .expect("notice object");

        assert_eq!(obj.get("kind").and_then(|v| v.as_str()), Some("skip"));
        assert_eq!(
            obj.get("time").and_then(|v| v.as_str()),
            Some("2026-02-01T00:00:00Z")
        );
        assert_eq!(obj.get("cmd").and_then(|v| v.as_str()), Some("actions"));
        assert_eq!(
            obj.get("input").and_then(|v| v.as_str()),
            Some("results/1k_10.csv")
        );
        let details = obj.get("details").and_then(|v| v.as_object()).unwrap();
        assert_eq!(details.get("query_id").and_then(|v| v.as_u64()), Some(17));
        assert_eq!(details.get("column").and_then(|v| v.as_str()), Some("actions"));
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["cmd", "details", "input", "kind", "message", "time"]);
    }
}
