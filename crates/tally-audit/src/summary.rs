//! Tool result summarization.
//!
//! Compresses a tool's result into a small, bounded digest for audit
//! storage. The digest opportunistically surfaces a numeric `row_count`
//! pulled out of JSON results so that volume-based alert rules (large-data
//! export detection) can evaluate without re-parsing the full preview.

use serde_json::{Map, Value};
use tally_core::protocol::CallToolResult;

use crate::sanitize::truncate_string;

/// Ceiling on the stored result preview, in characters.
pub const PREVIEW_MAX_LEN: usize = 200;

/// Summary key carrying the extracted row count.
pub const ROW_COUNT_KEY: &str = "row_count";

/// Produce a bounded digest of a tool result.
///
/// `None` in means "no result" (e.g. a transport failure before a result was
/// produced) and yields `None` out. Otherwise the summary always carries an
/// `is_error` flag; when the result has content it also carries the content
/// item count and a capped preview of the first textual item.
pub fn summarize_result(result: Option<&CallToolResult>) -> Option<Map<String, Value>> {
    let result = result?;

    let mut summary = Map::new();
    summary.insert("is_error".to_string(), Value::Bool(result.is_error()));

    if result.content.is_empty() {
        return Some(summary);
    }

    summary.insert(
        "content_count".to_string(),
        Value::Number(result.content.len().into()),
    );

    if let Some(text) = result.content.iter().find_map(|item| item.as_text()) {
        summary.insert(
            "preview".to_string(),
            Value::String(truncate_string(text, PREVIEW_MAX_LEN)),
        );

        // Parse the full text, not the capped preview: truncation may have
        // cut the JSON mid-document.
        if let Some(row_count) = extract_row_count(text) {
            summary.insert(ROW_COUNT_KEY.to_string(), Value::Number(row_count.into()));
        }
    }

    Some(summary)
}

/// Pull a numeric `row_count` out of a JSON result body, if there is one.
fn extract_row_count(text: &str) -> Option<u64> {
    let parsed: Value = serde_json::from_str(text).ok()?;
    parsed.get(ROW_COUNT_KEY)?.as_u64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::protocol::ToolContent;

    fn text_result(text: &str) -> CallToolResult {
        CallToolResult {
            content: vec![ToolContent::Text {
                text: text.to_string(),
            }],
            is_error: Some(false),
        }
    }

    #[test]
    fn absent_result_summarizes_to_absent() {
        assert!(summarize_result(None).is_none());
    }

    #[test]
    fn empty_result_still_carries_error_flag() {
        let result = CallToolResult {
            content: vec![],
            is_error: Some(true),
        };
        let summary = summarize_result(Some(&result)).unwrap();
        assert_eq!(summary["is_error"], Value::Bool(true));
        assert!(!summary.contains_key("content_count"));
        assert!(!summary.contains_key("preview"));
    }

    #[test]
    fn preview_is_capped_at_200_chars() {
        let long = "x".repeat(500);
        let summary = summarize_result(Some(&text_result(&long))).unwrap();

        let preview = summary["preview"].as_str().unwrap();
        assert_eq!(
            preview.len(),
            PREVIEW_MAX_LEN + crate::sanitize::TRUNCATION_MARKER.len()
        );
        assert_eq!(summary["content_count"], Value::Number(1.into()));
    }

    #[test]
    fn row_count_is_extracted_from_json_results() {
        let result = text_result(r#"{"rows": [], "row_count": 15000}"#);
        let summary = summarize_result(Some(&result)).unwrap();
        assert_eq!(summary[ROW_COUNT_KEY], Value::Number(15000u64.into()));
    }

    #[test]
    fn non_json_text_produces_no_row_count_key() {
        let summary = summarize_result(Some(&text_result("42 rows returned"))).unwrap();
        assert!(!summary.contains_key(ROW_COUNT_KEY));
    }

    #[test]
    fn json_without_row_count_produces_no_key() {
        let summary =
            summarize_result(Some(&text_result(r#"{"rows": [1, 2, 3]}"#))).unwrap();
        assert!(!summary.contains_key(ROW_COUNT_KEY));
    }

    #[test]
    fn first_textual_item_is_previewed() {
        let result = CallToolResult {
            content: vec![
                ToolContent::Json {
                    json: serde_json::json!({"meta": true}),
                },
                ToolContent::Text {
                    text: "first text".into(),
                },
                ToolContent::Text {
                    text: "second text".into(),
                },
            ],
            is_error: Some(false),
        };

        let summary = summarize_result(Some(&result)).unwrap();
        assert_eq!(summary["preview"], Value::String("first text".into()));
        assert_eq!(summary["content_count"], Value::Number(3.into()));
    }
}
