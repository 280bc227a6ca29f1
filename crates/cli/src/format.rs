//! Output → human/json string formatting.
//!
//! Two modes:
//! - **Human** (default): one item per line, documents as stored
//! - **JSON** (`--json`): one pretty-printed JSON value per command

use serde_json::{json, Value as JsonValue};

use auditkv_core::{Error, HistoryRecord, TxId};
use auditkv_ingest::IngestStats;

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Document bytes as a JSON value, or as a string if they are not JSON
fn document_value(bytes: &[u8]) -> JsonValue {
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| JsonValue::String(String::from_utf8_lossy(bytes).into_owned()))
}

fn pretty(value: &JsonValue) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Format an error.
pub fn format_error(err: &Error, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => pretty(&json!({ "error": err.to_string() })),
        OutputMode::Human => format!("(error) {}", err),
    }
}

/// Format the result of `create`.
pub fn format_created(
    collection: &str,
    indexes: &[String],
    parser: &str,
    tx_id: TxId,
    mode: OutputMode,
) -> String {
    match mode {
        OutputMode::Json => pretty(&json!({
            "collection": collection,
            "indexes": indexes,
            "parser": parser,
            "tx_id": tx_id.as_u64(),
        })),
        OutputMode::Human => format!(
            "created collection '{}' (indexes: {}; parser: {}) at tx {}",
            collection,
            indexes.join(", "),
            parser,
            tx_id
        ),
    }
}

/// Format ingest counters.
pub fn format_stats(stats: &IngestStats, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => pretty(&json!({
            "lines_read": stats.lines_read,
            "stored": stats.stored,
            "blank_skipped": stats.blank_skipped,
            "parse_skipped": stats.parse_skipped,
            "invalid_skipped": stats.invalid_skipped,
            "last_tx": stats.last_tx.map(|tx| tx.as_u64()),
        })),
        OutputMode::Human => {
            let mut out = format!(
                "read {} lines, stored {}, skipped {} unparsable and {} invalid",
                stats.lines_read, stats.stored, stats.parse_skipped, stats.invalid_skipped
            );
            if let Some(tx) = stats.last_tx {
                out.push_str(&format!(" (last tx {})", tx));
            }
            out
        }
    }
}

/// Format documents returned by `read`.
pub fn format_documents(documents: &[Vec<u8>], mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => pretty(&JsonValue::Array(
            documents.iter().map(|d| document_value(d)).collect(),
        )),
        OutputMode::Human => documents
            .iter()
            .map(|d| String::from_utf8_lossy(d).into_owned())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn history_value(record: &HistoryRecord) -> JsonValue {
    json!({
        "tx_id": record.tx_id.as_u64(),
        "revision": record.revision,
        "entry": document_value(&record.entry),
    })
}

/// Format revisions returned by `history`, one record per line.
pub fn format_history(records: &[HistoryRecord], mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => pretty(&JsonValue::Array(
            records.iter().map(history_value).collect(),
        )),
        OutputMode::Human => records
            .iter()
            .map(|r| history_value(r).to_string())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Format collection names.
pub fn format_collections(names: &[String], mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => pretty(&json!(names)),
        OutputMode::Human => names.join("\n"),
    }
}
