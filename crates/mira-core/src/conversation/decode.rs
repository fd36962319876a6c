//! Decoding of server-side history entries.
//!
//! The backend has stored history in two encodings over time:
//!
//! ```text
//! "User: How to add a region?"                     legacy string form
//! {"role": "assistant", "content": "...", "data": {...}}   structured form
//! ```
//!
//! Both decode into [`Message`]; nothing past this boundary sees the legacy form.

use super::message::{Message, MessageRole};
use crate::response::TypedResponse;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static LEGACY_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^(User|Assistant):\s?(.*)$").expect("valid legacy entry regex"));

/// Decodes a single history entry, returning `None` for unknown or malformed entries.
pub fn decode_entry(entry: &Value) -> Option<Message> {
    match entry {
        Value::String(line) => decode_legacy(line),
        Value::Object(map) => {
            let role = map.get("role")?.as_str()?.parse::<MessageRole>().ok()?;
            let content = match map.get("content") {
                Some(Value::String(content)) => content.clone(),
                None | Some(Value::Null) => String::new(),
                Some(_) => return None,
            };
            // A data blob the client cannot decode does not invalidate the message itself.
            let data = map
                .get("data")
                .filter(|data| !data.is_null())
                .and_then(|data| match TypedResponse::from_value(data.clone()) {
                    Ok(response) => Some(response),
                    Err(e) => {
                        tracing::debug!("[HistoryDecode] Dropping undecodable data: {}", e);
                        None
                    }
                });
            Some(Message::new(role, content, data))
        }
        _ => None,
    }
}

fn decode_legacy(line: &str) -> Option<Message> {
    let captures = LEGACY_ENTRY.captures(line)?;
    let content = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
    match &captures[1] {
        "User" => Some(Message::user(content)),
        "Assistant" => Some(Message::assistant(content, None)),
        _ => None,
    }
}

/// Decodes a full server history, silently skipping entries that do not decode.
pub fn decode_history<'a>(entries: impl IntoIterator<Item = &'a Value>) -> Vec<Message> {
    let mut skipped = 0usize;
    let messages: Vec<Message> = entries
        .into_iter()
        .filter_map(|entry| {
            let message = decode_entry(entry);
            if message.is_none() {
                skipped += 1;
            }
            message
        })
        .collect();

    if skipped > 0 {
        tracing::debug!("[HistoryDecode] Skipped {} malformed history entries", skipped);
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_and_structured_forms_are_equivalent() {
        let legacy = json!(["User: hi", {"role": "assistant", "content": "hello"}]);
        let structured = json!([
            {"role": "user", "content": "hi"},
            {"role": "assistant", "content": "hello"}
        ]);

        let from_legacy = decode_history(legacy.as_array().unwrap());
        let from_structured = decode_history(structured.as_array().unwrap());

        assert_eq!(from_legacy, from_structured);
        assert_eq!(from_legacy.len(), 2);
        assert_eq!(from_legacy[0].role(), MessageRole::User);
        assert_eq!(from_legacy[0].content(), "hi");
    }

    #[test]
    fn test_legacy_keeps_multiline_content() {
        let message = decode_entry(&json!("Assistant: line one\nline two")).unwrap();
        assert_eq!(message.role(), MessageRole::Assistant);
        assert_eq!(message.content(), "line one\nline two");
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let entries = json!([
            "System: booting",
            "no prefix at all",
            {"role": "tool", "content": "x"},
            {"content": "missing role"},
            {"role": "user", "content": 42},
            7,
            null,
            {"role": "user", "content": "kept"}
        ]);
        let messages = decode_history(entries.as_array().unwrap());
        assert_eq!(messages, vec![Message::user("kept")]);
    }

    #[test]
    fn test_structured_data_is_decoded_when_valid() {
        let entry = json!({
            "role": "assistant",
            "content": "Sure!",
            "data": {"type": "tutorial", "content": "Sure!", "steps": [{"step_number": 1, "text": "Open"}]}
        });
        let message = decode_entry(&entry).unwrap();
        assert!(matches!(message.data(), Some(TypedResponse::Tutorial(_))));

        let entry = json!({"role": "assistant", "content": "Sure!", "data": "garbage"});
        let message = decode_entry(&entry).unwrap();
        assert!(message.data().is_none());
        assert_eq!(message.content(), "Sure!");
    }
}
