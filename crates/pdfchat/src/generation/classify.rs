//! Shape classifiers for heterogeneous Ollama payloads
//!
//! The service returns different JSON shapes depending on endpoint and model.
//! Each classifier is a pure function over the parsed payload returning the
//! extracted text when its shape matches, so normalization stays testable
//! without any network code.

use serde_json::Value;

/// A streaming/partial generation payload: partial text plus completion flag.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamingPart {
    pub text: String,
    pub done: bool,
}

/// Streaming shape: `{"response": "...", "done": bool}`.
pub fn streaming_part(payload: &Value) -> Option<StreamingPart> {
    let text = payload.get("response")?;
    let done = payload.get("done")?;
    Some(StreamingPart {
        text: text.as_str().unwrap_or_default().to_string(),
        done: done.as_bool().unwrap_or(false),
    })
}

/// List-of-strings shape: `{"output": ["...", ...]}`, concatenated in order.
pub fn output_list(payload: &Value) -> Option<String> {
    let items = payload.get("output")?.as_array()?;
    let text: String = items
        .iter()
        .map(|item| item.as_str().unwrap_or_default())
        .collect();
    if text.trim().is_empty() {
        return None;
    }
    Some(text)
}

/// OpenAI choice-list shape: first choice, message content preferred over flat text.
pub fn choice_list(payload: &Value) -> Option<String> {
    let first = payload.get("choices")?.as_array()?.first()?;
    if let Some(content) = first.pointer("/message/content") {
        return Some(content.as_str().unwrap_or_default().to_string());
    }
    first
        .get("text")
        .map(|text| text.as_str().unwrap_or_default().to_string())
}

/// Result-list shape: `{"results": [{"content": "..."}]}`, first result only.
pub fn result_list(payload: &Value) -> Option<String> {
    let first = payload.get("results")?.as_array()?.first()?;
    first
        .get("content")
        .map(|content| content.as_str().unwrap_or_default().to_string())
}

/// Message-list shape: per message, any `text` field then any `content` field.
pub fn message_list(payload: &Value) -> Option<String> {
    let messages = payload.get("messages")?.as_array()?;
    let mut text = String::new();
    for message in messages {
        if let Some(part) = message.get("text") {
            text.push_str(part.as_str().unwrap_or_default());
        }
        if let Some(part) = message.get("content") {
            text.push_str(part.as_str().unwrap_or_default());
        }
    }
    if text.is_empty() {
        return None;
    }
    Some(text)
}

/// Apply the non-streaming classifiers in priority order.
pub fn classify(payload: &Value) -> Option<String> {
    output_list(payload)
        .or_else(|| choice_list(payload))
        .or_else(|| result_list(payload))
        .or_else(|| message_list(payload))
}

/// Normalize an embedding payload to a numeric vector.
///
/// Accepted shapes, checked in order: a direct `embedding` array; an
/// `embeddings` array (first element when it is an array of arrays); a `data`
/// array whose first record carries an `embedding`. Returns `None` when no
/// shape matches or the matched value is not numeric.
pub fn embedding_vector(payload: &Value) -> Option<Vec<f32>> {
    if let Some(items) = payload.get("embedding").and_then(Value::as_array) {
        return numeric_vector(items);
    }

    if let Some(items) = payload.get("embeddings").and_then(Value::as_array) {
        let node = match items.first() {
            Some(first) if first.is_array() => first.as_array().unwrap_or(items),
            _ => items,
        };
        return numeric_vector(node);
    }

    if let Some(first) = payload.get("data").and_then(Value::as_array).and_then(|a| a.first()) {
        if let Some(items) = first.get("embedding").and_then(Value::as_array) {
            return numeric_vector(items);
        }
    }

    None
}

fn numeric_vector(items: &[Value]) -> Option<Vec<f32>> {
    items
        .iter()
        .map(|item| item.as_f64().map(|f| f as f32))
        .collect()
}
