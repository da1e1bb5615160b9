//! Completion text extraction from vendor response envelopes.

use serde_json::Value;

/// Result of looking for completion text in a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Text found under a known key
    Text(String),
    /// No known key; the whole body, stringified
    Unrecognized(String),
}

/// Keys holding a list whose first element carries the text, with the path
/// to the text inside that element.
const LIST_KEYS: &[(&str, &[&str])] = &[
    ("content", &["text"]),
    ("choices", &["message", "content"]),
    ("results", &["outputText"]),
    ("generations", &["text"]),
];

/// Extract the completion text from a response body.
///
/// Known shapes are checked in a fixed order; the first key present wins.
/// A known key whose nested text is missing is an error.
pub fn extract_completion(body: &Value) -> Result<Completion, String> {
    for (key, path) in LIST_KEYS {
        if let Some(items) = body.get(*key).and_then(Value::as_array) {
            return first_item_text(key, items, path).map(Completion::Text);
        }
    }

    if let Some(value) = body.get("generation") {
        return Ok(Completion::Text(value_text(value)));
    }

    if let Some(items) = body.get("completions").and_then(Value::as_array) {
        return first_item_text("completions", items, &["data", "text"]).map(Completion::Text);
    }

    for key in ["completion", "generated_text"] {
        if let Some(value) = body.get(key) {
            return Ok(Completion::Text(value_text(value)));
        }
    }

    Ok(Completion::Unrecognized(body.to_string()))
}

fn first_item_text(key: &str, items: &[Value], path: &[&str]) -> Result<String, String> {
    let first = items
        .first()
        .ok_or_else(|| format!("response field '{key}' is an empty list"))?;

    let mut current = first;
    for segment in path {
        current = current
            .get(*segment)
            .ok_or_else(|| format!("response field '{key}[0]' has no '{}'", path.join(".")))?;
    }
    Ok(value_text(current))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(body: Value) -> String {
        match extract_completion(&body).unwrap() {
            Completion::Text(t) => t,
            Completion::Unrecognized(raw) => panic!("unrecognized: {raw}"),
        }
    }

    #[test]
    fn test_claude_content_blocks() {
        let body = json!({"content": [{"type": "text", "text": "plan"}, {"type": "text", "text": "x"}]});
        assert_eq!(text(body), "plan");
    }

    #[test]
    fn test_openai_style_choices() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "answer"}}]});
        assert_eq!(text(body), "answer");
    }

    #[test]
    fn test_remaining_shapes() {
        assert_eq!(text(json!({"results": [{"outputText": "titan"}]})), "titan");
        assert_eq!(text(json!({"generations": [{"text": "cohere"}]})), "cohere");
        assert_eq!(text(json!({"generation": "llama"})), "llama");
        assert_eq!(text(json!({"completions": [{"data": {"text": "ai21"}}]})), "ai21");
        assert_eq!(text(json!({"completion": "legacy"})), "legacy");
        assert_eq!(text(json!({"generated_text": "hf"})), "hf");
    }

    #[test]
    fn test_first_present_key_wins() {
        let body = json!({"completion": "later", "choices": [{"message": {"content": "earlier"}}]});
        assert_eq!(text(body), "earlier");
    }

    #[test]
    fn test_non_list_content_falls_through() {
        let body = json!({"content": "not a list", "completion": "fallback"});
        assert_eq!(text(body), "fallback");
    }

    #[test]
    fn test_unrecognized_body_is_stringified() {
        let body = json!({"output": {"message": "?"}});
        match extract_completion(&body).unwrap() {
            Completion::Unrecognized(raw) => assert!(raw.contains("\"output\"")),
            Completion::Text(t) => panic!("unexpected text: {t}"),
        }
    }

    #[test]
    fn test_empty_list_is_error() {
        let err = extract_completion(&json!({"content": []})).unwrap_err();
        assert!(err.contains("empty list"));
    }

    #[test]
    fn test_missing_nested_field_is_error() {
        let err = extract_completion(&json!({"choices": [{"delta": {}}]})).unwrap_err();
        assert!(err.contains("message.content"));
    }
}
