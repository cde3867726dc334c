//! Tree normalisation: fold runs of text leaves in a pandoc JSON tree.
//!
//! Pandoc emits every word and every inter-word gap as its own node, so a
//! ten-word sentence becomes nineteen inline elements:
//!
//! ```text
//! [Str "a", Space, Str "b", SoftBreak, Str "c"]  ──▶  [Str "a b c"]
//! ```
//!
//! Folding them back into single `Str` leaves shrinks the tree (and the cache
//! file) considerably without changing the rendered text. Pandoc itself
//! leaves this to consumers because filters rely on the split form.
//!
//! The walk is plain structural recursion over [`serde_json::Value`]:
//!
//! | Value | Treatment |
//! |-------|-----------|
//! | array | folded right-to-left, elements normalised recursively |
//! | object | every field value normalised, key order kept |
//! | anything else | returned unchanged |
//!
//! An array holding `null` anywhere is returned untouched: a partially
//! malformed sequence is never partially folded.

use serde_json::{Map, Value};

/// Key holding a node's type tag.
pub const TAG: &str = "t";
/// Key holding a node's content.
pub const CONTENT: &str = "c";

/// Whitespace leaves that fold into a single space.
const WHITESPACE_TAGS: [&str; 2] = ["Space", "SoftBreak"];
const TEXT_TAG: &str = "Str";

/// Normalise any tree value, returning a new tree.
pub fn collapse_spaces(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(fold_spaces(items)),
        Value::Object(fields) => Value::Object(collapse_object(fields)),
        other => other.clone(),
    }
}

/// Fold a sequence of sibling nodes.
pub fn fold_spaces(items: &[Value]) -> Vec<Value> {
    if items.iter().any(Value::is_null) {
        return items.to_vec();
    }

    let mut folded: Vec<Value> = Vec::with_capacity(items.len());
    for item in items.iter().rev() {
        let item = if is_whitespace(item) {
            text_node(" ".to_string())
        } else {
            item.clone()
        };

        // `folded` is built reversed, so its last element is the head.
        if let (Some(before), Some(head)) = (text_of(&item), folded.last().and_then(text_of)) {
            let merged = text_node(format!("{before}{head}"));
            if let Some(last) = folded.last_mut() {
                *last = merged;
            }
        } else {
            folded.push(collapse_spaces(&item));
        }
    }
    folded.reverse();
    folded
}

fn collapse_object(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), collapse_spaces(v)))
        .collect()
}

/// Build a `Str` leaf.
pub fn text_node(text: String) -> Value {
    let mut node = Map::with_capacity(2);
    node.insert(TAG.to_string(), Value::String(TEXT_TAG.to_string()));
    node.insert(CONTENT.to_string(), Value::String(text));
    Value::Object(node)
}

/// The tag of a node, if `value` is one.
pub fn tag_of(value: &Value) -> Option<&str> {
    value.get(TAG).and_then(Value::as_str)
}

fn is_whitespace(value: &Value) -> bool {
    tag_of(value).is_some_and(|t| WHITESPACE_TAGS.contains(&t))
}

/// The string content of a `Str` leaf.
fn text_of(value: &Value) -> Option<&str> {
    if tag_of(value) == Some(TEXT_TAG) {
        value.get(CONTENT).and_then(Value::as_str)
    } else {
        None
    }
}

/// Concatenate the text of a tree in reading order.
///
/// `Str` leaves contribute their content, whitespace leaves a single space.
pub fn plain_text(value: &Value) -> String {
    let mut out = String::new();
    push_text(value, &mut out);
    out
}

fn push_text(value: &Value, out: &mut String) {
    if let Some(text) = text_of(value) {
        out.push_str(text);
        return;
    }
    if is_whitespace(value) {
        out.push(' ');
        return;
    }
    match value {
        Value::Array(items) => items.iter().for_each(|v| push_text(v, out)),
        Value::Object(fields) => fields.values().for_each(|v| push_text(v, out)),
        _ => {}
    }
}
