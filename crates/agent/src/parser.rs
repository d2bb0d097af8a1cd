//! Robust action parser
//!
//! Model output is free text. A strict decode is tried first; when it fails,
//! the model itself is asked once to reformat its reply to the schema. One
//! bounded repair pass buys most of the reliability without risking a retry
//! loop.

use regex::Regex;
use std::sync::Arc;
use tracing::{debug, warn};

use stepwise_provider::ChatModel;

use crate::action::{format_instructions, Action};
use crate::{AgentError, Result};

/// Parses raw model text into an [`Action`], with a one-shot model repair
/// pass for non-conforming output.
pub struct RobustActionParser {
    model: Arc<dyn ChatModel>,
}

impl RobustActionParser {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Parse `raw`, repairing once on failure.
    ///
    /// Fails with [`AgentError::Unparsable`] carrying the original text only
    /// after the repaired text also fails strict decoding.
    pub async fn parse(&self, raw: &str) -> Result<Action> {
        if let Some(action) = decode_action(raw) {
            return Ok(action);
        }

        debug!("strict decode failed, asking the model to repair its output");
        let repaired = self
            .model
            .complete(&repair_prompt(raw))
            .await
            .map_err(|e| AgentError::Provider(e.to_string()))?
            .into_text()
            .await
            .map_err(|e| AgentError::Provider(e.to_string()))?;

        decode_action(&repaired).ok_or_else(|| {
            warn!("repair pass did not produce a valid action");
            AgentError::Unparsable {
                raw: raw.to_string(),
            }
        })
    }
}

fn repair_prompt(raw: &str) -> String {
    format!(
        "The reply below was supposed to be a single JSON action but does not \
         conform to the expected format.\n\n{}\n\nFaulty reply:\n{}\n\n\
         Return only the corrected JSON object, nothing else.",
        format_instructions(),
        raw
    )
}

/// Strict decode: the whole text, then fenced code blocks, then the first
/// balanced JSON object found in the text.
fn decode_action(text: &str) -> Option<Action> {
    for candidate in candidates(text) {
        if let Ok(action) = serde_json::from_str::<Action>(&candidate) {
            if !action.name.trim().is_empty() {
                return Some(action);
            }
        }
    }
    None
}

fn candidates(text: &str) -> Vec<String> {
    let mut out = vec![text.trim().to_string()];

    let fence = Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("valid fence pattern");
    for capture in fence.captures_iter(text) {
        out.push(capture[1].trim().to_string());
    }

    if let Some(object) = first_json_object(text) {
        out.push(object.to_string());
    }

    out
}

/// First balanced `{...}` span, respecting strings and escapes.
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_json() {
        let action = decode_action(r#"{ "name": "list_dir", "args": { "path": "." } }"#).unwrap();
        assert_eq!(action.name, "list_dir");
        assert_eq!(action.args["path"], ".");
    }

    #[test]
    fn test_decode_fenced_json() {
        let text = "Here is my choice:\n```json\n{ \"name\": \"FINISH\" }\n```\nDone.";
        let action = decode_action(text).unwrap();
        assert_eq!(action.name, "FINISH");
    }

    #[test]
    fn test_decode_embedded_object() {
        let text = "I will list the directory. { \"name\": \"list_dir\", \"args\": {} } That is all.";
        let action = decode_action(text).unwrap();
        assert_eq!(action.name, "list_dir");
    }

    #[test]
    fn test_decode_rejects_empty_name() {
        assert!(decode_action(r#"{ "name": "" }"#).is_none());
        assert!(decode_action(r#"{ "name": "   " }"#).is_none());
    }

    #[test]
    fn test_decode_rejects_prose() {
        assert!(decode_action("I am not sure what to do next.").is_none());
    }

    #[test]
    fn test_first_json_object_respects_strings() {
        let text = r#"noise { "name": "x", "args": { "q": "brace } inside" } } tail"#;
        let object = first_json_object(text).unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(object).is_ok());
    }

    #[test]
    fn test_first_json_object_unbalanced() {
        assert!(first_json_object("{ \"name\": ").is_none());
    }

    #[test]
    fn test_repair_prompt_carries_raw_text() {
        let prompt = repair_prompt("garbled output");
        assert!(prompt.contains("garbled output"));
        assert!(prompt.contains("\"name\""));
    }
}
