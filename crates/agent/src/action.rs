//! Action schema
//!
//! The structured representation of what the model decided to do: one tool
//! name and its argument mapping. Constructed once per step by the parser,
//! consumed by the dispatcher or by terminal-action detection.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Reserved action name signaling the agent should stop reasoning and
/// produce the final answer.
pub const FINISH_NAME: &str = "FINISH";

/// One tool-selection decision extracted from model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Name of the selected tool
    pub name: String,
    /// Arguments for the tool, keyed by parameter name
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl Action {
    pub fn new(name: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// An action with no arguments.
    pub fn bare(name: impl Into<String>) -> Self {
        Self::new(name, Map::new())
    }

    /// Whether this action ends the reasoning loop.
    pub fn is_terminal(&self) -> bool {
        self.name == FINISH_NAME
    }
}

/// Human-readable instructions telling the model how to format an action.
pub fn format_instructions() -> String {
    let schema = json!({
        "type": "object",
        "properties": {
            "name": { "type": "string", "description": "name of the selected tool" },
            "args": { "type": "object", "description": "arguments for the tool, keyed by parameter name" }
        },
        "required": ["name"]
    });

    format!(
        "Reply with a single JSON object describing exactly one action. \
         It must conform to this schema:\n{}\nExample:\n{}",
        schema,
        json!({ "name": "list_dir", "args": { "path": "." } })
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_deserializes_without_args() {
        let action: Action = serde_json::from_str(r#"{ "name": "FINISH" }"#).unwrap();
        assert_eq!(action.name, "FINISH");
        assert!(action.args.is_empty());
    }

    #[test]
    fn test_action_round_trip() {
        let mut args = Map::new();
        args.insert("path".to_string(), json!("./data"));
        let action = Action::new("list_dir", args);

        let text = serde_json::to_string(&action).unwrap();
        let restored: Action = serde_json::from_str(&text).unwrap();
        assert_eq!(restored, action);
    }

    #[test]
    fn test_is_terminal() {
        assert!(Action::bare(FINISH_NAME).is_terminal());
        assert!(!Action::bare("list_dir").is_terminal());
    }

    #[test]
    fn test_format_instructions_mention_schema_fields() {
        let instructions = format_instructions();
        assert!(instructions.contains("\"name\""));
        assert!(instructions.contains("\"args\""));
        assert!(instructions.contains("list_dir"));
    }
}
