//! Tool dispatcher
//!
//! The loop's only feedback channel to the model is text, so dispatch never
//! raises: every failure crossing the tool-invocation boundary is converted
//! into a descriptive observation string.

use serde_json::Value;
use tracing::debug;

use crate::action::Action;
use crate::tools::{ToolError, Toolbox};

/// Execute an action and return the observation.
pub async fn dispatch(toolbox: &Toolbox, action: &Action) -> String {
    let Some(tool) = toolbox.find(&action.name) else {
        return format!(
            "There is no tool named '{}'. Select your next action from the available tools: {}.",
            action.name,
            toolbox.names().join(", ")
        );
    };

    debug!("dispatching {} with {} args", action.name, action.args.len());

    match tool.invoke(&action.args).await {
        Ok(observation) => observation,
        Err(ToolError::Validation(message)) => format!(
            "The arguments for '{}' were rejected: {}. You supplied: {}",
            action.name,
            message,
            args_text(action)
        ),
        Err(ToolError::Execution(message)) => format!(
            "Tool '{}' failed while executing: {}. Arguments were: {}",
            action.name,
            message,
            args_text(action)
        ),
    }
}

fn args_text(action: &Action) -> String {
    serde_json::to_string(&Value::Object(action.args.clone()))
        .unwrap_or_else(|_| "{}".to_string())
}
