//! Tool capability interface and registry

pub mod inspect;

pub use inspect::{FinishTool, ListDirTool, ReadFileTool};

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

/// Tool failures.
///
/// Both variants are absorbed by the dispatcher and turned into observation
/// text; they never cross the loop boundary.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    Validation(String),

    #[error("execution failed: {0}")]
    Execution(String),
}

impl From<serde_json::Error> for ToolError {
    fn from(e: serde_json::Error) -> Self {
        ToolError::Validation(e.to_string())
    }
}

impl From<std::io::Error> for ToolError {
    fn from(e: std::io::Error) -> Self {
        ToolError::Execution(e.to_string())
    }
}

/// A capability the model can select by name.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn invoke(&self, args: &Map<String, Value>) -> std::result::Result<String, ToolError>;
}

/// The fixed tool set for a run.
///
/// Registration order is significant: it drives the advertised tool list, and
/// resolution is a linear scan where the first name match wins.
#[derive(Default)]
pub struct Toolbox {
    tools: Vec<Arc<dyn Tool>>,
}

impl Toolbox {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.push(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    /// Resolve a tool by exact name; first match wins.
    pub fn find(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    /// `(name, description)` pairs in registration order.
    pub fn descriptions(&self) -> Vec<(String, String)> {
        self.tools
            .iter()
            .map(|tool| (tool.name().to_string(), tool.description().to_string()))
            .collect()
    }

    /// Tool names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|tool| tool.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DummyTool {
        name: &'static str,
        reply: &'static str,
    }

    #[async_trait]
    impl Tool for DummyTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "a dummy"
        }
        async fn invoke(
            &self,
            _args: &Map<String, Value>,
        ) -> std::result::Result<String, ToolError> {
            Ok(self.reply.to_string())
        }
    }

    #[test]
    fn test_registration_order_preserved() {
        let mut toolbox = Toolbox::new();
        toolbox.register(DummyTool { name: "b", reply: "" });
        toolbox.register(DummyTool { name: "a", reply: "" });
        toolbox.register(DummyTool { name: "c", reply: "" });

        assert_eq!(toolbox.names(), vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn test_find_first_match_wins() {
        let mut toolbox = Toolbox::new();
        toolbox.register(DummyTool { name: "dup", reply: "first" });
        toolbox.register(DummyTool { name: "dup", reply: "second" });

        let tool = toolbox.find("dup").unwrap();
        let reply = tool.invoke(&Map::new()).await.unwrap();
        assert_eq!(reply, "first");
    }

    #[test]
    fn test_find_missing() {
        let toolbox = Toolbox::new();
        assert!(toolbox.find("nothing").is_none());
        assert!(toolbox.is_empty());
    }
}
