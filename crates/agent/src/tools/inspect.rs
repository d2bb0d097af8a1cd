//! Bundled inspection tools
//!
//! Enough capability to make a run useful out of the box: directory listing,
//! file reading, and the finish placeholder that advertises the terminal
//! action in the tool list.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::debug;

use super::{Tool, ToolError};
use crate::action::FINISH_NAME;

fn decode_args<T: for<'de> Deserialize<'de>>(
    args: &Map<String, Value>,
) -> std::result::Result<T, ToolError> {
    Ok(serde_json::from_value(Value::Object(args.clone()))?)
}

/// Lists file names in a directory under the work dir.
pub struct ListDirTool {
    work_dir: PathBuf,
}

impl ListDirTool {
    pub fn new(work_dir: PathBuf) -> Self {
        Self { work_dir }
    }
}

#[derive(Deserialize)]
struct ListDirArgs {
    #[serde(default = "default_path")]
    path: String,
}

fn default_path() -> String {
    ".".to_string()
}

#[async_trait]
impl Tool for ListDirTool {
    fn name(&self) -> &str {
        "list_dir"
    }

    fn description(&self) -> &str {
        "List all file names in a directory. Args: path (relative to the work directory, defaults to '.')."
    }

    async fn invoke(&self, args: &Map<String, Value>) -> std::result::Result<String, ToolError> {
        let args: ListDirArgs = decode_args(args)?;
        let path = self.work_dir.join(&args.path);
        debug!("listing {:?}", path);

        if !path.is_dir() {
            return Err(ToolError::Execution(format!(
                "'{}' is not a directory",
                args.path
            )));
        }

        let mut entries = tokio::fs::read_dir(&path).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();

        if names.is_empty() {
            Ok(format!("directory '{}' is empty", args.path))
        } else {
            Ok(names.join("\n"))
        }
    }
}

/// Reads a text file under the work dir.
pub struct ReadFileTool {
    work_dir: PathBuf,
}

impl ReadFileTool {
    pub fn new(work_dir: PathBuf) -> Self {
        Self { work_dir }
    }
}

#[derive(Deserialize)]
struct ReadFileArgs {
    path: String,
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read a text file and return its contents. Args: path (relative to the work directory)."
    }

    async fn invoke(&self, args: &Map<String, Value>) -> std::result::Result<String, ToolError> {
        let args: ReadFileArgs = decode_args(args)?;
        let path = self.work_dir.join(&args.path);
        debug!("reading {:?}", path);

        if !path.is_file() {
            return Err(ToolError::Execution(format!(
                "'{}' is not a readable file",
                args.path
            )));
        }

        Ok(tokio::fs::read_to_string(&path).await?)
    }
}

/// Placeholder advertising the terminal action.
///
/// The loop intercepts the FINISH action before dispatch; this tool exists
/// only so the terminal action shows up in the advertised tool list.
pub struct FinishTool;

#[async_trait]
impl Tool for FinishTool {
    fn name(&self) -> &str {
        FINISH_NAME
    }

    fn description(&self) -> &str {
        "Select this action when the task is fully solved and you are ready to give the final answer. Takes no arguments."
    }

    async fn invoke(&self, _args: &Map<String, Value>) -> std::result::Result<String, ToolError> {
        Err(ToolError::Execution(
            "FINISH is handled by the reasoning loop".to_string(),
        ))
    }
}
