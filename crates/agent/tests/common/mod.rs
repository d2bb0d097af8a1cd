//! Shared test doubles
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use stepwise_agent::{OutputSink, Tool, ToolError};
use stepwise_provider::{ChatModel, Completion, ProviderError};

/// A model that replays canned replies in order and records every prompt.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    streaming: bool,
}

impl ScriptedModel {
    pub fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
            streaming: false,
        })
    }

    /// Same, but replies arrive as a chunked stream.
    pub fn streaming(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
            streaming: true,
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> stepwise_provider::Result<Completion> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted model ran out of replies");

        if self.streaming {
            let chunks: Vec<String> = reply
                .as_bytes()
                .chunks(5)
                .map(|c| String::from_utf8_lossy(c).to_string())
                .collect();
            let (tx, rx) = mpsc::channel(chunks.len().max(1));
            for chunk in chunks {
                tx.try_send(Ok(chunk)).expect("channel sized for script");
            }
            Ok(Completion::Stream(rx))
        } else {
            Ok(Completion::Text(reply))
        }
    }
}

/// A model that never answers; used for deadline tests.
pub struct StalledModel;

#[async_trait]
impl ChatModel for StalledModel {
    async fn complete(&self, _prompt: &str) -> stepwise_provider::Result<Completion> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Err(ProviderError::InvalidResponse)
    }
}

/// A tool that records every invocation and returns a fixed observation.
pub struct RecordingTool {
    name: &'static str,
    reply: &'static str,
    calls: Arc<Mutex<Vec<Map<String, Value>>>>,
}

impl RecordingTool {
    pub fn new(name: &'static str, reply: &'static str) -> (Self, Arc<Mutex<Vec<Map<String, Value>>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                name,
                reply,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl Tool for RecordingTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "records invocations"
    }

    async fn invoke(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
        self.calls.lock().unwrap().push(args.clone());
        Ok(self.reply.to_string())
    }
}

/// A sink that collects everything it is given.
#[derive(Default)]
pub struct CollectingSink {
    pub thoughts: Mutex<String>,
    pub observations: Mutex<Vec<String>>,
    pub rounds: Mutex<Vec<usize>>,
}

impl OutputSink for CollectingSink {
    fn round(&self, index: usize) {
        self.rounds.lock().unwrap().push(index);
    }

    fn thought(&self, chunk: &str) {
        self.thoughts.lock().unwrap().push_str(chunk);
    }

    fn observation(&self, text: &str) {
        self.observations.lock().unwrap().push(text.to_string());
    }
}

/// Write a minimal prompt set into `dir`.
///
/// The main template pipes every injected variable through so tests can
/// assert on the rendered prompt; the final template is prefixed so tests can
/// tell the two apart.
pub fn write_prompts(dir: &std::path::Path) {
    std::fs::write(
        dir.join("main.json"),
        r#"{
  "template": "MAIN|{work_dir}|{task_description}|{tools}|{format_instructions}|{long_term_memory}|{short_term_memory}",
  "input_variables": ["work_dir", "task_description", "tools", "format_instructions", "long_term_memory", "short_term_memory"]
}"#,
    )
    .expect("write main.json");

    std::fs::write(
        dir.join("final_step.json"),
        r#"{
  "template": "FINAL|{task_description}|{short_term_memory}",
  "input_variables": ["task_description", "short_term_memory"]
}"#,
    )
    .expect("write final_step.json");
}
