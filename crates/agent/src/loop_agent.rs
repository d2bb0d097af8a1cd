//! Agent loop - the think/act/observe cycle
//!
//! One `run` walks THINKING -> ACTING -> OBSERVING until the model emits the
//! terminal action or the step budget is exhausted. Budget exhaustion is not
//! an error: the caller always gets a reply string.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use stepwise_memory::{MemoryStore, ShortTermMemory};
use stepwise_provider::{ChatModel, Completion};
use stepwise_template::TemplateBuilder;

use crate::action::format_instructions;
use crate::dispatch::dispatch;
use crate::parser::RobustActionParser;
use crate::sink::{NullSink, OutputSink};
use crate::tools::Toolbox;
use crate::{AgentError, Result};

/// Reply returned when the step budget runs out before the terminal action.
pub const APOLOGY_REPLY: &str =
    "Sorry, I was unable to complete the task within the allotted reasoning steps.";

const DEFAULT_MAIN_TEMPLATE: &str = "main.json";
const DEFAULT_FINAL_TEMPLATE: &str = "final_step.json";

/// The reasoning agent.
///
/// The toolbox and provider are shared read-only; every call to [`Agent::run`]
/// owns its own template bindings and short-term memory, so independent runs
/// may execute concurrently.
pub struct Agent {
    model: Arc<dyn ChatModel>,
    prompts_dir: PathBuf,
    main_template_file: String,
    final_template_file: String,
    toolbox: Toolbox,
    work_dir: PathBuf,
    max_thought_steps: usize,
    memory_token_budget: usize,
    long_term: Option<Arc<dyn MemoryStore>>,
    sink: Arc<dyn OutputSink>,
    step_timeout: Option<Duration>,
}

impl Agent {
    pub fn new(model: Arc<dyn ChatModel>, prompts_dir: impl AsRef<Path>, toolbox: Toolbox) -> Self {
        Self {
            model,
            prompts_dir: prompts_dir.as_ref().to_path_buf(),
            main_template_file: DEFAULT_MAIN_TEMPLATE.to_string(),
            final_template_file: DEFAULT_FINAL_TEMPLATE.to_string(),
            toolbox,
            work_dir: PathBuf::from("./data"),
            max_thought_steps: 10,
            memory_token_budget: stepwise_memory::DEFAULT_TOKEN_BUDGET,
            long_term: None,
            sink: Arc::new(NullSink),
            step_timeout: None,
        }
    }

    /// Set the directory exposed to the model as its working area.
    pub fn with_work_dir(mut self, work_dir: impl AsRef<Path>) -> Self {
        self.work_dir = work_dir.as_ref().to_path_buf();
        self
    }

    /// Set the reasoning step budget.
    pub fn with_max_thought_steps(mut self, max: usize) -> Self {
        self.max_thought_steps = max;
        self
    }

    /// Set the short-term memory token budget.
    pub fn with_memory_token_budget(mut self, budget: usize) -> Self {
        self.memory_token_budget = budget;
        self
    }

    /// Attach a long-term memory store.
    pub fn with_long_term_memory(mut self, store: Arc<dyn MemoryStore>) -> Self {
        self.long_term = Some(store);
        self
    }

    /// Replace the output sink.
    pub fn with_sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Set a per-model-call deadline.
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }

    /// Override the main and final template file names.
    pub fn with_template_files(
        mut self,
        main_template_file: impl Into<String>,
        final_template_file: impl Into<String>,
    ) -> Self {
        self.main_template_file = main_template_file.into();
        self.final_template_file = final_template_file.into();
        self
    }

    /// Run one task to completion and return the reply.
    ///
    /// `verbose` only controls whether intermediate thoughts and observations
    /// are echoed to the sink; the returned data is unaffected.
    pub async fn run(&self, task: &str, verbose: bool) -> Result<String> {
        let run_id = Uuid::new_v4();
        info!(%run_id, "starting run");

        let long_term_snippet = match &self.long_term {
            Some(store) => store
                .retrieve(task, 1)
                .await
                .map_err(|e| AgentError::Memory(e.to_string()))?,
            None => String::new(),
        };

        let template = TemplateBuilder::new(&self.prompts_dir, &self.main_template_file)
            .tools(self.toolbox.descriptions())
            .format_instructions(&format_instructions())
            .build()?
            .bind([
                ("work_dir", self.work_dir.display().to_string()),
                ("task_description", task.to_string()),
            ]);

        let parser = RobustActionParser::new(self.model.clone());
        let mut memory = ShortTermMemory::new(self.memory_token_budget);

        let mut reply = APOLOGY_REPLY.to_string();
        let mut step = 0;

        while step < self.max_thought_steps {
            if verbose {
                self.sink.round(step + 1);
            }

            let mut vars = HashMap::new();
            vars.insert("short_term_memory".to_string(), memory.render());
            vars.insert("long_term_memory".to_string(), long_term_snippet.clone());
            let prompt = template.render(&vars)?;

            let response = self.call_model(&prompt, verbose).await?;
            let action = parser.parse(&response).await?;
            debug!(%run_id, "step {} selected action '{}'", step + 1, action.name);

            if action.is_terminal() {
                reply = self.final_step(task, &memory).await?;
                break;
            }

            let observation = dispatch(&self.toolbox, &action).await;
            if verbose {
                self.sink.observation(&observation);
            }

            memory.record_step(&response, &format!("result:\n{}", observation));
            step += 1;
        }

        if step >= self.max_thought_steps {
            warn!(%run_id, "step budget of {} exhausted", self.max_thought_steps);
        }

        if let Some(store) = &self.long_term {
            store
                .persist(task, &reply)
                .await
                .map_err(|e| AgentError::Memory(e.to_string()))?;
        }

        info!(%run_id, "run finished after {} steps", step);
        Ok(reply)
    }

    /// Call the model and drain the completion fully, echoing streamed chunks
    /// to the sink when `echo` is set.
    async fn call_model(&self, prompt: &str, echo: bool) -> Result<String> {
        let call = async {
            let completion = self
                .model
                .complete(prompt)
                .await
                .map_err(|e| AgentError::Provider(e.to_string()))?;

            match completion {
                Completion::Text(text) => {
                    if echo {
                        self.sink.thought(&text);
                    }
                    Ok(text)
                }
                Completion::Stream(mut rx) => {
                    let mut response = String::new();
                    while let Some(chunk) = rx.recv().await {
                        let chunk = chunk.map_err(|e| AgentError::Provider(e.to_string()))?;
                        if echo {
                            self.sink.thought(&chunk);
                        }
                        response.push_str(&chunk);
                    }
                    Ok(response)
                }
            }
        };

        match self.step_timeout {
            Some(deadline) => tokio::time::timeout(deadline, call)
                .await
                .map_err(|_| AgentError::Timeout)?,
            None => call.await,
        }
    }

    /// Produce the final answer from the full scratchpad.
    async fn final_step(&self, task: &str, memory: &ShortTermMemory) -> Result<String> {
        let template = TemplateBuilder::new(&self.prompts_dir, &self.final_template_file).build()?;

        let mut vars = HashMap::new();
        vars.insert("task_description".to_string(), task.to_string());
        vars.insert("short_term_memory".to_string(), memory.render());
        let prompt = template.render(&vars)?;

        self.call_model(&prompt, false).await
    }
}
