//! Bounded-iteration reasoning agent
//!
//! The loop asks the model to pick one action from a fixed tool set, executes
//! it, folds the observation back into short-term memory, and stops on the
//! terminal action or when the step budget runs out.

use thiserror::Error;

pub mod action;
pub mod dispatch;
pub mod loop_agent;
pub mod parser;
pub mod sink;
pub mod tools;

pub use action::{format_instructions, Action, FINISH_NAME};
pub use dispatch::dispatch;
pub use loop_agent::{Agent, APOLOGY_REPLY};
pub use parser::RobustActionParser;
pub use sink::{ConsoleSink, NullSink, OutputSink};
pub use tools::{Tool, ToolError, Toolbox};

/// Agent errors surfaced to the caller.
///
/// Tool failures are not here: the dispatcher converts them into observation
/// strings so the model can react to them.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("template error: {0}")]
    Template(#[from] stepwise_template::TemplateError),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("model output could not be parsed into an action even after repair:\n{raw}")]
    Unparsable { raw: String },

    #[error("model call exceeded its deadline")]
    Timeout,

    #[error("memory store error: {0}")]
    Memory(String),
}

pub type Result<T> = std::result::Result<T, AgentError>;
