//! Prompt template loading and composition
//!
//! Templates are JSON definition files living in a prompt directory. A
//! definition carries literal text with `{slot}` placeholders and declares the
//! variable names it references. Declared variables resolve, in order of
//! preference, to a sibling sub-template (`<name>.json`), a verbatim text
//! fragment (`<name>.txt`), a computed binding (tool list, format
//! instructions), or stay open for render time.

use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

pub mod builder;

pub use builder::{normalize_json_lines, render_tool_lines, TemplateBuilder};

/// Template errors
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template file not found: {0}")]
    NotFound(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid template definition: {0}")]
    Json(#[from] serde_json::Error),

    #[error("template {0} has neither inline text nor a template_path")]
    NoText(PathBuf),

    #[error("variable not supplied at render time: {0}")]
    MissingVariable(String),
}

pub type Result<T> = std::result::Result<T, TemplateError>;

/// One piece of a parsed template: literal text or a named variable slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    Slot(String),
}

/// A composed prompt template.
///
/// Holds the parsed segment sequence, variables bound so far (`partials`), and
/// owned sub-templates whose rendered output fills the matching slot. Slots
/// that are neither bound nor backed by a sub-template are open and must be
/// supplied to [`PromptTemplate::render`].
#[derive(Debug, Clone, Default)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
    partials: HashMap<String, String>,
    pipeline: Vec<(String, PromptTemplate)>,
}

impl PromptTemplate {
    /// Parse literal text into segments.
    ///
    /// `{name}` marks a slot; `{{` and `}}` escape literal braces. A brace
    /// that does not open a well-formed slot is kept as literal text.
    pub fn parse(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = text;

        while let Some(pos) = rest.find(['{', '}']) {
            literal.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if let Some(after) = tail.strip_prefix("{{") {
                literal.push('{');
                rest = after;
            } else if let Some(after) = tail.strip_prefix("}}") {
                literal.push('}');
                rest = after;
            } else if let Some(after) = tail.strip_prefix('}') {
                literal.push('}');
                rest = after;
            } else {
                // single '{': a slot only if a well-formed identifier follows
                match tail[1..].find('}') {
                    Some(end) if is_identifier(&tail[1..1 + end]) => {
                        if !literal.is_empty() {
                            segments.push(Segment::Literal(std::mem::take(&mut literal)));
                        }
                        segments.push(Segment::Slot(tail[1..1 + end].to_string()));
                        rest = &tail[end + 2..];
                    }
                    _ => {
                        literal.push('{');
                        rest = &tail[1..];
                    }
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            segments,
            partials: HashMap::new(),
            pipeline: Vec::new(),
        }
    }

    /// Every slot name referenced by the literal text, in first-appearance
    /// order, without duplicates.
    pub fn slots(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for segment in &self.segments {
            if let Segment::Slot(name) = segment {
                if !seen.contains(name) {
                    seen.push(name.clone());
                }
            }
        }
        seen
    }

    /// Slots still awaiting a value: referenced in the text but neither bound
    /// as a partial nor backed by a sub-template.
    pub fn open_variables(&self) -> Vec<String> {
        self.slots()
            .into_iter()
            .filter(|name| {
                !self.partials.contains_key(name)
                    && !self.pipeline.iter().any(|(sub, _)| sub == name)
            })
            .collect()
    }

    /// Merge late-bound values into the template's partial bindings.
    pub fn bind<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in vars {
            self.partials.insert(key.into(), value.into());
        }
        self
    }

    /// Register a sub-template whose rendered output fills `slot`.
    pub fn add_sub_template(&mut self, slot: impl Into<String>, template: PromptTemplate) {
        self.pipeline.push((slot.into(), template));
    }

    /// Render the template to its final string.
    ///
    /// Sub-templates render first, each against the merged binding context
    /// (this template's partials plus `vars`), and their output fills the
    /// matching slot. Remaining slots resolve from the merged context; an
    /// unresolved slot fails with [`TemplateError::MissingVariable`].
    pub fn render(&self, vars: &HashMap<String, String>) -> Result<String> {
        let mut context = self.partials.clone();
        for (key, value) in vars {
            context.insert(key.clone(), value.clone());
        }

        let mut sub_output: HashMap<String, String> = HashMap::new();
        for (slot, template) in &self.pipeline {
            sub_output.insert(slot.clone(), template.render(&context)?);
        }

        let mut output = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Slot(name) => {
                    if let Some(value) = sub_output.get(name) {
                        output.push_str(value);
                    } else if let Some(value) = context.get(name) {
                        output.push_str(value);
                    } else {
                        return Err(TemplateError::MissingVariable(name.clone()));
                    }
                }
            }
        }
        Ok(output)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
