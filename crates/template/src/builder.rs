//! Template builder
//!
//! Loads a template definition, resolves declared variables against sibling
//! sub-templates and text fragments, and injects computed bindings.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{PromptTemplate, Result, TemplateError};

/// On-disk template definition
#[derive(Debug, Deserialize)]
struct TemplateDef {
    /// Inline literal text with `{slot}` placeholders
    #[serde(default)]
    template: Option<String>,
    /// External text fragment to inline instead; relative paths resolve
    /// against the template's own directory so template sets stay relocatable
    #[serde(default)]
    template_path: Option<String>,
    /// Variable names the literal text references
    #[serde(default)]
    input_variables: Vec<String>,
}

/// Builds a [`PromptTemplate`] from a definition file in a prompt directory.
pub struct TemplateBuilder {
    prompts_dir: PathBuf,
    template_file: String,
    tool_lines: Option<String>,
    format_instructions: Option<String>,
}

impl TemplateBuilder {
    pub fn new(prompts_dir: impl AsRef<Path>, template_file: impl Into<String>) -> Self {
        Self {
            prompts_dir: prompts_dir.as_ref().to_path_buf(),
            template_file: template_file.into(),
            tool_lines: None,
            format_instructions: None,
        }
    }

    /// Supply the tool set. The `tools` variable, when declared, binds to one
    /// `name: description` line per tool, in registration order.
    pub fn tools<I, N, D>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = (N, D)>,
        N: AsRef<str>,
        D: AsRef<str>,
    {
        self.tool_lines = Some(render_tool_lines(tools));
        self
    }

    /// Supply output-format instructions for the `format_instructions`
    /// variable. JSON-only lines are re-serialized so multi-byte characters
    /// stay literal instead of numeric escapes.
    pub fn format_instructions(mut self, text: &str) -> Self {
        self.format_instructions = Some(normalize_json_lines(text));
        self
    }

    /// Load the definition and compose the template.
    pub fn build(&self) -> Result<PromptTemplate> {
        let path = self.prompts_dir.join(&self.template_file);
        debug!("building template {:?}", path);

        let def = load_definition(&path)?;
        let text = self.literal_text(&path, &def)?;
        let mut template = PromptTemplate::parse(&text);

        let mut partials: Vec<(String, String)> = Vec::new();

        for var in &def.input_variables {
            let sub_def = self.prompts_dir.join(format!("{}.json", var));
            let fragment = self.prompts_dir.join(format!("{}.txt", var));

            if sub_def.exists() {
                let sub = TemplateBuilder {
                    prompts_dir: self.prompts_dir.clone(),
                    template_file: format!("{}.json", var),
                    tool_lines: self.tool_lines.clone(),
                    format_instructions: self.format_instructions.clone(),
                }
                .build()?;
                template.add_sub_template(var.clone(), sub);
            } else if fragment.exists() {
                let content = std::fs::read_to_string(&fragment)?;
                partials.push((var.clone(), content));
            }
        }

        // Computed bindings win over same-named fragment files.
        if let Some(lines) = &self.tool_lines {
            if def.input_variables.iter().any(|v| v == "tools") {
                partials.push(("tools".to_string(), lines.clone()));
            }
        }
        if let Some(instructions) = &self.format_instructions {
            if def.input_variables.iter().any(|v| v == "format_instructions") {
                partials.push(("format_instructions".to_string(), instructions.clone()));
            }
        }

        Ok(template.bind(partials))
    }

    fn literal_text(&self, def_path: &Path, def: &TemplateDef) -> Result<String> {
        if let Some(fragment) = &def.template_path {
            let fragment_path = PathBuf::from(fragment);
            let resolved = if fragment_path.is_absolute() {
                fragment_path
            } else {
                self.prompts_dir.join(fragment_path)
            };
            if !resolved.exists() {
                return Err(TemplateError::NotFound(resolved));
            }
            return Ok(std::fs::read_to_string(&resolved)?);
        }
        def.template
            .clone()
            .ok_or_else(|| TemplateError::NoText(def_path.to_path_buf()))
    }
}

fn load_definition(path: &Path) -> Result<TemplateDef> {
    if !path.exists() {
        return Err(TemplateError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Render one `name: description` line per tool, newline-joined, preserving
/// iteration order.
pub fn render_tool_lines<I, N, D>(tools: I) -> String
where
    I: IntoIterator<Item = (N, D)>,
    N: AsRef<str>,
    D: AsRef<str>,
{
    tools
        .into_iter()
        .map(|(name, description)| format!("{}: {}", name.as_ref(), description.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Re-serialize any line consisting solely of a JSON object.
///
/// serde_json writes multi-byte characters literally, so round-tripping a
/// line turns upstream `\uXXXX` escapes back into plain UTF-8. Lines that are
/// not valid JSON objects pass through unchanged.
pub fn normalize_json_lines(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.starts_with('{') && line.ends_with('}') {
                match serde_json::from_str::<serde_json::Value>(line) {
                    Ok(value) => serde_json::to_string(&value).unwrap_or_else(|_| line.to_string()),
                    Err(_) => line.to_string(),
                }
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
