//! System instruction for the reasoning service.
//!
//! Rendered from an embedded template so the tool list always matches the
//! registry the loop dispatches against.

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::Serialize;

use crate::tools::ToolRegistry;

const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");

#[derive(Debug, Serialize)]
struct ToolEntry<'a> {
    name: &'a str,
    description: &'a str,
}

/// Render the system instruction listing every tool in `registry`.
pub fn render_system_prompt(registry: &ToolRegistry) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("system", SYSTEM_TEMPLATE)
        .context("load system prompt template")?;
    let tools: Vec<ToolEntry<'_>> = registry
        .iter()
        .map(|tool| ToolEntry {
            name: tool.name(),
            description: tool.description(),
        })
        .collect();
    let rendered = env
        .get_template("system")?
        .render(context! { tools => tools })
        .context("render system prompt")?;
    Ok(rendered)
}
