//! Shared helpers for CLI commands.

use std::path::Path;

use anyhow::{Context, Result};
use console::{Term, style};
use tracing::debug;

use qexplorer_model::{CollectionId, EntityId};
use qexplorer_setup::{Setup, VariablePrompt};

/// Load a project document.
pub fn load_project(path: &str) -> Result<Setup> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    debug!(path, "loading project");
    Setup::load(path).with_context(|| format!("Failed to load project: {path}"))
}

/// Write a project document back.
pub fn save_project(setup: &Setup, path: &str) -> Result<()> {
    setup
        .save(path)
        .with_context(|| format!("Failed to write project: {path}"))
}

/// Find a collection by name, ignoring case.
pub fn resolve_collection(setup: &Setup, name: &str) -> Result<CollectionId> {
    let model = setup.model();
    model
        .collections()
        .iter()
        .find(|c| c.name().eq_ignore_ascii_case(name))
        .map(|c| c.id())
        .ok_or_else(|| {
            let known: Vec<&str> = model.collections().iter().map(|c| c.name()).collect();
            anyhow::anyhow!("Unknown collection: '{name}'. Available: {}", known.join(", "))
        })
}

/// Find an item given as `Collection/Name` or as a name unique in the project.
pub fn resolve_item(setup: &Setup, spec: &str) -> Result<EntityId> {
    if let Some((collection, name)) = spec.split_once('/') {
        let cid = resolve_collection(setup, collection)?;
        return setup
            .find(Some(cid), name)
            .ok_or_else(|| anyhow::anyhow!("No item '{name}' in '{collection}'"));
    }
    setup.find(None, spec).ok_or_else(|| {
        anyhow::anyhow!("No unique item named '{spec}' (use Collection/Name to disambiguate)")
    })
}

/// Parse `name=value` pairs given with `--define`.
pub fn parse_definitions(defines: &[String]) -> Result<Vec<(String, f64)>> {
    defines
        .iter()
        .map(|d| {
            let (name, value) = d
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("Expected name=value, got '{d}'"))?;
            let value: f64 = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid value for '{}'", name.trim()))?;
            if !value.is_finite() {
                anyhow::bail!("Value for '{}' must be finite, got {value}", name.trim());
            }
            Ok((name.trim().to_string(), value))
        })
        .collect()
}

/// Answers variable prompts from `--define` values, then optionally from
/// the terminal.
pub struct CliPrompt {
    given: Vec<(String, f64)>,
    interactive: bool,
    answered: Vec<(String, f64)>,
}

impl CliPrompt {
    pub fn new(given: Vec<(String, f64)>, interactive: bool) -> Self {
        Self {
            given,
            interactive,
            answered: Vec::new(),
        }
    }

    /// Variables this prompt supplied, in order.
    pub fn answered(&self) -> &[(String, f64)] {
        &self.answered
    }

    fn ask(&self, name: &str) -> Option<f64> {
        let term = Term::stderr();
        if !self.interactive || !term.is_term() {
            return None;
        }
        loop {
            let question = format!(
                "{} Variable {} is not defined. Value (empty to cancel): ",
                style("?").yellow().bold(),
                style(name).cyan()
            );
            term.write_str(&question).ok()?;
            let line = term.read_line().ok()?;
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            match line.parse::<f64>() {
                Ok(v) if v.is_finite() => return Some(v),
                _ => {
                    let _ = term.write_line(&format!("  '{line}' is not a finite number"));
                }
            }
        }
    }
}

impl VariablePrompt for CliPrompt {
    fn define(&mut self, name: &str) -> Option<f64> {
        let value = self
            .given
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
            .or_else(|| self.ask(name))?;
        self.answered.push((name.to_string(), value));
        Some(value)
    }
}
