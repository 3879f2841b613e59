//! Define command implementation.

use anyhow::Result;
use console::style;

use qexplorer_model::RecoerceFailure;
use qexplorer_setup::Setup;

use super::common::{load_project, save_project};

/// Execute the define command.
///
/// The project is only written back when every formula still evaluates,
/// so a saved document always loads again.
pub fn execute(path: &str, name: &str, value: Option<f64>, remove: bool) -> Result<()> {
    let mut setup = load_project(path)?;

    let failures = if remove {
        let (previous, failures) = setup.remove_variable(name);
        if previous.is_none() {
            anyhow::bail!("Variable '{name}' is not defined");
        }
        failures
    } else {
        let value = value.ok_or_else(|| anyhow::anyhow!("A value is required"))?;
        setup.define_variable(name, value)?
    };

    if !failures.is_empty() {
        anyhow::bail!(
            "'{name}' is needed by formulas that would no longer evaluate: {}",
            describe(&setup, &failures)
        );
    }
    save_project(&setup, path)?;

    match value.filter(|_| !remove) {
        Some(v) => println!("{} {} = {}", style("✓").green().bold(), style(name).yellow(), v),
        None => println!("{} Removed {}", style("✓").green().bold(), style(name).yellow()),
    }
    Ok(())
}

fn describe(setup: &Setup, failures: &[RecoerceFailure]) -> String {
    failures
        .iter()
        .map(|f| {
            let item = setup.model().name(f.entity).unwrap_or("?");
            format!("{item}.{} ({})", f.key, f.error)
        })
        .collect::<Vec<_>>()
        .join(", ")
}
