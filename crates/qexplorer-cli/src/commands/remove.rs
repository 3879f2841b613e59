//! Remove command implementation.

use anyhow::Result;
use console::style;

use super::common::{load_project, resolve_item, save_project};

/// Execute the remove command.
pub fn execute(path: &str, item: &str) -> Result<()> {
    let mut setup = load_project(path)?;
    let id = resolve_item(&setup, item)?;
    let name = setup.model().name(id)?.to_string();

    setup.remove(id)?;
    save_project(&setup, path)?;

    println!("{} Removed {}", style("✓").green().bold(), style(name).cyan());
    Ok(())
}
