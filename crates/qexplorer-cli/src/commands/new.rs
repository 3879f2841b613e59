//! New command implementation.

use std::path::Path;

use anyhow::Result;
use console::style;

use qexplorer_setup::Setup;

use super::common::save_project;

/// Execute the new command.
pub fn execute(path: &str, modes: usize, force: bool) -> Result<()> {
    if Path::new(path).exists() && !force {
        anyhow::bail!("{path} already exists (use --force to overwrite)");
    }

    let mut setup = Setup::new();
    for _ in 0..modes {
        setup.add_mode()?;
    }
    save_project(&setup, path)?;

    println!(
        "{} Created {} with {} mode(s)",
        style("✓").green().bold(),
        style(path).green(),
        modes
    );
    Ok(())
}
