//! Add command implementation.

use anyhow::Result;
use console::style;

use super::common::{load_project, resolve_collection, save_project};

/// Execute the add command.
pub fn execute(path: &str, collection: &str, kind: Option<&str>, name: Option<&str>) -> Result<()> {
    let mut setup = load_project(path)?;
    let cid = resolve_collection(&setup, collection)?;

    let id = setup.add_item(cid, kind)?;
    if let Some(name) = name {
        setup.rename(id, name)?;
    }
    save_project(&setup, path)?;

    let model = setup.model();
    let entity = model.entity(id)?;
    println!(
        "{} Added {} ({}) to {}",
        style("✓").green().bold(),
        style(entity.name()).cyan(),
        entity.kind(),
        model.collection(cid)?.name()
    );
    Ok(())
}
