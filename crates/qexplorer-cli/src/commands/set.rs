//! Set command implementation.

use anyhow::Result;
use console::style;

use super::common::{CliPrompt, load_project, parse_definitions, resolve_item, save_project};

/// Execute the set command.
pub fn execute(
    path: &str,
    item: &str,
    key: &str,
    value: &str,
    defines: &[String],
    interactive: bool,
) -> Result<()> {
    let mut setup = load_project(path)?;
    let id = resolve_item(&setup, item)?;

    if key == "name" {
        let old = setup.model().name(id)?.to_string();
        let resolved = setup.rename(id, value)?;
        save_project(&setup, path)?;
        println!(
            "{} Renamed {} to {}",
            style("✓").green().bold(),
            style(old).cyan(),
            style(&resolved).cyan()
        );
        if resolved != value {
            println!("  '{value}' was taken");
        }
        return Ok(());
    }

    let mut prompt = CliPrompt::new(parse_definitions(defines)?, interactive);
    setup.set_field(id, key, value, &mut prompt)?;
    save_project(&setup, path)?;

    let model = setup.model();
    println!(
        "{} {}.{} = {}",
        style("✓").green().bold(),
        style(model.name(id)?).cyan(),
        key,
        model.display_value(id, key)?
    );
    for (name, v) in prompt.answered() {
        println!("  Defined {} = {}", style(name).yellow(), v);
    }
    Ok(())
}
