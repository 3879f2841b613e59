//! Show command implementation.

use std::fmt::Write;

use anyhow::Result;
use console::style;

use qexplorer_setup::Setup;

use super::common::load_project;

/// Execute the show command.
pub fn execute(path: &str) -> Result<()> {
    let setup = load_project(path)?;
    print!("{}", render(&setup)?);
    Ok(())
}

/// Text listing of every collection, item, field and variable.
pub fn render(setup: &Setup) -> Result<String> {
    let model = setup.model();
    let mut out = String::new();

    for cid in setup.collections().all() {
        let collection = model.collection(cid)?;
        writeln!(out, "{} ({})", style(collection.name()).bold(), collection.len())?;

        for &id in collection.children() {
            let entity = model.entity(id)?;
            writeln!(out, "  {} [{}]", style(entity.name()).cyan(), entity.kind())?;
            for field in entity.fields() {
                writeln!(out, "    {}: {}", field.label(), model.display_value(id, field.key())?)?;
            }
            if !entity.dependents().is_empty() {
                let users = model.names(entity.dependents()).join(", ");
                writeln!(out, "    {} {}", style("used by").dim(), users)?;
            }
        }
    }

    if !setup.variables().is_empty() {
        writeln!(out, "{}", style("Variables").bold())?;
        for (name, value) in setup.variables().iter() {
            writeln!(out, "  {} = {}", style(name).yellow(), value)?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qexplorer_setup::NoPrompt;

    #[test]
    fn test_render_lists_fields_and_dependents() {
        console::set_colors_enabled(false);
        let mut setup = Setup::new();
        setup.add_mode().unwrap();
        let pulse = setup.add_pulse().unwrap();
        setup.define_variable("amp", 0.3).unwrap();
        setup.set_field(pulse, "amplitude", "2*amp", &mut NoPrompt).unwrap();

        let text = render(&setup).unwrap();
        assert!(text.contains("Modes (1)\n  Mode [Mode]\n"));
        assert!(text.contains("    Dimension: 2\n"));
        assert!(text.contains("    used by Pulse\n"));
        assert!(text.contains("    Amplitude: 2*amp\n"));
        assert!(text.contains("Variables\n  amp = 0.3\n"));
    }
}
