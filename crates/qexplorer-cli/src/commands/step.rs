//! Step command implementation.

use anyhow::Result;
use console::style;

use super::common::{load_project, resolve_item, save_project};

/// Execute the step command.
pub fn execute(path: &str, sequence: &str, pulse: Option<&str>, remove: Option<usize>) -> Result<()> {
    let mut setup = load_project(path)?;
    let seq = resolve_item(&setup, sequence)?;

    if let Some(index) = remove {
        setup.remove_step(seq, index)?;
        println!("{} Removed step {}", style("✓").green().bold(), index);
    } else {
        let pulse = match pulse {
            Some(p) => {
                let pulses = setup.collections().pulses;
                Some(
                    setup
                        .find(Some(pulses), p)
                        .ok_or_else(|| anyhow::anyhow!("No pulse named '{p}'"))?,
                )
            }
            None => None,
        };
        let key = setup.add_step(seq, pulse)?;
        println!(
            "{} Added {} -> {}",
            style("✓").green().bold(),
            key,
            setup.model().display_value(seq, &key)?
        );
    }
    save_project(&setup, path)?;

    let steps = setup.steps(seq)?;
    println!("  Steps: {}", setup.model().names(&steps).join(", "));
    Ok(())
}
