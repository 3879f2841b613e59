//! Model command implementation.

use std::fmt::Write;

use anyhow::Result;
use console::style;

use qexplorer_setup::{ComputePlan, OutputKind, format_leg_phases};

use super::common::{load_project, resolve_item};

/// Execute the model command.
pub fn execute(path: &str, simulation: &str, json: bool) -> Result<()> {
    let setup = load_project(path)?;
    let id = resolve_item(&setup, simulation)?;
    let plan = setup.plan(id)?;

    if json {
        let value = serde_json::json!({
            "simulation": plan.simulation_name,
            "system": plan.system,
            "segments": plan.segments,
            "trajectory_len": plan.trajectory_len(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", render(&plan)?);
    }
    Ok(())
}

/// Human-readable summary of a compute plan.
pub fn render(plan: &ComputePlan) -> Result<String> {
    let system = &plan.system;
    let mut out = String::new();

    writeln!(out, "{} {}", style("Simulation").bold(), style(&plan.simulation_name).cyan())?;
    writeln!(out, "  Hilbert dimension: {}", system.hilbert_dimension()?)?;
    for (i, (mode, cat)) in system.modes.iter().zip(&system.initial).enumerate() {
        let alpha = cat.displacements.first().map_or(0.0, |d| d.norm());
        writeln!(
            out,
            "  [{i}] {} dim {}, initial {} leg(s), |α| = {alpha}, weights [{}]",
            mode.name,
            mode.dimension,
            cat.legs(),
            format_leg_phases(&cat.weights)
        )?;
    }
    writeln!(out, "  H0 = {}", system.hamiltonian)?;
    for c in &system.collapse {
        writeln!(out, "  L  = {c}")?;
    }

    writeln!(out, "{}", style("Segments").bold())?;
    for segment in &plan.segments {
        writeln!(
            out,
            "  {}: duration {}, {} points",
            segment.label,
            segment.duration(),
            segment.times.len()
        )?;
        for drive in &segment.drives {
            let args: Vec<String> = drive.args.iter().map(|(k, v)| format!("{k}={v}")).collect();
            writeln!(out, "    + {} · {} [{}]", drive.operator, drive.expression, args.join(", "))?;
        }
    }
    writeln!(out, "  Trajectory points: {}", plan.trajectory_len())?;

    if !plan.outputs.is_empty() {
        writeln!(out, "{}", style("Outputs").bold())?;
        for output in &plan.outputs {
            let kind = match &output.kind {
                OutputKind::Wigner(grid) => format!("Wigner {}x{}", grid.resolution(), grid.resolution()),
                OutputKind::Expectation => "Expectation".to_string(),
            };
            writeln!(out, "  {} ({kind}) on mode {}", output.name, output.mode)?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qexplorer_setup::{NoPrompt, Setup};

    #[test]
    fn test_render_plan() {
        console::set_colors_enabled(false);
        let mut setup = Setup::new();
        setup.add_mode().unwrap();
        let pulse = setup.add_pulse().unwrap();
        setup.set_field(pulse, "amplitude", "0.5", &mut NoPrompt).unwrap();
        let sequence = setup.add_sequence().unwrap();
        setup.add_step(sequence, Some(pulse)).unwrap();
        let simulation = setup.add_simulation().unwrap();
        setup.set_field(simulation, "points_per_segment", "11", &mut NoPrompt).unwrap();
        setup.add_output(Some("Expectation")).unwrap();

        let text = render(&setup.plan(simulation).unwrap()).unwrap();
        assert!(text.contains("  Hilbert dimension: 2\n"));
        assert!(text.contains("initial 1 leg(s), |α| = 0, weights [1]\n"));
        assert!(text.contains("  Pulse: duration 10, 11 points\n"));
        assert!(text.contains("cos(df0*t + phi0) [df0=0, phi0=0]"));
        assert!(text.contains("  Trajectory points: 11\n"));
        assert!(text.contains("  Expectation (Expectation) on mode 0\n"));
    }
}
