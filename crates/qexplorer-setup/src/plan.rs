//! Snapshot of everything a computation needs, taken on the owning thread.
//!
//! A [`ComputePlan`] owns plain data only, so it can be moved to a worker
//! thread while the tree keeps being edited.

use ndarray::Array1;
use tracing::debug;

use qexplorer_model::{EntityId, ModelError};

use crate::error::{SetupError, SetupResult};
use crate::kinds::{EXPECTATION, PULSE, SIMULATION, WIGNER};
use crate::setup::Setup;
use crate::simulator::PhaseGrid;
use crate::system::{DriveTerm, Segment, SystemModel, mode_position};

/// What to extract from the trajectory for one output.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputKind {
    Wigner(PhaseGrid),
    Expectation,
}

/// One output entity attached to the planned simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRequest {
    pub output: EntityId,
    pub name: String,
    /// Index of the observed mode.
    pub mode: usize,
    pub kind: OutputKind,
}

/// A computation ready to execute.
#[derive(Debug, Clone)]
pub struct ComputePlan {
    pub simulation: EntityId,
    pub simulation_name: String,
    pub system: SystemModel,
    pub segments: Vec<Segment>,
    pub outputs: Vec<OutputRequest>,
}

impl ComputePlan {
    /// Number of trajectory points after boundary states are merged.
    pub fn trajectory_len(&self) -> usize {
        let total: usize = self.segments.iter().map(|s| s.times.len()).sum();
        total.saturating_sub(self.segments.len().saturating_sub(1))
    }
}

impl Setup {
    /// Snapshot `simulation` into a [`ComputePlan`].
    pub fn plan(&self, simulation: EntityId) -> SetupResult<ComputePlan> {
        self.require_kind(simulation, SIMULATION, "a simulation")?;
        let model = &self.model;
        let sim = model.entity(simulation)?;

        if model.items(self.collections.modes)?.is_empty() {
            return Err(ModelError::EmptyPrerequisite("A simulation needs at least one mode".into()).into());
        }
        let points = sim.integer("points_per_segment")?;
        let points = usize::try_from(points)
            .ok()
            .filter(|&p| p >= 2)
            .ok_or_else(|| {
                SetupError::invalid(sim.name(), "points_per_segment", format!("need at least 2, got {points}"))
            })?;

        let system = SystemModel::assemble(model, &self.collections)?;

        let sequence = sim.reference("sequence")?;
        let steps = self.steps(sequence)?;
        if steps.is_empty() {
            return Err(ModelError::EmptyPrerequisite(format!(
                "Sequence '{}' has no steps",
                model.name(sequence)?
            ))
            .into());
        }

        let mut segments = Vec::with_capacity(steps.len());
        for pulse_id in steps {
            let pulse = model.entity(pulse_id)?;
            let duration = pulse.number("duration")?;
            if duration <= 0.0 {
                return Err(SetupError::invalid(
                    pulse.name(),
                    "duration",
                    format!("must be positive, got {duration}"),
                ));
            }

            let mut drives = Vec::new();
            if pulse.kind() == PULSE {
                let amplitude = pulse.number("amplitude")?;
                if amplitude != 0.0 {
                    let mode = mode_position(model, &self.collections, pulse.reference("mode")?)?;
                    drives.push(DriveTerm::cosine(
                        mode,
                        amplitude,
                        pulse.number("frequency")?,
                        pulse.number("phase_degrees")?,
                    ));
                }
            }

            segments.push(Segment {
                label: pulse.name().to_string(),
                times: Array1::linspace(0.0, duration, points).to_vec(),
                drives,
            });
        }

        let mut outputs = Vec::new();
        for &output in model.items(self.collections.outputs)? {
            let entity = model.entity(output)?;
            if entity.reference("simulation")? != simulation {
                continue;
            }
            let mode = mode_position(model, &self.collections, entity.reference("mode")?)?;
            let kind = match entity.kind() {
                WIGNER => {
                    let resolution = entity.integer("resolution")?;
                    let resolution = usize::try_from(resolution)
                        .ok()
                        .filter(|&r| r > 0)
                        .ok_or_else(|| {
                            SetupError::invalid(entity.name(), "resolution", format!("must be at least 1, got {resolution}"))
                        })?;
                    OutputKind::Wigner(PhaseGrid::new(entity.number("range")?.abs(), resolution))
                }
                EXPECTATION => OutputKind::Expectation,
                other => {
                    return Err(ModelError::UnknownKind {
                        collection: crate::kinds::OUTPUTS.to_string(),
                        kind: other.to_string(),
                    }
                    .into());
                }
            };
            outputs.push(OutputRequest {
                output,
                name: entity.name().to_string(),
                mode,
                kind,
            });
        }

        debug!(
            simulation = %sim.name(),
            segments = segments.len(),
            outputs = outputs.len(),
            "compute planned"
        );
        Ok(ComputePlan {
            simulation,
            simulation_name: sim.name().to_string(),
            system,
            segments,
            outputs,
        })
    }
}
