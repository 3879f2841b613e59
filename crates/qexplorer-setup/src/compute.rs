//! Executing a [`ComputePlan`] and folding the results back into a project.
//!
//! ```text
//!   Setup::plan()  ──→  execute()  ──→  Setup::apply()
//!   owning thread      any thread       owning thread
//! ```
//!
//! Segments run in sequence order, each seeded by the last state of the
//! previous one. Outputs are derived only once the whole trajectory exists.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ndarray::{Array1, Array2};
use tracing::{debug, info};

use qexplorer_model::EntityId;

use crate::error::{SetupError, SetupResult};
use crate::plan::{ComputePlan, OutputKind};
use crate::setup::Setup;
use crate::simulator::{Simulator, SimulatorError};

/// Shared cancellation flag, checked between sequence steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Progress of a running computation.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputeProgress {
    /// Segment `index` of `total` is being integrated.
    Segment {
        index: usize,
        total: usize,
        label: String,
    },
    /// The trajectory is complete; outputs are being derived.
    Outputs { count: usize },
    Finished,
}

/// Data derived for one output.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputData {
    /// One Wigner frame per trajectory time.
    Wigner {
        times: Vec<f64>,
        axis: Array1<f64>,
        frames: Vec<Array2<f64>>,
    },
    /// `(⟨Sx⟩, ⟨Sy⟩, ⟨Sz⟩)` per trajectory time.
    Expectation {
        times: Vec<f64>,
        values: Vec<[f64; 3]>,
    },
}

impl OutputData {
    pub fn times(&self) -> &[f64] {
        match self {
            OutputData::Wigner { times, .. } | OutputData::Expectation { times, .. } => times,
        }
    }
}

/// Result of [`execute`].
#[derive(Debug, Clone)]
pub struct ComputeOutcome {
    pub simulation: EntityId,
    /// Cumulative trajectory times.
    pub times: Vec<f64>,
    pub outputs: Vec<(EntityId, OutputData)>,
}

/// Run a plan to completion.
///
/// `cancel` is checked before every segment and before the outputs are
/// derived; a cancelled run returns [`SetupError::Cancelled`].
pub fn execute<S, P>(
    plan: &ComputePlan,
    simulator: &S,
    cancel: &CancelToken,
    mut progress: P,
) -> SetupResult<ComputeOutcome>
where
    S: Simulator + ?Sized,
    P: FnMut(ComputeProgress),
{
    let total = plan.segments.len();
    let mut times = Vec::with_capacity(plan.trajectory_len());
    let mut states: Vec<S::State> = Vec::with_capacity(plan.trajectory_len());
    let mut seed = simulator.initial_state(&plan.system)?;
    let mut offset = 0.0;

    for (index, segment) in plan.segments.iter().enumerate() {
        if cancel.is_cancelled() {
            info!(simulation = %plan.simulation_name, segment = index, "compute cancelled");
            return Err(SetupError::Cancelled);
        }
        progress(ComputeProgress::Segment {
            index,
            total,
            label: segment.label.clone(),
        });
        debug!(simulator = simulator.name(), segment = %segment.label, points = segment.times.len(), "evolving segment");

        let evolved = simulator.evolve(&plan.system, &seed, segment)?;
        if evolved.len() != segment.times.len() {
            return Err(SimulatorError::StateCount {
                segment: segment.label.clone(),
                expected: segment.times.len(),
                got: evolved.len(),
            }
            .into());
        }
        let Some(last) = evolved.last().cloned() else {
            continue;
        };

        // Later segments start with the previous segment's final state.
        let skip = usize::from(index > 0);
        times.extend(segment.times.iter().skip(skip).map(|t| offset + t));
        states.extend(evolved.into_iter().skip(skip));
        offset += segment.duration();
        seed = last;
    }

    if cancel.is_cancelled() {
        return Err(SetupError::Cancelled);
    }
    progress(ComputeProgress::Outputs {
        count: plan.outputs.len(),
    });

    let mut outputs = Vec::with_capacity(plan.outputs.len());
    for request in &plan.outputs {
        let data = match &request.kind {
            OutputKind::Wigner(grid) => OutputData::Wigner {
                times: times.clone(),
                axis: grid.axis().clone(),
                frames: states
                    .iter()
                    .map(|s| simulator.wigner(s, request.mode, grid))
                    .collect::<Result<_, _>>()?,
            },
            OutputKind::Expectation => OutputData::Expectation {
                times: times.clone(),
                values: states
                    .iter()
                    .map(|s| simulator.spin_expectations(s, request.mode))
                    .collect::<Result<_, _>>()?,
            },
        };
        outputs.push((request.output, data));
    }

    progress(ComputeProgress::Finished);
    info!(
        simulation = %plan.simulation_name,
        points = times.len(),
        outputs = outputs.len(),
        "compute finished"
    );
    Ok(ComputeOutcome {
        simulation: plan.simulation,
        times,
        outputs,
    })
}

impl Setup {
    /// Store the data of a finished computation.
    ///
    /// Outputs removed, or pointed at another simulation, while the
    /// computation ran are skipped. Returns the outputs that were updated.
    pub fn apply(&mut self, outcome: ComputeOutcome) -> Vec<EntityId> {
        let mut updated = Vec::with_capacity(outcome.outputs.len());
        for (output, data) in outcome.outputs {
            let Ok(entity) = self.model.entity(output) else {
                debug!(output = %output, "output removed during compute");
                continue;
            };
            if entity.reference("simulation").ok() != Some(outcome.simulation) {
                debug!(output = %output, "output moved to another simulation during compute");
                continue;
            }
            self.outputs.insert(output, data);
            updated.push(output);
        }
        updated
    }

    /// Plan, execute and apply on the calling thread.
    pub fn compute<S: Simulator + ?Sized>(&mut self, simulation: EntityId, simulator: &S) -> SetupResult<Vec<EntityId>> {
        let plan = self.plan(simulation)?;
        let outcome = execute(&plan, simulator, &CancelToken::new(), |_| {})?;
        Ok(self.apply(outcome))
    }
}
