//! Shared fixtures for the setup integration tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::mpsc::Receiver;

use ndarray::Array2;
use qexplorer_model::EntityId;
use qexplorer_setup::{
    NoPrompt, PhaseGrid, Segment, Setup, Simulator, SimulatorError, SimulatorResult, SystemModel,
};

/// A simulator whose state is the elapsed time.
///
/// `evolve` maps each time point `t` of a segment to `initial + t`, so the
/// trajectory states equal the cumulative trajectory times.
#[derive(Debug, Default)]
pub struct ClockSimulator {
    /// Drive count of every evolved segment.
    pub drives: Mutex<Vec<usize>>,
    /// When set, each `evolve` waits for one message first.
    pub gate: Option<Mutex<Receiver<()>>>,
}

impl ClockSimulator {
    pub fn gated(gate: Receiver<()>) -> Self {
        Self {
            drives: Mutex::new(Vec::new()),
            gate: Some(Mutex::new(gate)),
        }
    }
}

impl Simulator for ClockSimulator {
    type State = f64;

    fn name(&self) -> &str {
        "clock"
    }

    fn initial_state(&self, _system: &SystemModel) -> SimulatorResult<f64> {
        Ok(0.0)
    }

    fn evolve(&self, _system: &SystemModel, initial: &f64, segment: &Segment) -> SimulatorResult<Vec<f64>> {
        if let Some(gate) = &self.gate {
            let gate = gate.lock().map_err(|e| SimulatorError::Backend(e.to_string()))?;
            gate.recv().map_err(|e| SimulatorError::Backend(e.to_string()))?;
        }
        self.drives.lock().unwrap().push(segment.drives.len());
        Ok(segment.times.iter().map(|t| initial + t).collect())
    }

    fn wigner(&self, state: &f64, _mode: usize, grid: &PhaseGrid) -> SimulatorResult<Array2<f64>> {
        Ok(Array2::from_elem((grid.resolution(), grid.resolution()), *state))
    }

    fn spin_expectations(&self, state: &f64, mode: usize) -> SimulatorResult<[f64; 3]> {
        Ok([*state, mode as f64, 0.0])
    }
}

/// One mode, a driven pulse (10) and a wait (5) in a sequence, a
/// simulation with 3 points per segment and one output of each kind.
pub struct Project {
    pub setup: Setup,
    pub simulation: EntityId,
}

pub fn driven_project() -> Project {
    let mut setup = Setup::new();
    setup.add_mode().unwrap();
    let pulse = setup.add_pulse().unwrap();
    setup.set_field(pulse, "amplitude", "0.5", &mut NoPrompt).unwrap();
    let wait = setup.add_wait().unwrap();
    setup.set_field(wait, "duration", "5", &mut NoPrompt).unwrap();
    let sequence = setup.add_sequence().unwrap();
    setup.add_step(sequence, Some(pulse)).unwrap();
    setup.add_step(sequence, Some(wait)).unwrap();
    let simulation = setup.add_simulation().unwrap();
    setup
        .set_field(simulation, "points_per_segment", "3", &mut NoPrompt)
        .unwrap();
    setup.add_output(Some("Expectation")).unwrap();
    let wigner = setup.add_output(Some("Wigner")).unwrap();
    setup.set_field(wigner, "resolution", "4", &mut NoPrompt).unwrap();
    Project { setup, simulation }
}
