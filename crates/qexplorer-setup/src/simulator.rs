//! The physics engine seam.
//!
//! qexplorer never builds matrices or integrates a master equation itself.
//! A [`Simulator`] receives the symbolic [`SystemModel`] and one
//! [`Segment`] at a time and returns states; it also turns a state into a
//! Wigner frame or a spin-expectation triple for one mode.
//!
//! ```text
//!   initial_state() ──→ evolve(seg 0) ──→ evolve(seg 1) ──→ … ──→ wigner() / spin_expectations()
//!                        seeded by         seeded by the
//!                        ψ0                last state of seg 0
//! ```

use ndarray::{Array1, Array2};
use thiserror::Error;

use crate::system::{Segment, SystemModel};

/// Errors reported by a simulator implementation.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum SimulatorError {
    /// The simulator cannot handle this system.
    #[error("Unsupported system: {0}")]
    Unsupported(String),

    /// `evolve` must return one state per time point.
    #[error("Segment '{segment}' has {expected} time points but {got} states were returned")]
    StateCount {
        segment: String,
        expected: usize,
        got: usize,
    },

    /// A mode index outside the system was requested.
    #[error("Mode {mode} out of range for a system of {modes} modes")]
    ModeOutOfRange { mode: usize, modes: usize },

    /// Integration or transform failed.
    #[error("{0}")]
    Backend(String),
}

/// Result type for simulator calls.
pub type SimulatorResult<T> = Result<T, SimulatorError>;

/// Square phase-space grid `[-range, range]²` with `resolution` points per
/// axis.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseGrid {
    axis: Array1<f64>,
}

impl PhaseGrid {
    pub fn new(range: f64, resolution: usize) -> Self {
        Self {
            axis: Array1::linspace(-range, range, resolution),
        }
    }

    /// Sample points along each axis.
    pub fn axis(&self) -> &Array1<f64> {
        &self.axis
    }

    pub fn resolution(&self) -> usize {
        self.axis.len()
    }
}

/// A master-equation engine.
///
/// # Contract
///
/// - `evolve` returns exactly one state per entry of `segment.times`, the
///   first being `initial`.
/// - Implementations are shared with the compute thread, hence
///   `Send + Sync`.
pub trait Simulator: Send + Sync {
    /// Engine-specific state (ket or density matrix).
    type State: Clone + Send + 'static;

    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Build `ψ0` from the per-mode cat states.
    fn initial_state(&self, system: &SystemModel) -> SimulatorResult<Self::State>;

    /// Integrate one segment starting from `initial`.
    fn evolve(
        &self,
        system: &SystemModel,
        initial: &Self::State,
        segment: &Segment,
    ) -> SimulatorResult<Vec<Self::State>>;

    /// Wigner function of `mode` on `grid`, shape `(resolution, resolution)`.
    fn wigner(&self, state: &Self::State, mode: usize, grid: &PhaseGrid) -> SimulatorResult<Array2<f64>>;

    /// Generalized spin expectation values `(⟨Sx⟩, ⟨Sy⟩, ⟨Sz⟩)` of `mode`.
    fn spin_expectations(&self, state: &Self::State, mode: usize) -> SimulatorResult<[f64; 3]>;
}
