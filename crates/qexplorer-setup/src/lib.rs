//! qexplorer project setup
//!
//! A [`Setup`] is the root of a qexplorer project: Modes, Cross-Mode Terms,
//! Pulses and Waits, Sequences, Simulations, Sweeps and Outputs, plus the
//! variables their formula fields may use. Computing a simulation turns
//! the tree into a symbolic [`SystemModel`], integrates it segment by
//! segment through a [`Simulator`] and stores Wigner frames or
//! spin-expectation traces per output.
//!
//! # Example
//!
//! ```rust
//! use qexplorer_setup::Setup;
//!
//! let mut setup = Setup::new();
//! let cavity = setup.add_mode().unwrap();
//! setup.rename(cavity, "Cavity").unwrap();
//! setup.add_mode().unwrap();
//! let term = setup.add_cross_term().unwrap();
//! setup.set_field(term, "strength", "chi/2", &mut |_: &str| Some(0.2)).unwrap();
//!
//! assert!(setup.remove(cavity).is_err());
//! setup.remove(term).unwrap();
//! setup.remove(cavity).unwrap();
//! ```

pub mod compute;
pub mod document;
pub mod equations;
pub mod error;
pub mod kinds;
pub mod plan;
pub mod setup;
pub mod simulator;
pub mod sweep;
pub mod system;
pub mod ui_state;
pub mod worker;

pub use compute::{CancelToken, ComputeOutcome, ComputeProgress, OutputData, execute};
pub use document::{DocumentFormat, ProjectDocument};
pub use error::{SetupError, SetupResult};
pub use kinds::Collections;
pub use plan::{ComputePlan, OutputKind, OutputRequest};
pub use setup::{NoPrompt, Setup, VariablePrompt};
pub use simulator::{PhaseGrid, Simulator, SimulatorError, SimulatorResult};
pub use sweep::{SweepPoint, SweepProgress};
pub use system::{
    CatState, DriveTerm, LadderOp, MAX_LEGS, ModeSpec, Operator, OperatorTerm, Segment, SystemModel,
    format_leg_phases, parse_leg_phases,
};
pub use ui_state::{UiState, UiStateStore};
pub use worker::ComputeWorker;
