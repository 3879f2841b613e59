//! Item kinds of a qexplorer project and the collections that hold them.
//!
//! Collection order matters: every reference points into a collection that
//! appears earlier, which is also the order project documents are replayed
//! in.

use qexplorer_model::{CollectionId, EntityTemplate, FieldSpec, Model};

pub const MODES: &str = "Modes";
pub const CROSS_TERMS: &str = "Cross-Mode Terms";
pub const PULSES: &str = "Pulses";
pub const SEQUENCES: &str = "Sequences";
pub const SIMULATIONS: &str = "Simulations";
pub const SWEEPS: &str = "Sweeps";
pub const OUTPUTS: &str = "Outputs";

pub const MODE: &str = "Mode";
pub const CROSS_TERM: &str = "Cross-Mode Term";
pub const PULSE: &str = "Pulse";
pub const WAIT: &str = "Wait";
pub const SEQUENCE: &str = "Sequence";
pub const SIMULATION: &str = "Simulation";
pub const SWEEP: &str = "Sweep";
pub const WIGNER: &str = "Wigner";
pub const EXPECTATION: &str = "Expectation";

pub const CROSS_KERR: &str = "Cross-Kerr";
pub const EXCHANGE: &str = "Exchange";

/// Label prefix of the dynamic step fields of a sequence.
pub const STEP_PREFIX: &str = "Step";

/// Handles of the seven project collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collections {
    pub modes: CollectionId,
    pub cross_terms: CollectionId,
    pub pulses: CollectionId,
    pub sequences: CollectionId,
    pub simulations: CollectionId,
    pub sweeps: CollectionId,
    pub outputs: CollectionId,
}

impl Collections {
    /// Add the project collections to an empty model.
    pub fn install(model: &mut Model) -> Self {
        let modes = model.add_collection(MODES, vec![mode()]);
        let cross_terms = model.add_collection(CROSS_TERMS, vec![cross_term(modes)]);
        let pulses = model.add_collection(PULSES, vec![pulse(modes), wait()]);
        let sequences = model.add_collection(SEQUENCES, vec![EntityTemplate::new(SEQUENCE)]);
        let simulations = model.add_collection(SIMULATIONS, vec![simulation(sequences)]);
        let sweeps = model.add_collection(SWEEPS, vec![sweep()]);
        let outputs = model.add_collection(
            OUTPUTS,
            vec![wigner(simulations, modes), expectation(simulations, modes)],
        );
        Self {
            modes,
            cross_terms,
            pulses,
            sequences,
            simulations,
            sweeps,
            outputs,
        }
    }

    /// All handles in dependency order.
    pub fn all(&self) -> [CollectionId; 7] {
        [
            self.modes,
            self.cross_terms,
            self.pulses,
            self.sequences,
            self.simulations,
            self.sweeps,
            self.outputs,
        ]
    }
}

fn mode() -> EntityTemplate {
    EntityTemplate::new(MODE)
        .field(FieldSpec::integer("Dimension", 2))
        .field(FieldSpec::formula("Frequency", 1.0))
        .field(FieldSpec::formula("Anharmonicity", 0.0))
        .field(FieldSpec::formula("Decay", 0.0))
        .field(FieldSpec::formula("Dephasing", 0.0))
        .field(FieldSpec::formula("Initial Displacement", 0.0))
        .field(FieldSpec::integer("Initial Leg Count", 1))
        .field(FieldSpec::text("Initial Leg Phases", "1"))
}

fn cross_term(modes: CollectionId) -> EntityTemplate {
    EntityTemplate::new(CROSS_TERM)
        .field(FieldSpec::reference_at("Mode 1", modes, 0))
        .field(FieldSpec::reference_at("Mode 2", modes, 1))
        .field(FieldSpec::choice("Coupling", [CROSS_KERR, EXCHANGE]))
        .field(FieldSpec::formula("Strength", 0.0))
}

fn pulse(modes: CollectionId) -> EntityTemplate {
    EntityTemplate::new(PULSE)
        .field(FieldSpec::reference("Mode", modes))
        .field(FieldSpec::formula("Amplitude", 0.0))
        .field(FieldSpec::formula("Frequency", 0.0))
        .field(FieldSpec::formula("Phase Degrees", 0.0))
        .field(FieldSpec::formula("Duration", 10.0))
}

fn wait() -> EntityTemplate {
    EntityTemplate::new(WAIT).field(FieldSpec::formula("Duration", 10.0))
}

fn simulation(sequences: CollectionId) -> EntityTemplate {
    EntityTemplate::new(SIMULATION)
        .field(FieldSpec::reference("Sequence", sequences))
        .field(FieldSpec::integer("Points Per Segment", 100))
}

fn sweep() -> EntityTemplate {
    EntityTemplate::new(SWEEP)
        .field(FieldSpec::text("Variable", ""))
        .field(FieldSpec::float("Start", 0.0))
        .field(FieldSpec::float("Stop", 1.0))
        .field(FieldSpec::integer("Points", 5))
}

fn wigner(simulations: CollectionId, modes: CollectionId) -> EntityTemplate {
    EntityTemplate::new(WIGNER)
        .field(FieldSpec::reference("Simulation", simulations))
        .field(FieldSpec::reference("Mode", modes))
        .field(FieldSpec::float("Range", 5.0))
        .field(FieldSpec::integer("Resolution", 100))
}

fn expectation(simulations: CollectionId, modes: CollectionId) -> EntityTemplate {
    EntityTemplate::new(EXPECTATION)
        .field(FieldSpec::reference("Simulation", simulations))
        .field(FieldSpec::reference("Mode", modes))
}
