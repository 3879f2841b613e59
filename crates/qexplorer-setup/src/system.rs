//! Symbolic description of the system handed to a [`Simulator`].
//!
//! Operators are sums of products of single-mode ladder operators:
//!
//!   O = Σ_k  c_k · Π_j  L_{k,j}
//!
//! where each `L` is `a`, `a†` or `n = a†a` acting on one mode. The
//! simulator decides how to turn that into matrices; nothing here knows
//! about Hilbert-space truncation beyond each mode's dimension.
//!
//! The assembled model is
//!
//! ```text
//! H0 = Σ_i ω_i n_i + Σ_i K_i n_i n_i
//!      + Σ_cross-Kerr g n_i n_j + Σ_exchange g (a_i† a_j + a_i a_j†)
//! c_ops = { κ_i a_i, γ_i n_i }           (zero rates omitted)
//! ψ0 = ⊗_i Σ_k w_ik D(e^{2πik/m_i} α_i)|0⟩    (cat state over m_i legs)
//! ```
//!
//! The leg weights `w_ik` come from a mode's comma-separated
//! `initial_leg_phases` list, padded with `1` up to the leg count:
//!
//! ```text
//! 1, -1          two legs, odd cat
//! 1, i, -1, -i   four legs with quarter-turn phases
//! ```
//!
//! [`Simulator`]: crate::simulator::Simulator

use std::f64::consts::PI;
use std::fmt;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::debug;

use qexplorer_model::{Entity, EntityId, Model};

use crate::error::{SetupError, SetupResult};
use crate::kinds::{Collections, EXCHANGE};

/// Single-mode ladder operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LadderOp {
    /// Annihilation `a`.
    Destroy,
    /// Creation `a†`.
    Create,
    /// Number `a†a`.
    Number,
}

impl fmt::Display for LadderOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LadderOp::Destroy => write!(f, "a"),
            LadderOp::Create => write!(f, "a†"),
            LadderOp::Number => write!(f, "n"),
        }
    }
}

/// A weighted product of ladder operators, applied right to left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorTerm {
    pub coeff: Complex64,
    /// `(mode index, operator)` factors in written order.
    pub factors: Vec<(usize, LadderOp)>,
}

impl OperatorTerm {
    pub fn new(coeff: impl Into<Complex64>, factors: impl IntoIterator<Item = (usize, LadderOp)>) -> Self {
        Self {
            coeff: coeff.into(),
            factors: factors.into_iter().collect(),
        }
    }

    /// Highest mode index touched, or `None` for a scalar.
    pub fn max_mode(&self) -> Option<usize> {
        self.factors.iter().map(|(m, _)| *m).max()
    }
}

/// A sum of [`OperatorTerm`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    terms: Vec<OperatorTerm>,
}

impl Operator {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_terms(terms: Vec<OperatorTerm>) -> Self {
        Self { terms }
    }

    pub fn number(mode: usize) -> Self {
        Self::single(1.0, [(mode, LadderOp::Number)])
    }

    pub fn destroy(mode: usize) -> Self {
        Self::single(1.0, [(mode, LadderOp::Destroy)])
    }

    /// `a + a†` on one mode.
    pub fn quadrature(mode: usize) -> Self {
        Self::from_terms(vec![
            OperatorTerm::new(1.0, [(mode, LadderOp::Destroy)]),
            OperatorTerm::new(1.0, [(mode, LadderOp::Create)]),
        ])
    }

    fn single(coeff: f64, factors: impl IntoIterator<Item = (usize, LadderOp)>) -> Self {
        Self::from_terms(vec![OperatorTerm::new(coeff, factors)])
    }

    pub fn terms(&self) -> &[OperatorTerm] {
        &self.terms
    }

    pub fn is_zero(&self) -> bool {
        self.terms.iter().all(|t| t.coeff == Complex64::new(0.0, 0.0))
    }

    /// Multiply every coefficient by `factor`.
    pub fn scaled(mut self, factor: f64) -> Self {
        for term in &mut self.terms {
            term.coeff *= factor;
        }
        self
    }

    /// Append `coeff · factors`, skipping zero coefficients.
    pub fn push(&mut self, coeff: f64, factors: impl IntoIterator<Item = (usize, LadderOp)>) {
        if coeff != 0.0 {
            self.terms.push(OperatorTerm::new(coeff, factors));
        }
    }

    /// Highest mode index touched by any term.
    pub fn max_mode(&self) -> Option<usize> {
        self.terms.iter().filter_map(OperatorTerm::max_mode).max()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            if term.coeff.im == 0.0 {
                write!(f, "{}", term.coeff.re)?;
            } else {
                write!(f, "({})", term.coeff)?;
            }
            for (mode, op) in &term.factors {
                write!(f, "·{op}{mode}")?;
            }
        }
        Ok(())
    }
}

/// One bosonic mode of the assembled system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeSpec {
    pub name: String,
    pub dimension: usize,
}

/// Most legs a mode's initial cat state may have.
pub const MAX_LEGS: usize = 64;

/// Initial state of one mode: an unnormalized superposition of displaced
/// vacua, `Σ_k w_k D(β_k)|0⟩`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatState {
    pub displacements: Vec<Complex64>,
    /// One complex weight per leg.
    pub weights: Vec<Complex64>,
}

impl CatState {
    /// Equal-weight legs equally spaced in phase around displacement `alpha`.
    pub fn new(alpha: f64, legs: usize) -> Self {
        Self::with_phases(alpha, legs, &[])
    }

    /// Legs weighted by `phases`; missing weights are `1`, extra ones are
    /// ignored.
    pub fn with_phases(alpha: f64, legs: usize, phases: &[Complex64]) -> Self {
        let displacements = (0..legs)
            .map(|k| Complex64::from_polar(alpha, 2.0 * PI * k as f64 / legs as f64))
            .collect();
        let weights = (0..legs)
            .map(|k| phases.get(k).copied().unwrap_or(Complex64::ONE))
            .collect();
        Self {
            displacements,
            weights,
        }
    }

    pub fn legs(&self) -> usize {
        self.displacements.len()
    }
}

/// Parse a comma-separated list of complex leg weights (`1, -1, 0.5+0.5i`).
/// An empty list is allowed.
pub fn parse_leg_phases(raw: &str) -> Result<Vec<Complex64>, String> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',')
        .map(|item| {
            let compact: String = item.chars().filter(|c| !c.is_whitespace()).collect();
            let value: Complex64 = compact
                .parse()
                .map_err(|_| format!("'{}' is not a complex number", item.trim()))?;
            if value.is_finite() {
                Ok(value)
            } else {
                Err(format!("'{}' is not finite", item.trim()))
            }
        })
        .collect()
}

/// Render leg weights back into the list form [`parse_leg_phases`] reads.
pub fn format_leg_phases(phases: &[Complex64]) -> String {
    phases
        .iter()
        .map(|c| if c.im == 0.0 { c.re.to_string() } else { c.to_string() })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Time-dependent drive contribution `operator · f(t; args)`.
///
/// The expression names its time variable `t` and each argument by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveTerm {
    pub operator: Operator,
    pub expression: String,
    pub args: Vec<(String, f64)>,
}

impl DriveTerm {
    /// `amplitude·(a + a†)·cos(df<i>·t + phi<i>)` on mode `mode`.
    pub fn cosine(mode: usize, amplitude: f64, frequency: f64, phase_degrees: f64) -> Self {
        Self {
            operator: Operator::quadrature(mode).scaled(amplitude),
            expression: format!("cos(df{mode}*t + phi{mode})"),
            args: vec![
                (format!("df{mode}"), frequency),
                (format!("phi{mode}"), PI * phase_degrees / 180.0),
            ],
        }
    }
}

/// One step of a sequence: a time grid starting at zero plus the drives
/// active during it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub label: String,
    pub times: Vec<f64>,
    pub drives: Vec<DriveTerm>,
}

impl Segment {
    /// Length of the segment in time units.
    pub fn duration(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }
}

/// Static part of the system: modes, `H0`, collapse operators and the
/// initial state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemModel {
    pub modes: Vec<ModeSpec>,
    pub hamiltonian: Operator,
    pub collapse: Vec<Operator>,
    pub initial: Vec<CatState>,
}

impl SystemModel {
    /// Gather Hamiltonian, collapse operators and initial state from the
    /// Modes and Cross-Mode Terms of a project tree.
    pub fn assemble(model: &Model, collections: &Collections) -> SetupResult<Self> {
        let mode_ids = model.items(collections.modes)?;
        let mut modes = Vec::with_capacity(mode_ids.len());
        let mut hamiltonian = Operator::zero();
        let mut collapse = Vec::new();
        let mut initial = Vec::with_capacity(mode_ids.len());

        for (i, &id) in mode_ids.iter().enumerate() {
            let mode = model.entity(id)?;
            let dimension = positive(mode, "dimension")?;
            let legs = positive(mode, "initial_leg_count")?;
            if legs > MAX_LEGS {
                return Err(SetupError::invalid(
                    mode.name(),
                    "initial_leg_count",
                    format!("at most {MAX_LEGS} legs, got {legs}"),
                ));
            }
            let phases = parse_leg_phases(mode.text("initial_leg_phases")?)
                .map_err(|reason| SetupError::invalid(mode.name(), "initial_leg_phases", reason))?;

            hamiltonian.push(mode.number("frequency")?, [(i, LadderOp::Number)]);
            hamiltonian.push(
                mode.number("anharmonicity")?,
                [(i, LadderOp::Number), (i, LadderOp::Number)],
            );

            let decay = mode.number("decay")?;
            if decay != 0.0 {
                collapse.push(Operator::destroy(i).scaled(decay));
            }
            let dephasing = mode.number("dephasing")?;
            if dephasing != 0.0 {
                collapse.push(Operator::number(i).scaled(dephasing));
            }

            initial.push(CatState::with_phases(
                mode.number("initial_displacement")?,
                legs,
                &phases,
            ));
            modes.push(ModeSpec {
                name: mode.name().to_string(),
                dimension,
            });
        }

        for &id in model.items(collections.cross_terms)? {
            let term = model.entity(id)?;
            let i = mode_position(model, collections, term.reference("mode_1")?)?;
            let j = mode_position(model, collections, term.reference("mode_2")?)?;
            let g = term.number("strength")?;
            if term.text("coupling")? == EXCHANGE {
                hamiltonian.push(g, [(i, LadderOp::Create), (j, LadderOp::Destroy)]);
                hamiltonian.push(g, [(i, LadderOp::Destroy), (j, LadderOp::Create)]);
            } else {
                hamiltonian.push(g, [(i, LadderOp::Number), (j, LadderOp::Number)]);
            }
        }

        debug!(
            modes = modes.len(),
            terms = hamiltonian.terms().len(),
            collapse = collapse.len(),
            "system assembled"
        );
        let system = Self {
            modes,
            hamiltonian,
            collapse,
            initial,
        };
        system.hilbert_dimension()?;
        Ok(system)
    }

    /// Dimension of each mode, in mode order.
    pub fn dims(&self) -> Vec<usize> {
        self.modes.iter().map(|m| m.dimension).collect()
    }

    /// Dimension of the full tensor-product space, or an error when it
    /// does not fit in `usize`.
    pub fn hilbert_dimension(&self) -> SetupResult<usize> {
        self.modes
            .iter()
            .try_fold(1usize, |acc, m| acc.checked_mul(m.dimension))
            .ok_or_else(|| SetupError::invalid("system", "dimension", "Hilbert space dimension overflows"))
    }
}

/// Index of a mode entity in the Modes collection.
pub(crate) fn mode_position(model: &Model, collections: &Collections, id: EntityId) -> SetupResult<usize> {
    model
        .collection(collections.modes)?
        .position(id)
        .ok_or_else(|| SetupError::WrongItem {
            name: model.name(id).map_or_else(|_| id.to_string(), str::to_string),
            expected: "a mode",
        })
}

fn positive(entity: &Entity, key: &str) -> SetupResult<usize> {
    let value = entity.integer(key)?;
    usize::try_from(value)
        .ok()
        .filter(|&v| v > 0)
        .ok_or_else(|| SetupError::invalid(entity.name(), key, format!("must be at least 1, got {value}")))
}
