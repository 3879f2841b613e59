//! Parameter sweeps: run a simulation once per value of a variable.

use ndarray::Array1;
use tracing::{info, warn};

use qexplorer_model::EntityId;

use crate::compute::{CancelToken, ComputeOutcome, ComputeProgress, execute};
use crate::error::{SetupError, SetupResult};
use crate::kinds::SWEEP;
use crate::setup::Setup;
use crate::simulator::Simulator;

/// Progress of a running sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepProgress {
    pub point: usize,
    pub total: usize,
    pub value: f64,
    pub compute: ComputeProgress,
}

/// One computed point of a sweep.
#[derive(Debug, Clone)]
pub struct SweepPoint {
    pub value: f64,
    pub outcome: ComputeOutcome,
}

impl Setup {
    /// Values a sweep will visit, `linspace(start, stop, points)`.
    pub fn sweep_values(&self, sweep: EntityId) -> SetupResult<(String, Vec<f64>)> {
        self.require_kind(sweep, SWEEP, "a sweep")?;
        let entity = self.model.entity(sweep)?;
        let variable = entity.text("variable")?.trim().to_string();
        if variable.is_empty() {
            return Err(SetupError::invalid(entity.name(), "variable", "no variable selected"));
        }
        let points = entity.integer("points")?;
        let points = usize::try_from(points)
            .ok()
            .filter(|&p| p > 0)
            .ok_or_else(|| SetupError::invalid(entity.name(), "points", format!("must be at least 1, got {points}")))?;
        let values = Array1::linspace(entity.number("start")?, entity.number("stop")?, points).to_vec();
        Ok((variable, values))
    }

    /// Compute `simulation` at every value of `sweep`.
    ///
    /// Formula fields are re-evaluated at each value. Afterwards the
    /// variable gets its prior value back (or is removed again if it did
    /// not exist), whether or not the sweep succeeded.
    pub fn run_sweep<S, P>(
        &mut self,
        sweep: EntityId,
        simulation: EntityId,
        simulator: &S,
        cancel: &CancelToken,
        mut progress: P,
    ) -> SetupResult<Vec<SweepPoint>>
    where
        S: Simulator + ?Sized,
        P: FnMut(SweepProgress),
    {
        let (variable, values) = self.sweep_values(sweep)?;
        let prior = self.variables.get(&variable);
        info!(variable = %variable, points = values.len(), "sweep started");

        let total = values.len();
        let mut run = || -> SetupResult<Vec<SweepPoint>> {
            let mut points = Vec::with_capacity(total);
            for (point, &value) in values.iter().enumerate() {
                if let Some(failure) = self.define_variable(&variable, value)?.into_iter().next() {
                    return Err(failure.error.into());
                }
                let plan = self.plan(simulation)?;
                let outcome = execute(&plan, simulator, cancel, |compute| {
                    progress(SweepProgress {
                        point,
                        total,
                        value,
                        compute,
                    });
                })?;
                points.push(SweepPoint { value, outcome });
            }
            Ok(points)
        };
        let result = run();

        match prior {
            Some(v) => {
                self.variables.set(variable.as_str(), v);
            }
            None => {
                self.variables.remove(&variable);
            }
        }
        let stale = self.recoerce();
        if !stale.is_empty() {
            warn!(variable = %variable, fields = stale.len(), "fields left stale after sweep");
        }
        result
    }
}
