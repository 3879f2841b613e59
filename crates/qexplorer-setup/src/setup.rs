//! The project tree.

use num_complex::Complex64;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use qexplorer_model::{
    CollectionId, EntityId, EventBus, FieldKind, FieldValue, Model, ModelError, RecoerceFailure,
    Variables,
};

use crate::compute::OutputData;
use crate::error::{SetupError, SetupResult};
use crate::kinds::{self, Collections, SEQUENCE, STEP_PREFIX};
use crate::system::{MAX_LEGS, format_leg_phases, parse_leg_phases};

/// Supplies a value for a variable a formula uses but nobody defined yet.
///
/// Returning `None` aborts the edit that needed it.
pub trait VariablePrompt {
    fn define(&mut self, name: &str) -> Option<f64>;
}

impl<F> VariablePrompt for F
where
    F: FnMut(&str) -> Option<f64>,
{
    fn define(&mut self, name: &str) -> Option<f64> {
        self(name)
    }
}

/// A prompt that always declines.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrompt;

impl VariablePrompt for NoPrompt {
    fn define(&mut self, _name: &str) -> Option<f64> {
        None
    }
}

/// Root aggregate of a qexplorer project.
///
/// Owns the entity tree, the seven project collections, the formula
/// variables and the last computed data of every output.
#[derive(Debug)]
pub struct Setup {
    pub(crate) model: Model,
    pub(crate) collections: Collections,
    pub(crate) variables: Variables,
    pub(crate) outputs: FxHashMap<EntityId, OutputData>,
}

impl Setup {
    pub fn new() -> Self {
        let mut model = Model::new();
        let collections = Collections::install(&mut model);
        Self {
            model,
            collections,
            variables: Variables::new(),
            outputs: FxHashMap::default(),
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Change notifications of the underlying tree.
    pub fn events(&mut self) -> &mut EventBus {
        self.model.events()
    }

    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// Data computed for an output, if any.
    pub fn output_data(&self, output: EntityId) -> Option<&OutputData> {
        self.outputs.get(&output)
    }

    // -----------------------------------------------------------------------
    // Variables
    // -----------------------------------------------------------------------

    /// Define or change a variable and re-evaluate every formula field.
    ///
    /// Fields whose formula no longer evaluates keep their old value and
    /// are returned.
    pub fn define_variable(&mut self, name: &str, value: f64) -> SetupResult<Vec<RecoerceFailure>> {
        check_variable_name(name)?;
        if !value.is_finite() {
            return Err(ModelError::coercion(name, value.to_string(), "expected a finite number").into());
        }
        let previous = self.variables.set(name, value);
        debug!(variable = name, value, ?previous, "variable defined");
        Ok(self.recoerce())
    }

    /// Remove a variable and re-evaluate every formula field.
    pub fn remove_variable(&mut self, name: &str) -> (Option<f64>, Vec<RecoerceFailure>) {
        let previous = self.variables.remove(name);
        (previous, self.recoerce())
    }

    pub(crate) fn recoerce(&mut self) -> Vec<RecoerceFailure> {
        let failures = self.model.recoerce_formulas(&self.variables);
        for failure in &failures {
            warn!(entity = %failure.entity, key = %failure.key, error = %failure.error, "formula kept stale value");
        }
        failures
    }

    // -----------------------------------------------------------------------
    // Edits
    // -----------------------------------------------------------------------

    /// Set a field from raw text.
    ///
    /// A formula naming an undefined variable asks `prompt` for its value and
    /// retries; declining aborts with [`ModelError::UnknownVariable`]. A
    /// rejected edit keeps the field and drops every variable the prompt
    /// supplied along the way.
    pub fn set_field(
        &mut self,
        id: EntityId,
        key: &str,
        raw: &str,
        prompt: &mut dyn VariablePrompt,
    ) -> SetupResult<()> {
        let entity = self.model.entity(id)?;
        let is_mode = entity.kind() == kinds::MODE;
        if is_mode && key == "initial_leg_phases" {
            parse_leg_phases(raw).map_err(|reason| SetupError::invalid(entity.name(), key, reason))?;
        }

        let snapshot = self.variables.clone();
        let result = self.set_field_prompting(id, key, raw, prompt);
        if result.is_err() && self.variables != snapshot {
            debug!(key, "edit rejected, prompted variables discarded");
            self.variables = snapshot;
        }
        result?;

        if is_mode && key == "initial_leg_count" {
            self.resize_leg_phases(id)?;
        }
        Ok(())
    }

    /// Pad a mode's leg phases with `1`, or trim them, to match its leg count.
    fn resize_leg_phases(&mut self, mode: EntityId) -> SetupResult<()> {
        let entity = self.model.entity(mode)?;
        let legs = match usize::try_from(entity.integer("initial_leg_count")?) {
            Ok(legs) if (1..=MAX_LEGS).contains(&legs) => legs,
            _ => return Ok(()),
        };
        let Ok(mut phases) = parse_leg_phases(entity.text("initial_leg_phases")?) else {
            return Ok(());
        };
        if phases.len() != legs {
            phases.resize(legs, Complex64::ONE);
            self.model
                .set_field(mode, "initial_leg_phases", &format_leg_phases(&phases))?;
        }
        Ok(())
    }

    fn set_field_prompting(
        &mut self,
        id: EntityId,
        key: &str,
        raw: &str,
        prompt: &mut dyn VariablePrompt,
    ) -> SetupResult<()> {
        let mut asked: Vec<String> = Vec::new();
        loop {
            match self.model.set_field_with(id, key, raw, &self.variables) {
                Ok(()) => return Ok(()),
                Err(ModelError::UnknownVariable(name)) if !asked.contains(&name) => {
                    let Some(value) = prompt.define(&name) else {
                        debug!(variable = %name, "variable prompt declined");
                        return Err(ModelError::UnknownVariable(name).into());
                    };
                    check_variable_name(&name)?;
                    if !value.is_finite() {
                        return Err(
                            ModelError::coercion(&name, value.to_string(), "expected a finite number").into(),
                        );
                    }
                    self.variables.set(name.clone(), value);
                    asked.push(name);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    pub fn rename(&mut self, id: EntityId, name: &str) -> SetupResult<String> {
        Ok(self.model.rename(id, name)?)
    }

    /// Add an item of `kind` (default kind when `None`) to any collection.
    pub fn add_item(&mut self, collection: CollectionId, kind: Option<&str>) -> SetupResult<EntityId> {
        if collection == self.collections.cross_terms {
            self.require_two_modes()?;
        }
        Ok(self.model.add_item(collection, kind)?)
    }

    /// Add an item, letting `confirm` edit it and accept or cancel.
    pub fn add_item_with<F>(
        &mut self,
        collection: CollectionId,
        kind: Option<&str>,
        confirm: F,
    ) -> SetupResult<Option<EntityId>>
    where
        F: FnOnce(&mut Model, EntityId) -> bool,
    {
        if collection == self.collections.cross_terms {
            self.require_two_modes()?;
        }
        Ok(self.model.add_item_with(collection, kind, confirm)?)
    }

    pub fn add_mode(&mut self) -> SetupResult<EntityId> {
        Ok(self.model.add_item(self.collections.modes, None)?)
    }

    /// Add a coupling between the first two modes.
    pub fn add_cross_term(&mut self) -> SetupResult<EntityId> {
        self.require_two_modes()?;
        Ok(self.model.add_item(self.collections.cross_terms, None)?)
    }

    fn require_two_modes(&self) -> SetupResult<()> {
        if self.model.items(self.collections.modes)?.len() < 2 {
            return Err(ModelError::EmptyPrerequisite(
                "A cross-mode term needs at least two modes".into(),
            )
            .into());
        }
        Ok(())
    }

    pub fn add_pulse(&mut self) -> SetupResult<EntityId> {
        Ok(self.model.add_item(self.collections.pulses, Some(kinds::PULSE))?)
    }

    pub fn add_wait(&mut self) -> SetupResult<EntityId> {
        Ok(self.model.add_item(self.collections.pulses, Some(kinds::WAIT))?)
    }

    pub fn add_sequence(&mut self) -> SetupResult<EntityId> {
        Ok(self.model.add_item(self.collections.sequences, None)?)
    }

    pub fn add_simulation(&mut self) -> SetupResult<EntityId> {
        Ok(self.model.add_item(self.collections.simulations, None)?)
    }

    pub fn add_sweep(&mut self) -> SetupResult<EntityId> {
        Ok(self.model.add_item(self.collections.sweeps, None)?)
    }

    /// Add an output of `kind` (Wigner when `None`).
    pub fn add_output(&mut self, kind: Option<&str>) -> SetupResult<EntityId> {
        Ok(self.model.add_item(self.collections.outputs, kind)?)
    }

    /// Remove an item and any data computed for it.
    pub fn remove(&mut self, id: EntityId) -> SetupResult<()> {
        self.model.remove_item(id)?;
        if self.outputs.remove(&id).is_some() {
            debug!(output = %id, "dropped output data");
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Sequence steps
    // -----------------------------------------------------------------------

    /// Append a step to a sequence, pointing at `pulse` or the first pulse.
    ///
    /// Returns the new step's field key.
    pub fn add_step(&mut self, sequence: EntityId, pulse: Option<EntityId>) -> SetupResult<String> {
        self.require_sequence(sequence)?;
        if self.model.items(self.collections.pulses)?.is_empty() {
            return Err(ModelError::EmptyPrerequisite("A sequence step needs at least one pulse".into()).into());
        }
        let number = self.step_keys(sequence)?.len() + 1;
        let next = (number..)
            .find(|n| !self.model.entity(sequence).is_ok_and(|e| e.has_field(&format!("step_{n}"))))
            .unwrap_or(number);
        let key = self.model.add_field(
            sequence,
            &format!("{STEP_PREFIX} {next}"),
            FieldKind::Reference(self.collections.pulses),
            pulse.map(FieldValue::Reference),
        )?;
        info!(sequence = %self.model.name(sequence)?, step = %key, "step added");
        Ok(key)
    }

    /// Remove the step at `index` (0-based) and release its edge.
    pub fn remove_step(&mut self, sequence: EntityId, index: usize) -> SetupResult<()> {
        let keys = self.step_keys(sequence)?;
        let key = keys.get(index).ok_or_else(|| {
            SetupError::invalid(
                self.model.name(sequence).unwrap_or_default(),
                "steps",
                format!("no step at position {index} of {}", keys.len()),
            )
        })?;
        self.model.remove_field(sequence, key)?;
        Ok(())
    }

    /// Pulses of a sequence in step order.
    pub fn steps(&self, sequence: EntityId) -> SetupResult<Vec<EntityId>> {
        let entity = self.model.entity(sequence)?;
        self.step_keys(sequence)?
            .iter()
            .map(|key| entity.reference(key).map_err(SetupError::from))
            .collect()
    }

    fn step_keys(&self, sequence: EntityId) -> SetupResult<Vec<String>> {
        self.require_sequence(sequence)?;
        Ok(self
            .model
            .entity(sequence)?
            .fields()
            .iter()
            .filter(|f| matches!(f.kind(), FieldKind::Reference(c) if *c == self.collections.pulses))
            .map(|f| f.key().to_string())
            .collect())
    }

    fn require_sequence(&self, id: EntityId) -> SetupResult<()> {
        self.require_kind(id, SEQUENCE, "a sequence")
    }

    pub(crate) fn require_kind(&self, id: EntityId, kind: &str, expected: &'static str) -> SetupResult<()> {
        let entity = self.model.entity(id)?;
        if entity.kind() == kind {
            Ok(())
        } else {
            Err(SetupError::WrongItem {
                name: entity.name().to_string(),
                expected,
            })
        }
    }

    /// Find an item by display name, optionally limited to one collection.
    ///
    /// Without a collection the name must be unique across the tree.
    pub fn find(&self, collection: Option<CollectionId>, name: &str) -> Option<EntityId> {
        match collection {
            Some(c) => self.model.item_by_name(c, name),
            None => {
                let mut hits = self
                    .collections
                    .all()
                    .into_iter()
                    .filter_map(|c| self.model.item_by_name(c, name));
                let first = hits.next()?;
                hits.next().is_none().then_some(first)
            }
        }
    }
}

impl Default for Setup {
    fn default() -> Self {
        Self::new()
    }
}

fn check_variable_name(name: &str) -> SetupResult<()> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !matches!(name, "pi" | "e" | "t");
    if valid {
        Ok(())
    } else {
        Err(SetupError::InvalidVariableName(name.to_string()))
    }
}
