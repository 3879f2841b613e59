//! Dependency edges between entities.
//!
//! An edge `target <- referrer` exists while some reference field of
//! `referrer` points at `target`. Each edge is recorded on both endpoints:
//! in `target.dependents` and in `referrer.dependencies`. Both sides are
//! always added and removed together.

use tracing::trace;

use crate::error::{ModelError, ModelResult};
use crate::id::EntityId;
use crate::model::Model;

impl Model {
    /// Record that `referrer` references `target`.
    ///
    /// Idempotent: returns `false` when the edge already existed.
    pub fn register_dependency(&mut self, target: EntityId, referrer: EntityId) -> ModelResult<bool> {
        self.entity(referrer)?;
        if self.entity(target)?.dependents.contains(&referrer) {
            return Ok(false);
        }
        self.entity_mut(target)?.dependents.push(referrer);
        self.entity_mut(referrer)?.dependencies.push(target);
        trace!(%target, %referrer, "dependency registered");
        Ok(true)
    }

    /// Remove the edge `target <- referrer` from both endpoints.
    ///
    /// Removing an edge that does not exist is a caller bug and is reported
    /// as [`ModelError::MissingDependency`] rather than ignored.
    pub fn unregister_dependency(&mut self, target: EntityId, referrer: EntityId) -> ModelResult<()> {
        self.entity(referrer)?;
        if !self.entity(target)?.dependents.contains(&referrer) {
            return Err(ModelError::MissingDependency { target, referrer });
        }
        self.entity_mut(target)?.dependents.retain(|&d| d != referrer);
        self.entity_mut(referrer)?.dependencies.retain(|&d| d != target);
        trace!(%target, %referrer, "dependency unregistered");
        Ok(())
    }

    /// True if nothing references `id`.
    pub fn can_delete(&self, id: EntityId) -> ModelResult<bool> {
        Ok(self.entity(id)?.dependents.is_empty())
    }

    /// Entities referencing `id`.
    pub fn dependents(&self, id: EntityId) -> ModelResult<&[EntityId]> {
        Ok(self.entity(id)?.dependents())
    }

    /// Entities referenced by `id`.
    pub fn dependencies(&self, id: EntityId) -> ModelResult<&[EntityId]> {
        Ok(self.entity(id)?.dependencies())
    }
}
