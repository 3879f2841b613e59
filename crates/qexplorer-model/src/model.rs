//! The entity arena: collections, items, fields and change events.

use std::fmt;

use tracing::{debug, info};

use crate::collection::Collection;
use crate::entity::Entity;
use crate::error::{ModelError, ModelResult};
use crate::events::{EventBus, ModelEvent};
use crate::field::{Field, FieldKind, FieldValue};
use crate::formula::{ExprEvaluator, FormulaError, FormulaEvaluator, Variables};
use crate::id::{CollectionId, EntityId};
use crate::naming::{methodize, unique_name, wordify};
use crate::template::{DefaultValue, EntityTemplate};

/// Owner of every entity and collection of one project tree.
///
/// Entities are stored in an arena and addressed by [`EntityId`]; cross
/// references and dependency edges hold handles, never owning pointers.
/// All mutation goes through `&mut self`, so a model is edited from one
/// thread at a time.
pub struct Model {
    entities: Vec<Option<Entity>>,
    collections: Vec<Collection>,
    events: EventBus,
    evaluator: Box<dyn FormulaEvaluator>,
}

/// A failed re-evaluation during [`Model::recoerce_formulas`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecoerceFailure {
    pub entity: EntityId,
    pub key: String,
    pub error: ModelError,
}

impl Model {
    /// Create an empty model using the built-in formula evaluator.
    pub fn new() -> Self {
        Self::with_evaluator(ExprEvaluator)
    }

    /// Create an empty model with a custom formula evaluator.
    pub fn with_evaluator(evaluator: impl FormulaEvaluator + 'static) -> Self {
        Self {
            entities: Vec::new(),
            collections: Vec::new(),
            events: EventBus::new(),
            evaluator: Box::new(evaluator),
        }
    }

    /// Change notifications.
    pub fn events(&mut self) -> &mut EventBus {
        &mut self.events
    }

    // -----------------------------------------------------------------------
    // Collections
    // -----------------------------------------------------------------------

    /// Add a collection accepting the given kinds (the first is the default).
    pub fn add_collection(
        &mut self,
        name: impl Into<String>,
        kinds: Vec<EntityTemplate>,
    ) -> CollectionId {
        let id = CollectionId::from(self.collections.len());
        let name = name.into();
        debug!(collection = %id, name = %name, kinds = kinds.len(), "adding collection");
        self.collections.push(Collection::new(id, name, kinds));
        id
    }

    pub fn collection(&self, id: CollectionId) -> ModelResult<&Collection> {
        self.collections
            .get(id.index())
            .ok_or(ModelError::UnknownCollection(id))
    }

    fn collection_mut(&mut self, id: CollectionId) -> ModelResult<&mut Collection> {
        self.collections
            .get_mut(id.index())
            .ok_or(ModelError::UnknownCollection(id))
    }

    /// All collections in creation order.
    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    /// Find a collection by name.
    pub fn collection_by_name(&self, name: &str) -> Option<CollectionId> {
        self.collections
            .iter()
            .find(|c| c.name() == name)
            .map(Collection::id)
    }

    /// Children of `collection` in insertion order.
    pub fn items(&self, collection: CollectionId) -> ModelResult<&[EntityId]> {
        self.collection(collection).map(Collection::children)
    }

    /// Linear lookup of a child by display name.
    pub fn item_by_name(&self, collection: CollectionId, name: &str) -> Option<EntityId> {
        let collection = self.collection(collection).ok()?;
        collection
            .children()
            .iter()
            .copied()
            .find(|&id| self.entity(id).is_ok_and(|e| e.name() == name))
    }

    // -----------------------------------------------------------------------
    // Entities
    // -----------------------------------------------------------------------

    pub fn entity(&self, id: EntityId) -> ModelResult<&Entity> {
        self.entities
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(ModelError::UnknownEntity(id))
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> ModelResult<&mut Entity> {
        self.entities
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(ModelError::UnknownEntity(id))
    }

    /// Display name of an entity.
    pub fn name(&self, id: EntityId) -> ModelResult<&str> {
        self.entity(id).map(Entity::name)
    }

    /// Display names for a list of handles; stale handles are skipped.
    pub fn names(&self, ids: &[EntityId]) -> Vec<String> {
        ids.iter()
            .filter_map(|&id| self.entity(id).ok())
            .map(|e| e.name().to_string())
            .collect()
    }

    /// Committed entities, collection by collection, in child order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.collections
            .iter()
            .flat_map(|c| c.children().iter())
            .filter_map(|&id| self.entity(id).ok())
    }

    /// True if `id` is a committed child of some collection.
    pub fn is_committed(&self, id: EntityId) -> bool {
        self.entity(id)
            .ok()
            .and_then(|e| self.collection(e.collection()).ok())
            .is_some_and(|c| c.contains(id))
    }

    /// Build and commit a new item of `kind` (default kind when `None`).
    pub fn add_item(&mut self, collection: CollectionId, kind: Option<&str>) -> ModelResult<EntityId> {
        let id = self.create_pending(collection, kind)?;
        self.commit(id)?;
        Ok(id)
    }

    /// Build a new item and ask `confirm` whether to keep it.
    ///
    /// `confirm` may edit the pending item through the model (this is where
    /// a properties dialog runs). Returning `false` discards the item: it is
    /// never appended, only `ItemCreated` has fired, and any dependency
    /// edges it registered are released.
    pub fn add_item_with<F>(
        &mut self,
        collection: CollectionId,
        kind: Option<&str>,
        confirm: F,
    ) -> ModelResult<Option<EntityId>>
    where
        F: FnOnce(&mut Model, EntityId) -> bool,
    {
        let id = self.create_pending(collection, kind)?;
        if confirm(self, id) {
            self.commit(id)?;
            Ok(Some(id))
        } else {
            debug!(entity = %id, "item creation cancelled");
            self.discard(id)?;
            Ok(None)
        }
    }

    fn create_pending(&mut self, collection: CollectionId, kind: Option<&str>) -> ModelResult<EntityId> {
        let coll = self.collection(collection)?;
        let template = coll
            .kind(kind)
            .cloned()
            .ok_or_else(|| ModelError::UnknownKind {
                collection: coll.name().to_string(),
                kind: kind.unwrap_or("<default>").to_string(),
            })?;

        let id = EntityId::from(self.entities.len());
        self.entities.push(Some(Entity::new(
            id,
            collection,
            template.kind(),
            template.default_name(),
        )));

        if let Err(err) = self.build_fields(id, &template) {
            self.discard(id)?;
            return Err(err);
        }

        self.events.emit(&ModelEvent::ItemCreated {
            collection,
            entity: id,
        });

        let resolved = {
            let proposed = self.name(id)?;
            let siblings = self.sibling_names(collection, id)?;
            unique_name(proposed, siblings.iter().map(String::as_str))
        };
        self.entity_mut(id)?.set_name(resolved);
        Ok(id)
    }

    fn build_fields(&mut self, id: EntityId, template: &EntityTemplate) -> ModelResult<()> {
        for spec in template.fields() {
            let initial = match (&spec.default, &spec.kind) {
                (DefaultValue::Value(v), _) => Some(v.clone()),
                (DefaultValue::Position(pos), FieldKind::Reference(target)) => {
                    let coll = self.collection(*target)?;
                    match coll.children().get(*pos).copied() {
                        Some(t) => Some(FieldValue::Reference(t)),
                        None => {
                            return Err(ModelError::NoEligibleTarget {
                                field: spec.label.clone(),
                                collection: coll.name().to_string(),
                            });
                        }
                    }
                }
                (DefaultValue::Position(_), _) => None,
            };
            self.add_field(id, &spec.label, spec.kind.clone(), initial)?;
        }
        Ok(())
    }

    fn commit(&mut self, id: EntityId) -> ModelResult<()> {
        let collection = self.entity(id)?.collection();
        self.collection_mut(collection)?.children.push(id);
        info!(entity = %id, name = %self.name(id)?, collection = %collection, "item added");
        self.events.emit(&ModelEvent::ItemAdded {
            collection,
            entity: id,
        });
        Ok(())
    }

    /// Release an entity's outgoing edges and free its slot.
    fn discard(&mut self, id: EntityId) -> ModelResult<()> {
        let targets = self.entity(id)?.dependencies.clone();
        for target in targets {
            self.unregister_dependency(target, id)?;
        }
        self.entities[id.index()] = None;
        Ok(())
    }

    /// Remove an item. Refused while other entities reference it.
    pub fn remove_item(&mut self, id: EntityId) -> ModelResult<()> {
        let entity = self.entity(id)?;
        if !entity.dependents.is_empty() {
            return Err(ModelError::DeletionBlocked {
                name: entity.name().to_string(),
                dependents: self.names(&entity.dependents),
            });
        }
        let collection = entity.collection();
        let name = entity.name().to_string();

        self.discard(id)?;
        self.collection_mut(collection)?.children.retain(|&c| c != id);
        info!(entity = %id, name = %name, "item removed");
        self.events.emit(&ModelEvent::ItemRemoved {
            collection,
            entity: id,
            name,
        });
        Ok(())
    }

    /// Rename an entity. A name already used by a sibling is incremented
    /// until unique; the final name is returned.
    pub fn rename(&mut self, id: EntityId, new_name: &str) -> ModelResult<String> {
        let collection = self.entity(id)?.collection();
        let siblings = self.sibling_names(collection, id)?;
        let resolved = unique_name(new_name, siblings.iter().map(String::as_str));
        let old = self.entity_mut(id)?.set_name(resolved.clone());
        if old != resolved && self.is_committed(id) {
            debug!(entity = %id, old = %old, new = %resolved, "renamed");
            self.events.emit(&ModelEvent::NameChanged {
                entity: id,
                old,
                new: resolved.clone(),
            });
        }
        Ok(resolved)
    }

    fn sibling_names(&self, collection: CollectionId, except: EntityId) -> ModelResult<Vec<String>> {
        Ok(self
            .collection(collection)?
            .children()
            .iter()
            .filter(|&&c| c != except)
            .filter_map(|&c| self.entity(c).ok())
            .map(|e| e.name().to_string())
            .collect())
    }

    // -----------------------------------------------------------------------
    // Fields
    // -----------------------------------------------------------------------

    /// Append a field to an entity and return its lookup key.
    ///
    /// Without an initial value, references default to the first item of
    /// their target collection and other kinds to their zero value.
    pub fn add_field(
        &mut self,
        id: EntityId,
        label: &str,
        kind: FieldKind,
        initial: Option<FieldValue>,
    ) -> ModelResult<String> {
        let key = methodize(&wordify(label));
        let value = match initial {
            Some(v) => v,
            None => self.zero_value(label, &kind)?,
        };
        if !kind.accepts(&value) {
            return Err(ModelError::coercion(&key, value.to_string(), format!(
                "expected {}",
                kind.describe()
            )));
        }
        if let (FieldKind::Reference(target_coll), FieldValue::Reference(target)) = (&kind, &value) {
            self.check_target(*target_coll, *target)?;
        }

        let target = value.as_reference();
        self.entity_mut(id)?
            .push_field(Field::new(label, kind, value))?;
        if let Some(target) = target {
            self.register_dependency(target, id)?;
        }
        Ok(key)
    }

    fn zero_value(&self, label: &str, kind: &FieldKind) -> ModelResult<FieldValue> {
        Ok(match kind {
            FieldKind::Integer => FieldValue::Integer(0),
            FieldKind::Float => FieldValue::Float(0.0),
            FieldKind::Boolean => FieldValue::Boolean(false),
            FieldKind::Text => FieldValue::Text(String::new()),
            FieldKind::Formula => FieldValue::constant(0.0),
            FieldKind::Enumeration(options) => match options.first() {
                Some(first) => FieldValue::Choice(first.clone()),
                None => {
                    return Err(ModelError::coercion(methodize(label), "", "enumeration has no options"));
                }
            },
            FieldKind::Reference(target) => {
                let coll = self.collection(*target)?;
                match coll.children().first() {
                    Some(&first) => FieldValue::Reference(first),
                    None => {
                        return Err(ModelError::NoEligibleTarget {
                            field: label.to_string(),
                            collection: coll.name().to_string(),
                        });
                    }
                }
            }
        })
    }

    /// Remove a field, releasing its dependency edge if it was the last
    /// reference to that target.
    pub fn remove_field(&mut self, id: EntityId, key: &str) -> ModelResult<Field> {
        let field = self.entity_mut(id)?.take_field(key)?;
        if let Some(target) = field.value().as_reference() {
            if !self.references_elsewhere(id, target, None)? {
                self.unregister_dependency(target, id)?;
            }
        }
        Ok(field)
    }

    /// Current value of a field.
    pub fn field(&self, id: EntityId, key: &str) -> ModelResult<&FieldValue> {
        self.entity(id)?.get(key)
    }

    /// Field value as it would be shown in a property editor; references
    /// render as their target's name.
    pub fn display_value(&self, id: EntityId, key: &str) -> ModelResult<String> {
        match self.field(id, key)? {
            FieldValue::Reference(target) => Ok(self.name(*target)?.to_string()),
            other => Ok(other.to_string()),
        }
    }

    /// Set a field from raw editor text, with no variables defined.
    pub fn set_field(&mut self, id: EntityId, key: &str, raw: &str) -> ModelResult<()> {
        self.set_field_with(id, key, raw, &Variables::new())
    }

    /// Set a field from raw editor text.
    ///
    /// References are resolved by name in their target collection; formulas
    /// are evaluated against `variables`. On any error the stored value is
    /// unchanged.
    pub fn set_field_with(
        &mut self,
        id: EntityId,
        key: &str,
        raw: &str,
        variables: &Variables,
    ) -> ModelResult<()> {
        let kind = self.entity(id)?.field(key)?.kind().clone();
        let value = match kind {
            FieldKind::Reference(target_coll) => {
                let target = self
                    .item_by_name(target_coll, raw.trim())
                    .ok_or_else(|| {
                        let coll = self
                            .collection(target_coll)
                            .map(|c| c.name().to_string())
                            .unwrap_or_default();
                        ModelError::coercion(key, raw, format!("no item named '{}' in {coll}", raw.trim()))
                    })?;
                return self.set_reference(id, key, target);
            }
            FieldKind::Formula => self.evaluate(key, raw, variables)?,
            ref other => other.coerce(key, raw)?,
        };
        self.assign(id, key, value)
    }

    /// Set a field to an already-typed value.
    pub fn set_value(&mut self, id: EntityId, key: &str, value: FieldValue) -> ModelResult<()> {
        let kind = self.entity(id)?.field(key)?.kind().clone();
        if !kind.accepts(&value) {
            return Err(ModelError::coercion(key, value.to_string(), format!(
                "expected {}",
                kind.describe()
            )));
        }
        match value {
            FieldValue::Reference(target) => self.set_reference(id, key, target),
            other => self.assign(id, key, other),
        }
    }

    /// Point a reference field at `target`, moving the dependency edge.
    ///
    /// Assigning the current target again is a no-op and never duplicates
    /// the edge.
    pub fn set_reference(&mut self, id: EntityId, key: &str, target: EntityId) -> ModelResult<()> {
        let field = self.entity(id)?.field(key)?;
        let target_coll = match field.kind() {
            FieldKind::Reference(c) => *c,
            _ => {
                return Err(ModelError::WrongKind {
                    key: key.to_string(),
                    expected: "a reference",
                });
            }
        };
        let old = field.value().as_reference();
        self.check_target(target_coll, target)?;

        if old == Some(target) {
            self.register_dependency(target, id)?;
            return Ok(());
        }

        self.register_dependency(target, id)?;
        if let Some(old) = old {
            if !self.references_elsewhere(id, old, Some(key))? {
                self.unregister_dependency(old, id)?;
            }
        }
        self.assign(id, key, FieldValue::Reference(target))
    }

    fn check_target(&self, collection: CollectionId, target: EntityId) -> ModelResult<()> {
        let coll = self.collection(collection)?;
        if coll.contains(target) {
            Ok(())
        } else {
            Err(ModelError::ForeignReference {
                target: self
                    .name(target)
                    .map_or_else(|_| target.to_string(), str::to_string),
                collection: coll.name().to_string(),
            })
        }
    }

    /// True if a reference field of `id` other than `except` points at
    /// `target`.
    fn references_elsewhere(
        &self,
        id: EntityId,
        target: EntityId,
        except: Option<&str>,
    ) -> ModelResult<bool> {
        Ok(self.entity(id)?.fields().iter().any(|f| {
            Some(f.key()) != except && f.value().as_reference() == Some(target)
        }))
    }

    /// Store a value. Edits to an item that is still awaiting confirmation
    /// are silent.
    fn assign(&mut self, id: EntityId, key: &str, value: FieldValue) -> ModelResult<()> {
        let old = self.entity_mut(id)?.field_mut(key)?.replace_value(value);
        if self.entity(id)?.get(key)? != &old && self.is_committed(id) {
            self.events.emit(&ModelEvent::FieldChanged {
                entity: id,
                key: key.to_string(),
            });
        }
        Ok(())
    }

    fn evaluate(&self, key: &str, raw: &str, variables: &Variables) -> ModelResult<FieldValue> {
        let expr = raw.trim();
        match self.evaluator.evaluate(expr, variables) {
            Ok(value) => Ok(FieldValue::Formula {
                expr: expr.to_string(),
                value,
            }),
            Err(FormulaError::UnknownVariable(name)) => Err(ModelError::UnknownVariable(name)),
            Err(e) => Err(ModelError::coercion(key, raw, e.to_string())),
        }
    }

    /// Re-evaluate every formula field against `variables`.
    ///
    /// Fields that fail keep their previous value and are reported.
    pub fn recoerce_formulas(&mut self, variables: &Variables) -> Vec<RecoerceFailure> {
        let mut pending = Vec::new();
        for entity in self.entities.iter().flatten() {
            for field in entity.fields() {
                if let FieldValue::Formula { expr, .. } = field.value() {
                    pending.push((entity.id(), field.key().to_string(), expr.clone()));
                }
            }
        }

        let mut failures = Vec::new();
        for (id, key, expr) in pending {
            let result = self
                .evaluate(&key, &expr, variables)
                .and_then(|value| self.assign(id, &key, value));
            if let Err(error) = result {
                failures.push(RecoerceFailure {
                    entity: id,
                    key,
                    error,
                });
            }
        }
        if !failures.is_empty() {
            debug!(failed = failures.len(), "formula recoercion left stale values");
        }
        failures
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("collections", &self.collections)
            .field("entities", &self.entities.iter().flatten().count())
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
