//! Named entities with typed fields and dependency edges.

use rustc_hash::FxHashMap;

use crate::error::{ModelError, ModelResult};
use crate::field::{Field, FieldValue};
use crate::id::{CollectionId, EntityId};

/// A renamable, typed record owned by a collection.
///
/// Fields keep their insertion order for display; lookup by key goes
/// through an index map. Dependency edges are stored as handles on both
/// endpoints and are only ever edited by the [`Model`](crate::Model), which
/// keeps the two sides in step.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    collection: CollectionId,
    kind: String,
    name: String,
    fields: Vec<Field>,
    index: FxHashMap<String, usize>,
    pub(crate) dependents: Vec<EntityId>,
    pub(crate) dependencies: Vec<EntityId>,
}

impl Entity {
    pub(crate) fn new(
        id: EntityId,
        collection: CollectionId,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            collection,
            kind: kind.into(),
            name: name.into(),
            fields: Vec::new(),
            index: FxHashMap::default(),
            dependents: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The collection that owns this entity.
    pub fn collection(&self) -> CollectionId {
        self.collection
    }

    /// Kind label this entity was built from, e.g. `"Pulse"`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) -> String {
        std::mem::replace(&mut self.name, name)
    }

    /// Fields in display order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// True if the entity has a field with this key.
    pub fn has_field(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Look up a field by key.
    pub fn field(&self, key: &str) -> ModelResult<&Field> {
        self.index
            .get(key)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| self.unknown_field(key))
    }

    pub(crate) fn field_mut(&mut self, key: &str) -> ModelResult<&mut Field> {
        match self.index.get(key) {
            Some(&i) => Ok(&mut self.fields[i]),
            None => Err(self.unknown_field(key)),
        }
    }

    /// Current value of a field.
    pub fn get(&self, key: &str) -> ModelResult<&FieldValue> {
        self.field(key).map(Field::value)
    }

    pub(crate) fn push_field(&mut self, field: Field) -> ModelResult<()> {
        if self.index.contains_key(field.key()) {
            return Err(ModelError::DuplicateField {
                entity: self.name.clone(),
                key: field.key().to_string(),
            });
        }
        self.index.insert(field.key().to_string(), self.fields.len());
        self.fields.push(field);
        Ok(())
    }

    pub(crate) fn take_field(&mut self, key: &str) -> ModelResult<Field> {
        let pos = self
            .index
            .remove(key)
            .ok_or_else(|| self.unknown_field(key))?;
        let field = self.fields.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Ok(field)
    }

    /// Integer value of `key`.
    pub fn integer(&self, key: &str) -> ModelResult<i64> {
        match self.get(key)? {
            FieldValue::Integer(v) => Ok(*v),
            _ => Err(wrong_kind(key, "an integer")),
        }
    }

    /// Numeric value of `key` for integer, float and formula fields.
    pub fn number(&self, key: &str) -> ModelResult<f64> {
        self.get(key)?
            .as_f64()
            .ok_or_else(|| wrong_kind(key, "numeric"))
    }

    /// Boolean value of `key`.
    pub fn boolean(&self, key: &str) -> ModelResult<bool> {
        match self.get(key)? {
            FieldValue::Boolean(v) => Ok(*v),
            _ => Err(wrong_kind(key, "a boolean")),
        }
    }

    /// Text or enumeration value of `key`.
    pub fn text(&self, key: &str) -> ModelResult<&str> {
        match self.get(key)? {
            FieldValue::Text(s) | FieldValue::Choice(s) => Ok(s),
            _ => Err(wrong_kind(key, "text")),
        }
    }

    /// Referenced entity of `key`.
    pub fn reference(&self, key: &str) -> ModelResult<EntityId> {
        self.get(key)?
            .as_reference()
            .ok_or_else(|| wrong_kind(key, "a reference"))
    }

    /// Entities that reference this one, in registration order.
    pub fn dependents(&self) -> &[EntityId] {
        &self.dependents
    }

    /// Entities this one references, in registration order.
    pub fn dependencies(&self) -> &[EntityId] {
        &self.dependencies
    }

    fn unknown_field(&self, key: &str) -> ModelError {
        ModelError::UnknownField {
            entity: self.name.clone(),
            key: key.to_string(),
        }
    }
}

fn wrong_kind(key: &str, expected: &'static str) -> ModelError {
    ModelError::WrongKind {
        key: key.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;

    fn mode() -> Entity {
        let mut e = Entity::new(EntityId(0), CollectionId(0), "Mode", "Mode");
        e.push_field(Field::new("Dimension", FieldKind::Integer, FieldValue::Integer(2)))
            .unwrap();
        e.push_field(Field::new("Frequency", FieldKind::Formula, FieldValue::constant(1.0)))
            .unwrap();
        e.push_field(Field::new("Decay", FieldKind::Formula, FieldValue::constant(0.0)))
            .unwrap();
        e
    }

    #[test]
    fn test_typed_access() {
        let e = mode();
        assert_eq!(e.integer("dimension").unwrap(), 2);
        assert_eq!(e.number("dimension").unwrap(), 2.0);
        assert_eq!(e.number("frequency").unwrap(), 1.0);
        assert!(matches!(
            e.boolean("dimension"),
            Err(ModelError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_unknown_field() {
        let e = mode();
        let err = e.get("detuning").unwrap_err();
        assert_eq!(
            err,
            ModelError::UnknownField {
                entity: "Mode".into(),
                key: "detuning".into()
            }
        );
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let mut e = mode();
        let err = e
            .push_field(Field::new("dimension", FieldKind::Integer, FieldValue::Integer(3)))
            .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateField { .. }));
        assert_eq!(e.fields().len(), 3);
    }

    #[test]
    fn test_take_field_reindexes() {
        let mut e = mode();
        let taken = e.take_field("frequency").unwrap();
        assert_eq!(taken.key(), "frequency");
        assert_eq!(e.number("decay").unwrap(), 0.0);
        assert_eq!(e.integer("dimension").unwrap(), 2);
        let keys: Vec<&str> = e.fields().iter().map(Field::key).collect();
        assert_eq!(keys, vec!["dimension", "decay"]);
    }
}
