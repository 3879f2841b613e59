//! Ordered, named containers of entities.

use crate::id::{CollectionId, EntityId};
use crate::template::EntityTemplate;

/// An ordered container of entities of one or more permitted kinds.
///
/// Child order is insertion order and is the canonical positional index:
/// "the second mode" is `children()[1]`. Renames never reorder.
#[derive(Debug, Clone)]
pub struct Collection {
    id: CollectionId,
    name: String,
    kinds: Vec<EntityTemplate>,
    pub(crate) children: Vec<EntityId>,
}

impl Collection {
    pub(crate) fn new(id: CollectionId, name: impl Into<String>, kinds: Vec<EntityTemplate>) -> Self {
        Self {
            id,
            name: name.into(),
            kinds,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> CollectionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Permitted kinds, default first.
    pub fn kinds(&self) -> &[EntityTemplate] {
        &self.kinds
    }

    /// Template for `label`, or the default kind when `label` is `None`.
    pub fn kind(&self, label: Option<&str>) -> Option<&EntityTemplate> {
        match label {
            Some(label) => self.kinds.iter().find(|t| t.kind() == label),
            None => self.kinds.first(),
        }
    }

    /// Committed children in insertion order.
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Position of `id` among the children.
    pub fn position(&self, id: EntityId) -> Option<usize> {
        self.children.iter().position(|&c| c == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.children.contains(&id)
    }
}
