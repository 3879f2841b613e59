//! Entity and collection handles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-owning handle to an entity stored in a [`Model`](crate::Model).
///
/// Handles are never reused: once an entity is removed its slot stays empty,
/// so a stale handle resolves to [`ModelError::UnknownEntity`](crate::ModelError)
/// instead of silently pointing at a newer entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        EntityId(id)
    }
}

impl From<usize> for EntityId {
    fn from(id: usize) -> Self {
        EntityId(u32::try_from(id).expect("EntityId overflow: exceeds u32::MAX"))
    }
}

/// Handle to a collection stored in a [`Model`](crate::Model).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollectionId(pub u32);

impl CollectionId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl From<usize> for CollectionId {
    fn from(id: usize) -> Self {
        CollectionId(u32::try_from(id).expect("CollectionId overflow: exceeds u32::MAX"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_display() {
        assert_eq!(format!("{}", EntityId(3)), "e3");
        assert_eq!(EntityId::from(7usize), EntityId(7));
    }

    #[test]
    fn test_collection_id_display() {
        assert_eq!(format!("{}", CollectionId(0)), "c0");
    }
}
