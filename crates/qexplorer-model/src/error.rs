//! Error types for the model crate.

use crate::id::{CollectionId, EntityId};
use thiserror::Error;

/// Errors that can occur while editing the entity tree.
///
/// Every operation returning one of these leaves the model exactly as it
/// was before the call.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// Entity handle does not resolve to a live entity.
    #[error("Entity {0} not found")]
    UnknownEntity(EntityId),

    /// Collection handle does not resolve.
    #[error("Collection {0} not found")]
    UnknownCollection(CollectionId),

    /// Field key is not present on the entity.
    #[error("'{entity}' has no field '{key}'")]
    UnknownField {
        /// Display name of the entity.
        entity: String,
        /// The requested lookup key.
        key: String,
    },

    /// A field with the same lookup key already exists on the entity.
    #[error("'{entity}' already has a field '{key}'")]
    DuplicateField {
        /// Display name of the entity.
        entity: String,
        /// The conflicting lookup key.
        key: String,
    },

    /// Raw input could not be converted to the field's kind.
    #[error("Cannot set '{key}' to '{raw}': {reason}")]
    Coercion {
        /// Field lookup key.
        key: String,
        /// The rejected raw input.
        raw: String,
        /// Why the conversion failed.
        reason: String,
    },

    /// A typed accessor was used on a field of another kind.
    #[error("Field '{key}' is not {expected}")]
    WrongKind {
        /// Field lookup key.
        key: String,
        /// Human-readable name of the expected kind.
        expected: &'static str,
    },

    /// Entity still has dependents and cannot be removed.
    #[error("Cannot delete '{name}': it is used by {}", .dependents.join(", "))]
    DeletionBlocked {
        /// Display name of the entity that was to be removed.
        name: String,
        /// Display names of the entities referencing it.
        dependents: Vec<String>,
    },

    /// Operation needs a non-empty collection.
    #[error("{0}")]
    EmptyPrerequisite(String),

    /// A reference field has no candidate target.
    #[error("Field '{field}' needs an item in '{collection}', but it is empty")]
    NoEligibleTarget {
        /// Field label.
        field: String,
        /// Name of the target collection.
        collection: String,
    },

    /// A reference points at an entity outside the field's target collection.
    #[error("'{target}' is not an item of '{collection}'")]
    ForeignReference {
        /// Display name of the rejected target.
        target: String,
        /// Name of the field's target collection.
        collection: String,
    },

    /// Collection has no kind with the requested label.
    #[error("'{collection}' cannot hold items of kind '{kind}'")]
    UnknownKind {
        /// Collection name.
        collection: String,
        /// Requested kind label.
        kind: String,
    },

    /// A formula referenced a symbol with no value.
    #[error("Unknown variable '{0}'")]
    UnknownVariable(String),

    /// Attempted to remove a dependency edge that was never registered.
    #[error("No dependency edge {target} <- {referrer}")]
    MissingDependency {
        /// The referenced entity.
        target: EntityId,
        /// The referencing entity.
        referrer: EntityId,
    },
}

impl ModelError {
    /// Build a coercion error from its parts.
    pub fn coercion(key: impl Into<String>, raw: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::Coercion {
            key: key.into(),
            raw: raw.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deletion_blocked_lists_dependents() {
        let err = ModelError::DeletionBlocked {
            name: "Mode".into(),
            dependents: vec!["Cross-Mode Term".into(), "Pulse".into()],
        };
        assert_eq!(
            err.to_string(),
            "Cannot delete 'Mode': it is used by Cross-Mode Term, Pulse"
        );
    }

    #[test]
    fn test_coercion_message() {
        let err = ModelError::coercion("dimension", "abc", "expected an integer");
        assert_eq!(
            err.to_string(),
            "Cannot set 'dimension' to 'abc': expected an integer"
        );
    }
}
