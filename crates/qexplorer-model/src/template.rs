//! Entity templates: the constructor a collection uses for each kind it
//! accepts.

use crate::field::{FieldKind, FieldValue};
use crate::id::CollectionId;

/// Initial value of a field in a freshly built entity.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// A fixed value.
    Value(FieldValue),
    /// The child at this position of the reference's target collection.
    Position(usize),
}

/// Label, kind and default of one field of a template.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub label: String,
    pub kind: FieldKind,
    pub default: DefaultValue,
}

impl FieldSpec {
    pub fn integer(label: impl Into<String>, default: i64) -> Self {
        Self::value(label, FieldKind::Integer, FieldValue::Integer(default))
    }

    pub fn float(label: impl Into<String>, default: f64) -> Self {
        Self::value(label, FieldKind::Float, FieldValue::Float(default))
    }

    pub fn boolean(label: impl Into<String>, default: bool) -> Self {
        Self::value(label, FieldKind::Boolean, FieldValue::Boolean(default))
    }

    pub fn text(label: impl Into<String>, default: impl Into<String>) -> Self {
        Self::value(label, FieldKind::Text, FieldValue::Text(default.into()))
    }

    /// Formula field starting at a constant.
    pub fn formula(label: impl Into<String>, default: f64) -> Self {
        Self::value(label, FieldKind::Formula, FieldValue::constant(default))
    }

    /// Enumeration field; the first option is the default.
    pub fn choice<S: Into<String>>(label: impl Into<String>, options: impl IntoIterator<Item = S>) -> Self {
        let options: Vec<String> = options.into_iter().map(Into::into).collect();
        let default = options.first().cloned().unwrap_or_default();
        Self::value(
            label,
            FieldKind::Enumeration(options),
            FieldValue::Choice(default),
        )
    }

    /// Reference field defaulting to the first item of `collection`.
    pub fn reference(label: impl Into<String>, collection: CollectionId) -> Self {
        Self::reference_at(label, collection, 0)
    }

    /// Reference field defaulting to the item at `position` of `collection`.
    pub fn reference_at(label: impl Into<String>, collection: CollectionId, position: usize) -> Self {
        Self {
            label: label.into(),
            kind: FieldKind::Reference(collection),
            default: DefaultValue::Position(position),
        }
    }

    fn value(label: impl Into<String>, kind: FieldKind, value: FieldValue) -> Self {
        Self {
            label: label.into(),
            kind,
            default: DefaultValue::Value(value),
        }
    }
}

/// Constructor for one kind of entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityTemplate {
    kind: String,
    default_name: String,
    fields: Vec<FieldSpec>,
}

impl EntityTemplate {
    /// A template whose items are initially named after the kind.
    pub fn new(kind: impl Into<String>) -> Self {
        let kind = kind.into();
        Self {
            default_name: kind.clone(),
            kind,
            fields: Vec::new(),
        }
    }

    /// Override the initial item name.
    #[must_use]
    pub fn with_default_name(mut self, name: impl Into<String>) -> Self {
        self.default_name = name.into();
        self
    }

    /// Append a field.
    #[must_use]
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let t = EntityTemplate::new("Cross-Mode Term")
            .with_default_name("Term")
            .field(FieldSpec::reference_at("Mode 1", CollectionId(0), 0))
            .field(FieldSpec::reference_at("Mode 2", CollectionId(0), 1))
            .field(FieldSpec::choice("Coupling", ["Cross-Kerr", "Exchange"]));

        assert_eq!(t.kind(), "Cross-Mode Term");
        assert_eq!(t.default_name(), "Term");
        assert_eq!(t.fields().len(), 3);
        assert_eq!(t.fields()[1].default, DefaultValue::Position(1));
        assert_eq!(
            t.fields()[2].default,
            DefaultValue::Value(FieldValue::Choice("Cross-Kerr".into()))
        );
    }
}
