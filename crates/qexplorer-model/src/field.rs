//! Typed fields of an entity.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ModelError, ModelResult};
use crate::id::{CollectionId, EntityId};
use crate::naming::{methodize, wordify};

/// The kind of a field, which fixes how raw text is coerced into a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Signed integer.
    Integer,
    /// Plain floating-point number.
    Float,
    /// `true`/`false` flag.
    Boolean,
    /// Free text.
    Text,
    /// Numeric value given by a formula over the project variables.
    Formula,
    /// One of a fixed list of options.
    Enumeration(Vec<String>),
    /// Live pointer to an entity of the given collection.
    Reference(CollectionId),
}

impl FieldKind {
    /// Short name of the kind for messages.
    pub fn describe(&self) -> &'static str {
        match self {
            FieldKind::Integer => "an integer",
            FieldKind::Float => "a number",
            FieldKind::Boolean => "a boolean",
            FieldKind::Text => "text",
            FieldKind::Formula => "a formula",
            FieldKind::Enumeration(_) => "an option",
            FieldKind::Reference(_) => "a reference",
        }
    }

    /// Coerce raw text into a value of this kind.
    ///
    /// `Formula` and `Reference` need the variables mapping and the model to
    /// resolve, so they are coerced by [`Model`](crate::Model) and rejected
    /// here.
    pub fn coerce(&self, key: &str, raw: &str) -> ModelResult<FieldValue> {
        let text = raw.trim();
        match self {
            FieldKind::Integer => text
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| ModelError::coercion(key, raw, "expected an integer")),
            FieldKind::Float => match text.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(FieldValue::Float(v)),
                _ => Err(ModelError::coercion(key, raw, "expected a finite number")),
            },
            FieldKind::Boolean => match text.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(FieldValue::Boolean(true)),
                "false" | "no" | "off" | "0" => Ok(FieldValue::Boolean(false)),
                _ => Err(ModelError::coercion(key, raw, "expected true or false")),
            },
            FieldKind::Text => Ok(FieldValue::Text(raw.to_string())),
            FieldKind::Enumeration(options) => {
                if options.iter().any(|o| o == text) {
                    Ok(FieldValue::Choice(text.to_string()))
                } else {
                    Err(ModelError::coercion(
                        key,
                        raw,
                        format!("expected one of {}", options.join(", ")),
                    ))
                }
            }
            FieldKind::Formula | FieldKind::Reference(_) => Err(ModelError::coercion(
                key,
                raw,
                format!("{} must be set through the model", self.describe()),
            )),
        }
    }

    /// Check that `value` is a legal value of this kind.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (FieldKind::Integer, FieldValue::Integer(_))
            | (FieldKind::Boolean, FieldValue::Boolean(_))
            | (FieldKind::Text, FieldValue::Text(_))
            | (FieldKind::Reference(_), FieldValue::Reference(_)) => true,
            (FieldKind::Float, FieldValue::Float(v)) => v.is_finite(),
            (FieldKind::Formula, FieldValue::Formula { value, .. }) => value.is_finite(),
            (FieldKind::Enumeration(options), FieldValue::Choice(c)) => options.contains(c),
            _ => false,
        }
    }
}

/// Current value of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    /// Formula source text and its last successful evaluation.
    Formula { expr: String, value: f64 },
    Choice(String),
    Reference(EntityId),
}

impl FieldValue {
    /// A formula whose text is a plain number.
    pub fn constant(value: f64) -> Self {
        FieldValue::Formula {
            expr: format_number(value),
            value,
        }
    }

    /// Numeric view of integer, float and formula values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Float(v) | FieldValue::Formula { value: v, .. } => Some(*v),
            _ => None,
        }
    }

    /// The referenced entity, for reference values.
    pub fn as_reference(&self) -> Option<EntityId> {
        match self {
            FieldValue::Reference(id) => Some(*id),
            _ => None,
        }
    }
}

/// Text as it would be typed back into a property editor. References have no
/// standalone text form; the model renders them by target name.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{}", format_number(*v)),
            FieldValue::Boolean(v) => write!(f, "{v}"),
            FieldValue::Text(s) | FieldValue::Choice(s) => write!(f, "{s}"),
            FieldValue::Formula { expr, .. } => write!(f, "{expr}"),
            FieldValue::Reference(id) => write!(f, "{id}"),
        }
    }
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

/// A named, typed slot on an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    label: String,
    key: String,
    kind: FieldKind,
    value: FieldValue,
}

impl Field {
    /// Build a field from any spelling of its label.
    ///
    /// The label is normalised to its display form and the lookup key is
    /// derived from that.
    pub fn new(label: &str, kind: FieldKind, value: FieldValue) -> Self {
        let label = wordify(label);
        let key = methodize(&label);
        Self {
            label,
            key,
            kind,
            value,
        }
    }

    /// Display label, e.g. `"Initial Leg Count"`.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Lookup key, e.g. `"initial_leg_count"`.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    pub(crate) fn replace_value(&mut self, value: FieldValue) -> FieldValue {
        std::mem::replace(&mut self.value, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_coercion() {
        assert_eq!(
            FieldKind::Integer.coerce("dimension", "42").unwrap(),
            FieldValue::Integer(42)
        );
        assert_eq!(
            FieldKind::Integer.coerce("dimension", " 7 ").unwrap(),
            FieldValue::Integer(7)
        );
        let err = FieldKind::Integer.coerce("dimension", "abc").unwrap_err();
        assert!(matches!(err, ModelError::Coercion { ref key, .. } if key == "dimension"));
    }

    #[test]
    fn test_float_rejects_non_finite() {
        assert_eq!(
            FieldKind::Float.coerce("range", "2.5").unwrap(),
            FieldValue::Float(2.5)
        );
        assert!(FieldKind::Float.coerce("range", "inf").is_err());
        assert!(FieldKind::Float.coerce("range", "NaN").is_err());
    }

    #[test]
    fn test_boolean_coercion() {
        assert_eq!(
            FieldKind::Boolean.coerce("flag", "Yes").unwrap(),
            FieldValue::Boolean(true)
        );
        assert_eq!(
            FieldKind::Boolean.coerce("flag", "0").unwrap(),
            FieldValue::Boolean(false)
        );
        assert!(FieldKind::Boolean.coerce("flag", "maybe").is_err());
    }

    #[test]
    fn test_enumeration_membership() {
        let kind = FieldKind::Enumeration(vec!["Cross-Kerr".into(), "Exchange".into()]);
        assert_eq!(
            kind.coerce("coupling", "Exchange").unwrap(),
            FieldValue::Choice("Exchange".into())
        );
        assert!(kind.coerce("coupling", "exchange").is_err());
    }

    #[test]
    fn test_reference_needs_model() {
        assert!(FieldKind::Reference(CollectionId(0)).coerce("mode", "Mode").is_err());
    }

    #[test]
    fn test_field_label_normalisation() {
        let f = Field::new("initial_leg_count", FieldKind::Integer, FieldValue::Integer(1));
        assert_eq!(f.label(), "Initial Leg Count");
        assert_eq!(f.key(), "initial_leg_count");
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldValue::Float(1.0).to_string(), "1.0");
        assert_eq!(FieldValue::constant(0.5).to_string(), "0.5");
        assert_eq!(
            FieldValue::Formula {
                expr: "2*chi".into(),
                value: 0.2
            }
            .to_string(),
            "2*chi"
        );
    }
}
