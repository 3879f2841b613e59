//! qexplorer entity model
//!
//! This crate provides the editable tree behind the qexplorer project view:
//! named entities with typed fields, ordered collections of entities, and
//! the dependency edges that keep referenced entities from being deleted.
//!
//! # Core Components
//!
//! - **Handles**: [`EntityId`], [`CollectionId`] address entities and
//!   collections inside a [`Model`] arena
//! - **Fields**: [`FieldKind`] fixes how raw editor text is coerced into a
//!   [`FieldValue`]; reference fields hold live handles to other entities
//! - **Templates**: [`EntityTemplate`] is the constructor a collection uses
//!   for each kind it accepts
//! - **Model**: [`Model`] owns everything, resolves name collisions, tracks
//!   dependencies and emits [`ModelEvent`]s
//! - **Formulas**: [`Variables`] and [`FormulaEvaluator`] back the
//!   formula-capable numeric fields
//!
//! # Example: Deletion Guard
//!
//! ```rust
//! use qexplorer_model::{EntityTemplate, FieldSpec, Model, ModelError};
//!
//! let mut model = Model::new();
//! let modes = model.add_collection("Modes", vec![EntityTemplate::new("Mode")]);
//! let terms = model.add_collection(
//!     "Cross-Mode Terms",
//!     vec![
//!         EntityTemplate::new("Cross-Mode Term")
//!             .field(FieldSpec::reference_at("Mode 1", modes, 0))
//!             .field(FieldSpec::reference_at("Mode 2", modes, 1)),
//!     ],
//! );
//!
//! let a = model.add_item(modes, None).unwrap();
//! let b = model.add_item(modes, None).unwrap();
//! assert_eq!(model.name(b).unwrap(), "Mode_1");
//!
//! let term = model.add_item(terms, None).unwrap();
//! assert!(matches!(
//!     model.remove_item(a),
//!     Err(ModelError::DeletionBlocked { .. })
//! ));
//!
//! model.remove_item(term).unwrap();
//! model.remove_item(a).unwrap();
//! ```

pub mod collection;
pub mod dependency;
pub mod entity;
pub mod error;
pub mod events;
pub mod field;
pub mod formula;
pub mod id;
pub mod model;
pub mod naming;
pub mod template;

pub use collection::Collection;
pub use entity::Entity;
pub use error::{ModelError, ModelResult};
pub use events::{EventBus, EventKind, ModelEvent, SubscriptionId};
pub use field::{Field, FieldKind, FieldValue};
pub use formula::{Expr, ExprEvaluator, FormulaError, FormulaEvaluator, Variables};
pub use id::{CollectionId, EntityId};
pub use model::{Model, RecoerceFailure};
pub use template::{DefaultValue, EntityTemplate, FieldSpec};
