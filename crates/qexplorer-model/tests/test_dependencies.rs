//! Tests for reference fields and the deletion guard.

use qexplorer_model::{
    CollectionId, EntityTemplate, EventKind, FieldKind, FieldSpec, FieldValue, Model, ModelError,
};
use std::cell::RefCell;
use std::rc::Rc;

fn tree() -> (Model, CollectionId, CollectionId) {
    let mut model = Model::new();
    let modes = model.add_collection(
        "Modes",
        vec![EntityTemplate::new("Mode").field(FieldSpec::integer("Dimension", 2))],
    );
    let terms = model.add_collection(
        "Cross-Mode Terms",
        vec![
            EntityTemplate::new("Cross-Mode Term")
                .field(FieldSpec::reference_at("Mode 1", modes, 0))
                .field(FieldSpec::reference_at("Mode 2", modes, 1))
                .field(FieldSpec::choice("Coupling", ["Cross-Kerr", "Exchange"])),
        ],
    );
    (model, modes, terms)
}

// ---------------------------------------------------------------------------
// Deletion guard
// ---------------------------------------------------------------------------

#[test]
fn referenced_item_cannot_be_removed() {
    let (mut model, modes, terms) = tree();
    let a = model.add_item(modes, None).unwrap();
    let b = model.add_item(modes, None).unwrap();
    let term = model.add_item(terms, None).unwrap();

    let err = model.remove_item(a).unwrap_err();
    assert_eq!(
        err,
        ModelError::DeletionBlocked {
            name: "Mode".into(),
            dependents: vec!["Cross-Mode Term".into()],
        }
    );
    assert_eq!(model.items(modes).unwrap(), &[a, b]);

    model.remove_item(term).unwrap();
    model.remove_item(a).unwrap();
    assert_eq!(model.items(modes).unwrap(), &[b]);
}

#[test]
fn positional_default_needs_enough_targets() {
    let (mut model, modes, terms) = tree();
    model.add_item(modes, None).unwrap();

    let err = model.add_item(terms, None).unwrap_err();
    assert!(matches!(err, ModelError::NoEligibleTarget { ref field, .. } if field == "Mode 2"));
    assert!(model.items(terms).unwrap().is_empty());
    // The half-built term released its edge to the first mode.
    let first = model.items(modes).unwrap()[0];
    assert!(model.can_delete(first).unwrap());
}

#[test]
fn removal_releases_outgoing_edges() {
    let (mut model, modes, terms) = tree();
    let a = model.add_item(modes, None).unwrap();
    let b = model.add_item(modes, None).unwrap();
    let term = model.add_item(terms, None).unwrap();
    assert_eq!(model.dependencies(term).unwrap(), &[a, b]);

    model.remove_item(term).unwrap();
    assert!(model.dependents(a).unwrap().is_empty());
    assert!(model.dependents(b).unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Reassignment
// ---------------------------------------------------------------------------

#[test]
fn reassigning_reference_moves_edge() {
    let (mut model, modes, terms) = tree();
    let a = model.add_item(modes, None).unwrap();
    let b = model.add_item(modes, None).unwrap();
    let c = model.add_item(modes, None).unwrap();
    let term = model.add_item(terms, None).unwrap();

    model.set_field(term, "mode_1", "Mode_2").unwrap();
    assert_eq!(model.entity(term).unwrap().reference("mode_1").unwrap(), c);
    assert!(model.can_delete(a).unwrap());
    assert_eq!(model.dependents(c).unwrap(), &[term]);
    assert_eq!(model.dependents(b).unwrap(), &[term]);
}

#[test]
fn reassigning_same_target_keeps_single_edge() {
    let (mut model, modes, terms) = tree();
    let a = model.add_item(modes, None).unwrap();
    model.add_item(modes, None).unwrap();
    let term = model.add_item(terms, None).unwrap();

    model.set_reference(term, "mode_1", a).unwrap();
    model.set_reference(term, "mode_1", a).unwrap();
    assert_eq!(model.dependents(a).unwrap(), &[term]);
}

#[test]
fn two_fields_on_same_target_share_one_edge() {
    let (mut model, modes, terms) = tree();
    let a = model.add_item(modes, None).unwrap();
    let b = model.add_item(modes, None).unwrap();
    let term = model.add_item(terms, None).unwrap();

    // Both fields now point at `a`.
    model.set_reference(term, "mode_2", a).unwrap();
    assert_eq!(model.dependents(a).unwrap(), &[term]);
    assert!(model.can_delete(b).unwrap());

    // Moving one of them away keeps the edge held by the other.
    model.set_reference(term, "mode_1", b).unwrap();
    assert_eq!(model.dependents(a).unwrap(), &[term]);
    assert_eq!(model.dependents(b).unwrap(), &[term]);
}

#[test]
fn reference_by_unknown_name_is_rejected() {
    let (mut model, modes, terms) = tree();
    let a = model.add_item(modes, None).unwrap();
    model.add_item(modes, None).unwrap();
    let term = model.add_item(terms, None).unwrap();

    let err = model.set_field(term, "mode_1", "Qubit").unwrap_err();
    assert!(matches!(err, ModelError::Coercion { .. }));
    assert_eq!(model.entity(term).unwrap().reference("mode_1").unwrap(), a);
}

#[test]
fn reference_into_foreign_collection_is_rejected() {
    let (mut model, modes, terms) = tree();
    model.add_item(modes, None).unwrap();
    model.add_item(modes, None).unwrap();
    let term = model.add_item(terms, None).unwrap();
    let other = model.add_item(terms, None).unwrap();

    let err = model.set_reference(term, "mode_1", other).unwrap_err();
    assert!(matches!(err, ModelError::ForeignReference { .. }));
}

#[test]
fn reference_displays_target_name_after_rename() {
    let (mut model, modes, terms) = tree();
    let a = model.add_item(modes, None).unwrap();
    model.add_item(modes, None).unwrap();
    let term = model.add_item(terms, None).unwrap();

    assert_eq!(model.display_value(term, "mode_1").unwrap(), "Mode");
    model.rename(a, "Cavity").unwrap();
    assert_eq!(model.display_value(term, "mode_1").unwrap(), "Cavity");
}

// ---------------------------------------------------------------------------
// Dynamic fields
// ---------------------------------------------------------------------------

#[test]
fn added_reference_field_registers_and_removal_releases() {
    let (mut model, modes, terms) = tree();
    let a = model.add_item(modes, None).unwrap();
    let b = model.add_item(modes, None).unwrap();
    let term = model.add_item(terms, None).unwrap();

    let key = model
        .add_field(term, "Spectator", FieldKind::Reference(modes), None)
        .unwrap();
    assert_eq!(key, "spectator");
    assert_eq!(model.field(term, "spectator").unwrap(), &FieldValue::Reference(a));

    // `mode_1` still points at `a`, so the edge survives.
    model.remove_field(term, "spectator").unwrap();
    assert_eq!(model.dependents(a).unwrap(), &[term]);

    model.set_reference(term, "mode_1", b).unwrap();
    assert!(model.can_delete(a).unwrap());
}

#[test]
fn duplicate_field_key_is_rejected() {
    let (mut model, modes, _) = tree();
    let a = model.add_item(modes, None).unwrap();
    let err = model
        .add_field(a, "dimension", FieldKind::Integer, None)
        .unwrap_err();
    assert!(matches!(err, ModelError::DuplicateField { .. }));
}

#[test]
fn cancelled_item_releases_edges() {
    let (mut model, modes, terms) = tree();
    let a = model.add_item(modes, None).unwrap();
    let b = model.add_item(modes, None).unwrap();

    let created = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&created);
    model.events().subscribe(move |e| sink.borrow_mut().push(e.kind()));

    let result = model.add_item_with(terms, None, |_, _| false).unwrap();
    assert!(result.is_none());
    assert!(model.can_delete(a).unwrap());
    assert!(model.can_delete(b).unwrap());
    assert_eq!(*created.borrow(), vec![EventKind::ItemCreated]);
}
