//! End-to-end editing, documents and sweeps.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{ClockSimulator, driven_project};
use qexplorer_model::{EventKind, ModelError};
use qexplorer_setup::{CancelToken, NoPrompt, ProjectDocument, Setup, SetupError};

// ---------------------------------------------------------------------------
// Editing
// ---------------------------------------------------------------------------

#[test]
fn deletion_guard_scenario() {
    let mut setup = Setup::new();
    let a = setup.add_mode().unwrap();
    let b = setup.add_mode().unwrap();
    assert_eq!(setup.model().name(a).unwrap(), "Mode");
    assert_eq!(setup.model().name(b).unwrap(), "Mode_1");

    let term = setup.add_cross_term().unwrap();
    let entity = setup.model().entity(term).unwrap();
    assert_eq!(entity.reference("mode_1").unwrap(), a);
    assert_eq!(entity.reference("mode_2").unwrap(), b);

    let err = setup.remove(a).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot delete 'Mode': it is used by Cross-Mode Term"
    );
    assert_eq!(setup.model().items(setup.collections().modes).unwrap(), &[a, b]);

    setup.remove(term).unwrap();
    setup.remove(a).unwrap();
    assert_eq!(setup.model().items(setup.collections().modes).unwrap(), &[b]);
}

#[test]
fn cancelled_dialog_leaves_tree_untouched() {
    let mut setup = Setup::new();
    setup.add_mode().unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    setup.events().subscribe(move |e| sink.borrow_mut().push(e.kind()));

    let pulses = setup.collections().pulses;
    let result = setup
        .add_item_with(pulses, None, |model, id| {
            model.set_field(id, "duration", "3").unwrap();
            false
        })
        .unwrap();

    assert!(result.is_none());
    assert!(setup.model().items(pulses).unwrap().is_empty());
    assert_eq!(*seen.borrow(), vec![EventKind::ItemCreated]);
    let mode = setup.model().items(setup.collections().modes).unwrap()[0];
    assert!(setup.model().can_delete(mode).unwrap());
}

#[test]
fn cross_term_dialog_needs_two_modes() {
    let mut setup = Setup::new();
    setup.add_mode().unwrap();
    let terms = setup.collections().cross_terms;
    let err = setup.add_item_with(terms, None, |_, _| true).unwrap_err();
    assert!(matches!(err, SetupError::Model(ModelError::EmptyPrerequisite(_))));
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

fn rich_project() -> Setup {
    let mut project = driven_project().setup;
    project.define_variable("kappa", 0.01).unwrap();
    let modes = project.collections().modes;
    let first = project.model().items(modes).unwrap()[0];
    project.rename(first, "Cavity").unwrap();
    project.set_field(first, "decay", "2*kappa", &mut NoPrompt).unwrap();
    let qubit = project.add_mode().unwrap();
    project.rename(qubit, "Qubit").unwrap();
    project.set_field(qubit, "initial_leg_count", "2", &mut NoPrompt).unwrap();
    project.set_field(qubit, "initial_leg_phases", "1, -0.5+0.5i", &mut NoPrompt).unwrap();
    let term = project.add_cross_term().unwrap();
    project.set_field(term, "coupling", "Exchange", &mut NoPrompt).unwrap();
    project
}

#[test]
fn document_round_trip_yaml_and_json() {
    let project = rich_project();
    let dir = tempfile::tempdir().unwrap();

    for file in ["project.yaml", "project.json"] {
        let path = dir.path().join(file);
        project.save(&path).unwrap();
        let loaded = Setup::load(&path).unwrap();
        assert_eq!(loaded.to_document().unwrap(), project.to_document().unwrap());
    }
}

#[test]
fn loaded_document_keeps_formulas_and_references() {
    let project = rich_project();
    let doc = project.to_document().unwrap();
    let loaded = Setup::from_document(&doc).unwrap();
    let model = loaded.model();

    let cavity = loaded.find(Some(loaded.collections().modes), "Cavity").unwrap();
    assert_eq!(model.display_value(cavity, "decay").unwrap(), "2*kappa");
    assert_eq!(model.entity(cavity).unwrap().number("decay").unwrap(), 0.02);
    let qubit = loaded.find(None, "Qubit").unwrap();
    assert_eq!(model.display_value(qubit, "initial_leg_phases").unwrap(), "1, -0.5+0.5i");

    let sequence = model.items(loaded.collections().sequences).unwrap()[0];
    assert_eq!(model.names(&loaded.steps(sequence).unwrap()), vec!["Pulse", "Wait"]);

    // References were re-registered, so the guard still holds.
    assert!(!model.can_delete(cavity).unwrap());
}

#[test]
fn document_with_unknown_collection_is_rejected() {
    let yaml = "version: 1\ncollections:\n  - name: Qubits\n    items: []\n";
    let doc = ProjectDocument::decode(yaml, qexplorer_setup::DocumentFormat::Yaml).unwrap();
    assert!(matches!(
        Setup::from_document(&doc),
        Err(SetupError::InvalidParameter { .. })
    ));
}

// ---------------------------------------------------------------------------
// Sweeps
// ---------------------------------------------------------------------------

#[test]
fn sweep_visits_values_and_restores_variable() {
    let mut project = driven_project();
    let setup = &mut project.setup;
    let pulse = setup.model().items(setup.collections().pulses).unwrap()[0];
    setup
        .set_field(pulse, "amplitude", "amp", &mut |_: &str| Some(0.5))
        .unwrap();

    let sweep = setup.add_sweep().unwrap();
    setup.set_field(sweep, "variable", "amp", &mut NoPrompt).unwrap();
    setup.set_field(sweep, "start", "0", &mut NoPrompt).unwrap();
    setup.set_field(sweep, "stop", "1", &mut NoPrompt).unwrap();
    setup.set_field(sweep, "points", "3", &mut NoPrompt).unwrap();

    let simulator = ClockSimulator::default();
    let mut reports = 0;
    let points = setup
        .run_sweep(sweep, project.simulation, &simulator, &CancelToken::new(), |_| reports += 1)
        .unwrap();

    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![0.0, 0.5, 1.0]);
    // A zero amplitude drops the drive term from the first segment.
    assert_eq!(*simulator.drives.lock().unwrap(), vec![0, 0, 1, 0, 1, 0]);
    assert!(reports > 0);

    assert_eq!(setup.variables().get("amp"), Some(0.5));
    assert_eq!(setup.model().entity(pulse).unwrap().number("amplitude").unwrap(), 0.5);
}

#[test]
fn sweep_removes_variable_it_introduced() {
    let mut project = driven_project();
    let setup = &mut project.setup;
    let sweep = setup.add_sweep().unwrap();
    setup.set_field(sweep, "variable", "x", &mut NoPrompt).unwrap();

    setup
        .run_sweep(sweep, project.simulation, &ClockSimulator::default(), &CancelToken::new(), |_| {})
        .unwrap();
    assert!(!setup.variables().contains("x"));
}

#[test]
fn sweep_without_variable_is_rejected() {
    let mut project = driven_project();
    let sweep = project.setup.add_sweep().unwrap();
    let err = project
        .setup
        .run_sweep(sweep, project.simulation, &ClockSimulator::default(), &CancelToken::new(), |_| {})
        .unwrap_err();
    assert!(matches!(err, SetupError::InvalidParameter { .. }));
}
