//! Project-file workflow tests.
//!
//! The CLI is a binary crate, so these drive the same load/edit/save cycle
//! its commands perform through `qexplorer_setup` directly.

use qexplorer_setup::{NoPrompt, Setup, SetupError};

// ============================================================================
// Edit cycle
// ============================================================================

fn edit(path: &std::path::Path, f: impl FnOnce(&mut Setup)) {
    let mut setup = Setup::load(path).unwrap();
    f(&mut setup);
    setup.save(path).unwrap();
}

#[test]
fn test_edits_survive_reload_between_commands() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cat.yaml");

    // new --modes 2
    let mut setup = Setup::new();
    setup.add_mode().unwrap();
    setup.add_mode().unwrap();
    setup.save(&path).unwrap();

    // add "Cross-Mode Terms"
    edit(&path, |s| {
        let terms = s.collections().cross_terms;
        s.add_item(terms, None).unwrap();
    });

    // set "Cross-Mode Term" strength "chi/2" --define chi=0.4
    edit(&path, |s| {
        let term = s.find(None, "Cross-Mode Term").unwrap();
        s.set_field(term, "strength", "chi/2", &mut |_: &str| Some(0.4))
            .unwrap();
    });

    // set Mode name Cavity
    edit(&path, |s| {
        let mode = s.find(None, "Mode").unwrap();
        s.rename(mode, "Cavity").unwrap();
    });

    let setup = Setup::load(&path).unwrap();
    let term = setup.find(None, "Cross-Mode Term").unwrap();
    let entity = setup.model().entity(term).unwrap();
    assert_eq!(entity.number("strength").unwrap(), 0.2);
    assert_eq!(setup.model().display_value(term, "mode_1").unwrap(), "Cavity");
    assert_eq!(setup.variables().get("chi"), Some(0.4));
}

#[test]
fn test_remove_in_use_mode_fails_and_file_is_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cat.json");

    let mut setup = Setup::new();
    setup.add_mode().unwrap();
    setup.add_pulse().unwrap();
    setup.save(&path).unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    let mut setup = Setup::load(&path).unwrap();
    let mode = setup.find(None, "Mode").unwrap();
    let err = setup.remove(mode).unwrap_err();
    assert_eq!(err.to_string(), "Cannot delete 'Mode': it is used by Pulse");

    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let err = Setup::new().save(dir.path().join("cat.toml")).unwrap_err();
    assert!(matches!(err, SetupError::UnsupportedFormat(_)));
}

#[test]
fn test_set_without_definition_is_rejected() {
    let mut setup = Setup::new();
    let mode = setup.add_mode().unwrap();
    let err = setup
        .set_field(mode, "frequency", "omega", &mut NoPrompt)
        .unwrap_err();
    assert_eq!(err.to_string(), "Unknown variable 'omega'");
    assert_eq!(setup.model().display_value(mode, "frequency").unwrap(), "1.0");
}
