//! Property-based tests for name resolution and child ordering.

use qexplorer_model::naming::{increment_name, unique_name};
use qexplorer_model::{EntityTemplate, Model};
use proptest::prelude::*;
use std::collections::HashSet;

/// An edit applied to a collection of modes.
#[derive(Debug, Clone)]
enum Edit {
    Add,
    Rename(usize, String),
    Remove(usize),
}

fn arb_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Mode".to_string()),
        Just("Mode_1".to_string()),
        "[A-Z][a-z]{0,5}(_[0-9]{1,2})?",
    ]
}

fn arb_edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        3 => Just(Edit::Add),
        2 => (0_usize..8, arb_name()).prop_map(|(i, n)| Edit::Rename(i, n)),
        1 => (0_usize..8).prop_map(Edit::Remove),
    ]
}

proptest! {
    #[test]
    fn increment_changes_the_name(name in "[A-Za-z_]{1,8}[0-9]{0,4}") {
        prop_assert_ne!(increment_name(&name), name);
    }

    #[test]
    fn unique_name_avoids_taken(proposed in arb_name(), taken in prop::collection::vec(arb_name(), 0..10)) {
        let resolved = unique_name(&proposed, taken.iter().map(String::as_str));
        prop_assert!(!taken.contains(&resolved));
    }

    #[test]
    fn sibling_names_stay_unique(edits in prop::collection::vec(arb_edit(), 1..30)) {
        let mut model = Model::new();
        let modes = model.add_collection("Modes", vec![EntityTemplate::new("Mode")]);
        let mut expected_order = Vec::new();

        for edit in edits {
            let children = model.items(modes).unwrap().to_vec();
            match edit {
                Edit::Add => {
                    expected_order.push(model.add_item(modes, None).unwrap());
                }
                Edit::Rename(i, name) if !children.is_empty() => {
                    let id = children[i % children.len()];
                    model.rename(id, &name).unwrap();
                }
                Edit::Remove(i) if !children.is_empty() => {
                    let id = children[i % children.len()];
                    model.remove_item(id).unwrap();
                    expected_order.retain(|&e| e != id);
                }
                _ => {}
            }

            let children = model.items(modes).unwrap();
            let names: HashSet<&str> = children.iter().map(|&c| model.name(c).unwrap()).collect();
            prop_assert_eq!(names.len(), children.len());
            prop_assert_eq!(children, expected_order.as_slice());
        }
    }
}
