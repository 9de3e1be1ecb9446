//! Structural invariants of a policy table.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::table::StateRule;
use crate::core::types::{Action, Classification, LifecycleState};

/// Check the invariants a policy table must satisfy before it is used:
/// - every classification has an entry, and that entry is non-empty
/// - every lifecycle state has an entry
/// - no action is both `requires_pin_set` and `requires_no_pin` for one state
///
/// Returns one message per violation; empty means the table is valid.
pub fn validate_table(
    by_classification: &BTreeMap<Classification, BTreeSet<Action>>,
    by_state: &BTreeMap<LifecycleState, StateRule>,
) -> Vec<String> {
    let mut errors = Vec::new();

    for classification in Classification::ALL {
        match by_classification.get(&classification) {
            None => errors.push(format!("{}: missing classification rule", classification)),
            Some(actions) if actions.is_empty() => {
                errors.push(format!("{}: classification allows no actions", classification));
            }
            Some(_) => {}
        }
    }

    for state in LifecycleState::ALL {
        let Some(rule) = by_state.get(&state) else {
            errors.push(format!("{}: missing state rule", state));
            continue;
        };
        let conflicting: Vec<&str> = rule
            .requires_pin_set
            .intersection(&rule.requires_no_pin)
            .map(|action| action.as_str())
            .collect();
        if !conflicting.is_empty() {
            errors.push(format!(
                "{}: actions both require and forbid a PIN: {}",
                state,
                conflicting.join(", ")
            ));
        }
    }

    errors
}
