//! Declarative permission table: classification ceilings and per-state rules.
//!
//! A [`PolicyTable`] is validated once when it is built and is immutable
//! afterwards; share it behind an `Arc` and read it from any thread.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::invariants::validate_table;
use crate::core::types::{Action, Classification, LifecycleState};
use crate::error::{PolicyError, PolicyResult};

/// Actions a lifecycle state permits, split by PIN condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateRule {
    /// Permitted whether or not a PIN is set.
    pub always: BTreeSet<Action>,
    /// Permitted only when a PIN is set.
    pub requires_pin_set: BTreeSet<Action>,
    /// Permitted only when no PIN is set.
    pub requires_no_pin: BTreeSet<Action>,
}

impl StateRule {
    pub fn new(always: &[Action], requires_pin_set: &[Action], requires_no_pin: &[Action]) -> Self {
        Self {
            always: always.iter().copied().collect(),
            requires_pin_set: requires_pin_set.iter().copied().collect(),
            requires_no_pin: requires_no_pin.iter().copied().collect(),
        }
    }

    /// The PIN-conditional subset that applies for `pin_is_set`.
    pub fn conditional(&self, pin_is_set: bool) -> &BTreeSet<Action> {
        if pin_is_set {
            &self.requires_pin_set
        } else {
            &self.requires_no_pin
        }
    }

    /// True when neither PIN subset contributes anything.
    pub fn is_pin_independent(&self) -> bool {
        self.requires_pin_set.is_empty() && self.requires_no_pin.is_empty()
    }
}

/// Validated, immutable permission table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTable {
    by_classification: BTreeMap<Classification, BTreeSet<Action>>,
    by_state: BTreeMap<LifecycleState, StateRule>,
}

impl PolicyTable {
    /// Build a table, rejecting it if it is not total or if a state both
    /// requires and forbids a PIN for the same action.
    pub fn new(
        by_classification: BTreeMap<Classification, BTreeSet<Action>>,
        by_state: BTreeMap<LifecycleState, StateRule>,
    ) -> PolicyResult<Self> {
        let errors = validate_table(&by_classification, &by_state);
        if !errors.is_empty() {
            return Err(PolicyError::InvalidConfiguration(errors.join("; ")));
        }
        Ok(Self {
            by_classification,
            by_state,
        })
    }

    /// The built-in card action matrix.
    pub fn reference() -> PolicyResult<Self> {
        let by_classification = Classification::ALL
            .into_iter()
            .map(|c| (c, reference_ceiling(c).iter().copied().collect()))
            .collect();
        let by_state = LifecycleState::ALL
            .into_iter()
            .map(|s| (s, reference_state_rule(s)))
            .collect();
        Self::new(by_classification, by_state)
    }

    /// Actions a classification can ever support, regardless of state.
    pub fn actions_for_classification(
        &self,
        classification: Classification,
    ) -> PolicyResult<&BTreeSet<Action>> {
        self.by_classification.get(&classification).ok_or_else(|| {
            PolicyError::InvalidConfiguration(format!(
                "no rule for classification {}",
                classification
            ))
        })
    }

    /// The rule for a lifecycle state.
    pub fn rule_for_state(&self, state: LifecycleState) -> PolicyResult<&StateRule> {
        self.by_state.get(&state).ok_or_else(|| {
            PolicyError::InvalidConfiguration(format!("no rule for lifecycle state {}", state))
        })
    }

    pub fn classifications(&self) -> impl Iterator<Item = (Classification, &BTreeSet<Action>)> {
        self.by_classification.iter().map(|(c, actions)| (*c, actions))
    }

    pub fn states(&self) -> impl Iterator<Item = (LifecycleState, &StateRule)> {
        self.by_state.iter().map(|(s, rule)| (*s, rule))
    }
}

/// Classification ceilings. ACTION5 is credit-only.
fn reference_ceiling(classification: Classification) -> &'static [Action] {
    match classification {
        Classification::Prepaid | Classification::Debit => &[
            Action::Action1,
            Action::Action2,
            Action::Action3,
            Action::Action4,
            Action::Action6,
            Action::Action7,
            Action::Action8,
            Action::Action9,
            Action::Action10,
            Action::Action11,
            Action::Action12,
            Action::Action13,
        ],
        Classification::Credit => &Action::ALL,
    }
}

fn reference_state_rule(state: LifecycleState) -> StateRule {
    match state {
        LifecycleState::Ordered => StateRule::new(
            &[
                Action::Action3,
                Action::Action4,
                Action::Action5,
                Action::Action8,
                Action::Action9,
                Action::Action10,
                Action::Action12,
                Action::Action13,
            ],
            &[Action::Action6],
            &[Action::Action7],
        ),
        LifecycleState::Inactive => StateRule::new(
            &[
                Action::Action2,
                Action::Action3,
                Action::Action4,
                Action::Action5,
                Action::Action8,
                Action::Action9,
                Action::Action10,
                Action::Action11,
                Action::Action12,
                Action::Action13,
            ],
            &[Action::Action6],
            &[Action::Action7],
        ),
        LifecycleState::Active => StateRule::new(
            &[
                Action::Action1,
                Action::Action3,
                Action::Action4,
                Action::Action5,
                Action::Action8,
                Action::Action9,
                Action::Action10,
                Action::Action11,
                Action::Action12,
                Action::Action13,
            ],
            &[Action::Action6],
            &[Action::Action7],
        ),
        LifecycleState::Restricted => StateRule::new(
            &[
                Action::Action3,
                Action::Action4,
                Action::Action5,
                Action::Action9,
            ],
            &[],
            &[],
        ),
        // Blocked cards keep ACTION6/ACTION7 only while a PIN is set.
        LifecycleState::Blocked => StateRule::new(
            &[
                Action::Action3,
                Action::Action4,
                Action::Action5,
                Action::Action8,
                Action::Action9,
            ],
            &[Action::Action6, Action::Action7],
            &[],
        ),
        LifecycleState::Expired | LifecycleState::Closed => StateRule::new(
            &[
                Action::Action3,
                Action::Action4,
                Action::Action5,
                Action::Action9,
            ],
            &[],
            &[],
        ),
    }
}
