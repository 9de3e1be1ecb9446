//! Test-only helpers: fixtures and an independent expectation oracle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::core::evaluator::Evaluator;
use crate::core::table::PolicyTable;
use crate::core::types::{Action, Classification, LifecycleState};
use crate::io::table_store::write_table;

/// Evaluator over the built-in reference table.
pub fn reference_evaluator() -> Evaluator {
    Evaluator::new(Arc::new(
        PolicyTable::reference().expect("reference table is valid"),
    ))
}

/// Map a sample card index (1..=21) to its (classification, state, pin).
///
/// Mirrors the sample portfolio layout: classification-major, PIN set on even
/// indexes.
pub fn sample_card(idx: usize) -> (Classification, LifecycleState, bool) {
    let zero = idx - 1;
    let classification = Classification::ALL[zero / LifecycleState::ALL.len()];
    let state = LifecycleState::ALL[zero % LifecycleState::ALL.len()];
    (classification, state, idx % 2 == 0)
}

const ALL_BUT_ACTION5: &[&str] = &[
    "ACTION1", "ACTION2", "ACTION3", "ACTION4", "ACTION6", "ACTION7", "ACTION8", "ACTION9",
    "ACTION10", "ACTION11", "ACTION12", "ACTION13",
];

const EVERY_ACTION: &[&str] = &[
    "ACTION1", "ACTION2", "ACTION3", "ACTION4", "ACTION5", "ACTION6", "ACTION7", "ACTION8",
    "ACTION9", "ACTION10", "ACTION11", "ACTION12", "ACTION13",
];

/// Hard-coded per-classification allow lists, written out by hand.
pub fn expected_ceiling(classification: Classification) -> &'static [&'static str] {
    match classification {
        Classification::Prepaid => ALL_BUT_ACTION5,
        Classification::Debit => ALL_BUT_ACTION5,
        Classification::Credit => EVERY_ACTION,
    }
}

type Subsets = (
    &'static [&'static str],
    &'static [&'static str],
    &'static [&'static str],
);

/// Hard-coded per-state (always, with PIN, without PIN) lists.
pub fn expected_state(state: LifecycleState) -> Subsets {
    match state {
        LifecycleState::Ordered => (
            &[
                "ACTION3", "ACTION4", "ACTION5", "ACTION8", "ACTION9", "ACTION10", "ACTION12",
                "ACTION13",
            ],
            &["ACTION6"],
            &["ACTION7"],
        ),
        LifecycleState::Inactive => (
            &[
                "ACTION2", "ACTION3", "ACTION4", "ACTION5", "ACTION8", "ACTION9", "ACTION10",
                "ACTION11", "ACTION12", "ACTION13",
            ],
            &["ACTION6"],
            &["ACTION7"],
        ),
        LifecycleState::Active => (
            &[
                "ACTION1", "ACTION3", "ACTION4", "ACTION5", "ACTION8", "ACTION9", "ACTION10",
                "ACTION11", "ACTION12", "ACTION13",
            ],
            &["ACTION6"],
            &["ACTION7"],
        ),
        LifecycleState::Restricted => (&["ACTION3", "ACTION4", "ACTION5", "ACTION9"], &[], &[]),
        LifecycleState::Blocked => (
            &["ACTION3", "ACTION4", "ACTION5", "ACTION8", "ACTION9"],
            &["ACTION6", "ACTION7"],
            &[],
        ),
        LifecycleState::Expired => (&["ACTION3", "ACTION4", "ACTION5", "ACTION9"], &[], &[]),
        LifecycleState::Closed => (&["ACTION3", "ACTION4", "ACTION5", "ACTION9"], &[], &[]),
    }
}

/// Expected action names for a card, in canonical action order.
pub fn expected_actions(
    classification: Classification,
    state: LifecycleState,
    pin_is_set: bool,
) -> Vec<String> {
    let ceiling = expected_ceiling(classification);
    let (always, with_pin, without_pin) = expected_state(state);
    let conditional = if pin_is_set { with_pin } else { without_pin };

    let mut names: Vec<&str> = always
        .iter()
        .chain(conditional)
        .filter(|name| ceiling.contains(*name))
        .copied()
        .collect();
    names.sort_by_key(|name| canonical_position(name));
    names.dedup();
    names.into_iter().map(str::to_string).collect()
}

fn canonical_position(name: &str) -> usize {
    Action::ALL
        .iter()
        .position(|action| action.as_str() == name)
        .expect("oracle names a known action")
}

/// A temp directory holding a policy table file.
pub struct TableFixture {
    dir: TempDir,
    path: PathBuf,
}

impl TableFixture {
    /// Write `table` to `<tempdir>/policy.toml`.
    pub fn new(table: &PolicyTable) -> Result<Self> {
        let dir = tempfile::tempdir().context("create tempdir")?;
        let path = dir.path().join("policy.toml");
        write_table(&path, table)?;
        Ok(Self { dir, path })
    }

    pub fn reference() -> Result<Self> {
        Self::new(&PolicyTable::reference()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}
