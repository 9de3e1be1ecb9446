//! Policy table load/save as TOML, validated on load.
//!
//! File layout:
//!
//! ```toml
//! [[classification]]
//! classification = "Prepaid"
//! actions = ["ACTION1", "ACTION2"]
//!
//! [[state]]
//! state = "Blocked"
//! always = ["ACTION3"]
//! requires_pin_set = ["ACTION6"]
//! requires_no_pin = []
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::table::{PolicyTable, StateRule};
use crate::core::types::{Action, Classification, LifecycleState};
use crate::error::{PolicyError, PolicyResult};

/// On-disk representation of a [`PolicyTable`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(default, rename = "classification")]
    pub classifications: Vec<ClassificationEntry>,
    #[serde(default, rename = "state")]
    pub states: Vec<StateEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationEntry {
    pub classification: Classification,
    #[serde(default)]
    pub actions: BTreeSet<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEntry {
    pub state: LifecycleState,
    #[serde(default)]
    pub always: BTreeSet<Action>,
    #[serde(default)]
    pub requires_pin_set: BTreeSet<Action>,
    #[serde(default)]
    pub requires_no_pin: BTreeSet<Action>,
}

impl PolicyDocument {
    pub fn from_table(table: &PolicyTable) -> Self {
        let classifications = table
            .classifications()
            .map(|(classification, actions)| ClassificationEntry {
                classification,
                actions: actions.clone(),
            })
            .collect();
        let states = table
            .states()
            .map(|(state, rule)| StateEntry {
                state,
                always: rule.always.clone(),
                requires_pin_set: rule.requires_pin_set.clone(),
                requires_no_pin: rule.requires_no_pin.clone(),
            })
            .collect();
        Self {
            classifications,
            states,
        }
    }

    /// Convert into a validated table. Duplicate entries are rejected rather
    /// than merged.
    pub fn into_table(self) -> PolicyResult<PolicyTable> {
        let mut errors = Vec::new();

        let mut by_classification = BTreeMap::new();
        for entry in self.classifications {
            if by_classification
                .insert(entry.classification, entry.actions)
                .is_some()
            {
                errors.push(format!("{}: duplicate classification rule", entry.classification));
            }
        }

        let mut by_state = BTreeMap::new();
        for entry in self.states {
            let rule = StateRule {
                always: entry.always,
                requires_pin_set: entry.requires_pin_set,
                requires_no_pin: entry.requires_no_pin,
            };
            if by_state.insert(entry.state, rule).is_some() {
                errors.push(format!("{}: duplicate state rule", entry.state));
            }
        }

        if !errors.is_empty() {
            return Err(PolicyError::InvalidConfiguration(errors.join("; ")));
        }
        PolicyTable::new(by_classification, by_state)
    }
}

/// Parse and validate a policy table from TOML text.
pub fn parse_table(contents: &str) -> Result<PolicyTable> {
    let document: PolicyDocument = toml::from_str(contents).context("parse policy toml")?;
    let table = document.into_table()?;
    Ok(table)
}

/// Load and validate a policy table from disk.
pub fn load_table(path: &Path) -> Result<PolicyTable> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read policy table {}", path.display()))?;
    let table =
        parse_table(&contents).with_context(|| format!("load policy table {}", path.display()))?;
    debug!(path = %path.display(), "loaded policy table");
    Ok(table)
}

/// Load the table at `path`, or the built-in reference table when `None`.
pub fn load_table_or_reference(path: Option<&Path>) -> Result<PolicyTable> {
    match path {
        Some(path) => load_table(path),
        None => Ok(PolicyTable::reference()?),
    }
}

/// Serialize a table to TOML text.
pub fn render_table(table: &PolicyTable) -> Result<String> {
    let mut buf = toml::to_string_pretty(&PolicyDocument::from_table(table))
        .context("serialize policy toml")?;
    if !buf.ends_with('\n') {
        buf.push('\n');
    }
    Ok(buf)
}

/// Atomically write a table to disk (temp file + rename).
pub fn write_table(path: &Path, table: &PolicyTable) -> Result<()> {
    let buf = render_table(table)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp policy table {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("replace policy table {}", path.display()))?;
    Ok(())
}
