//! Value types shared by the policy table and the evaluator.
//!
//! All enumerations are closed. Their declaration order is the canonical total
//! order used when reporting permitted actions, so reordering variants changes
//! observable output.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;

/// An operation that may be performed on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "ACTION1")]
    Action1,
    #[serde(rename = "ACTION2")]
    Action2,
    #[serde(rename = "ACTION3")]
    Action3,
    #[serde(rename = "ACTION4")]
    Action4,
    #[serde(rename = "ACTION5")]
    Action5,
    #[serde(rename = "ACTION6")]
    Action6,
    #[serde(rename = "ACTION7")]
    Action7,
    #[serde(rename = "ACTION8")]
    Action8,
    #[serde(rename = "ACTION9")]
    Action9,
    #[serde(rename = "ACTION10")]
    Action10,
    #[serde(rename = "ACTION11")]
    Action11,
    #[serde(rename = "ACTION12")]
    Action12,
    #[serde(rename = "ACTION13")]
    Action13,
}

impl Action {
    /// Every action, in canonical order.
    pub const ALL: [Action; 13] = [
        Action::Action1,
        Action::Action2,
        Action::Action3,
        Action::Action4,
        Action::Action5,
        Action::Action6,
        Action::Action7,
        Action::Action8,
        Action::Action9,
        Action::Action10,
        Action::Action11,
        Action::Action12,
        Action::Action13,
    ];

    /// Symbolic name used on the wire (`ACTION1` .. `ACTION13`).
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Action1 => "ACTION1",
            Action::Action2 => "ACTION2",
            Action::Action3 => "ACTION3",
            Action::Action4 => "ACTION4",
            Action::Action5 => "ACTION5",
            Action::Action6 => "ACTION6",
            Action::Action7 => "ACTION7",
            Action::Action8 => "ACTION8",
            Action::Action9 => "ACTION9",
            Action::Action10 => "ACTION10",
            Action::Action11 => "ACTION11",
            Action::Action12 => "ACTION12",
            Action::Action13 => "ACTION13",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError::new("action", s))
    }
}

/// Card product kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Classification {
    Prepaid,
    Debit,
    Credit,
}

impl Classification {
    pub const ALL: [Classification; 3] = [
        Classification::Prepaid,
        Classification::Debit,
        Classification::Credit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Prepaid => "Prepaid",
            Classification::Debit => "Debit",
            Classification::Credit => "Credit",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Classification::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError::new("classification", s))
    }
}

/// Card lifecycle snapshot. No transition graph is modelled here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    Ordered,
    Inactive,
    Active,
    Restricted,
    Blocked,
    Expired,
    Closed,
}

impl LifecycleState {
    pub const ALL: [LifecycleState; 7] = [
        LifecycleState::Ordered,
        LifecycleState::Inactive,
        LifecycleState::Active,
        LifecycleState::Restricted,
        LifecycleState::Blocked,
        LifecycleState::Expired,
        LifecycleState::Closed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Ordered => "Ordered",
            LifecycleState::Inactive => "Inactive",
            LifecycleState::Active => "Active",
            LifecycleState::Restricted => "Restricted",
            LifecycleState::Blocked => "Blocked",
            LifecycleState::Expired => "Expired",
            LifecycleState::Closed => "Closed",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleState {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LifecycleState::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError::new("lifecycle state", s))
    }
}

/// A card as resolved by an [`InstrumentResolver`](crate::io::resolver::InstrumentResolver).
///
/// Read-only input to evaluation; never mutated or persisted by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentRecord {
    pub instrument_id: String,
    pub classification: Classification,
    pub state: LifecycleState,
    pub pin_is_set: bool,
}

/// Evaluator output: duplicate-free actions in canonical order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermittedActions(Vec<Action>);

impl PermittedActions {
    /// Build from any iterator; the result is sorted and deduplicated.
    pub fn from_unordered(actions: impl IntoIterator<Item = Action>) -> Self {
        let mut actions: Vec<Action> = actions.into_iter().collect();
        actions.sort();
        actions.dedup();
        Self(actions)
    }

    pub fn as_slice(&self) -> &[Action] {
        &self.0
    }

    pub fn contains(&self, action: Action) -> bool {
        self.0.binary_search(&action).is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Action> + '_ {
        self.0.iter().copied()
    }

    /// Symbolic names in canonical order.
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|action| action.as_str().to_string()).collect()
    }
}

impl IntoIterator for PermittedActions {
    type Item = Action;
    type IntoIter = std::vec::IntoIter<Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_order_follows_declaration() {
        let mut sorted = Action::ALL;
        sorted.sort();
        assert_eq!(sorted, Action::ALL);
        assert!(Action::Action2 < Action::Action10);
    }

    #[test]
    fn all_arrays_list_each_variant_once() {
        for (idx, action) in Action::ALL.iter().enumerate() {
            assert_eq!(action.as_str(), format!("ACTION{}", idx + 1));
        }
        let names: Vec<&str> = Classification::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, vec!["Prepaid", "Debit", "Credit"]);
        let names: Vec<&str> = LifecycleState::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Ordered",
                "Inactive",
                "Active",
                "Restricted",
                "Blocked",
                "Expired",
                "Closed"
            ]
        );
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("credit".parse::<Classification>(), Ok(Classification::Credit));
        assert_eq!(" ACTIVE ".parse::<LifecycleState>(), Ok(LifecycleState::Active));
        assert_eq!("action12".parse::<Action>(), Ok(Action::Action12));
    }

    #[test]
    fn parse_rejects_unknown_values() {
        let err = "gold".parse::<Classification>().expect_err("unknown");
        assert_eq!(err.to_string(), "unknown classification 'gold'");
        assert!("ACTION14".parse::<Action>().is_err());
    }

    #[test]
    fn action_serializes_as_symbolic_name() {
        let json = serde_json::to_string(&Action::Action10).expect("serialize");
        assert_eq!(json, "\"ACTION10\"");
    }

    #[test]
    fn permitted_actions_sort_and_dedup() {
        let actions = PermittedActions::from_unordered([
            Action::Action11,
            Action::Action2,
            Action::Action11,
            Action::Action1,
        ]);
        assert_eq!(
            actions.as_slice(),
            &[Action::Action1, Action::Action2, Action::Action11]
        );
        assert!(actions.contains(Action::Action2));
        assert!(!actions.contains(Action::Action3));
        assert_eq!(actions.names(), vec!["ACTION1", "ACTION2", "ACTION11"]);
    }
}
