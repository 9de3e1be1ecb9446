//! Permitted-action evaluation over an injected [`PolicyTable`].

use std::sync::Arc;

use crate::core::table::PolicyTable;
use crate::core::types::{Classification, InstrumentRecord, LifecycleState, PermittedActions};
use crate::error::PolicyResult;

/// Stateless evaluator. Cloning shares the underlying table.
#[derive(Debug, Clone)]
pub struct Evaluator {
    table: Arc<PolicyTable>,
}

impl Evaluator {
    pub fn new(table: Arc<PolicyTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &PolicyTable {
        &self.table
    }

    /// Compute the permitted actions for one card snapshot:
    ///
    /// `(always ∪ pin-conditional subset) ∩ classification ceiling`,
    /// returned in canonical action order.
    ///
    /// A table without an entry for `classification` or `state` fails with
    /// `InvalidConfiguration` rather than answering with an empty set, which
    /// is a legitimate result on its own.
    pub fn evaluate(
        &self,
        classification: Classification,
        state: LifecycleState,
        pin_is_set: bool,
    ) -> PolicyResult<PermittedActions> {
        let ceiling = self.table.actions_for_classification(classification)?;
        let rule = self.table.rule_for_state(state)?;

        let permitted = rule
            .always
            .union(rule.conditional(pin_is_set))
            .filter(|action| ceiling.contains(*action))
            .copied();

        Ok(PermittedActions::from_unordered(permitted))
    }

    pub fn evaluate_record(&self, record: &InstrumentRecord) -> PolicyResult<PermittedActions> {
        self.evaluate(record.classification, record.state, record.pin_is_set)
    }
}
