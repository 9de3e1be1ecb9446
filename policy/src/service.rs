//! Allowed-action lookups for an owner's card: validate identifiers, resolve
//! the card, evaluate the policy.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::core::evaluator::Evaluator;
use crate::core::types::{InstrumentRecord, PermittedActions};
use crate::error::PolicyError;
use crate::io::resolver::{InstrumentResolver, ResolveError};

/// Failure of a single allowed-actions lookup.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// One or both identifiers were empty after trimming.
    #[error("owner and instrument identifiers are required")]
    MissingIdentifiers,

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// Successful lookup: the resolved card and what it may do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllowedActions {
    pub owner_id: String,
    pub record: InstrumentRecord,
    pub actions: PermittedActions,
}

/// Couples an instrument resolver with the evaluator.
#[derive(Clone)]
pub struct CardActionsService {
    resolver: Arc<dyn InstrumentResolver>,
    evaluator: Evaluator,
}

impl CardActionsService {
    pub fn new(resolver: Arc<dyn InstrumentResolver>, evaluator: Evaluator) -> Self {
        Self {
            resolver,
            evaluator,
        }
    }

    /// Look up the permitted actions for `instrument_id` owned by `owner_id`.
    ///
    /// Identifiers are trimmed before use. Resolver errors are returned as-is.
    pub async fn allowed_actions(
        &self,
        owner_id: &str,
        instrument_id: &str,
    ) -> Result<AllowedActions, ServiceError> {
        let (owner_id, instrument_id) = required_identifiers(owner_id, instrument_id)?;

        let record = self.resolver.resolve(owner_id, instrument_id).await?;
        let actions = self.evaluator.evaluate_record(&record)?;
        debug!(
            owner_id,
            instrument_id,
            classification = %record.classification,
            state = %record.state,
            pin_is_set = record.pin_is_set,
            permitted = actions.len(),
            "evaluated card actions"
        );

        Ok(AllowedActions {
            owner_id: owner_id.to_string(),
            record,
            actions,
        })
    }
}

/// Trim both identifiers, failing if either ends up empty.
pub fn required_identifiers<'a>(
    owner_id: &'a str,
    instrument_id: &'a str,
) -> Result<(&'a str, &'a str), ServiceError> {
    let owner_id = owner_id.trim();
    let instrument_id = instrument_id.trim();
    if owner_id.is_empty() || instrument_id.is_empty() {
        return Err(ServiceError::MissingIdentifiers);
    }
    Ok((owner_id, instrument_id))
}
