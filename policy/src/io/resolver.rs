//! Instrument lookup by owner and card identifier.
//!
//! Resolvers may be slow or remote. Callers see their failures unchanged; this
//! crate never retries a lookup.

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::types::{Classification, InstrumentRecord, LifecycleState};

/// Why a lookup produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("owner '{owner_id}' does not exist")]
    OwnerNotFound { owner_id: String },

    #[error("owner '{owner_id}' does not own instrument '{instrument_id}'")]
    InstrumentNotFound {
        owner_id: String,
        instrument_id: String,
    },

    /// The backing store could not answer.
    #[error("instrument lookup unavailable: {0}")]
    Unavailable(String),
}

/// Resolves `(owner, instrument)` identifiers to a card snapshot.
#[async_trait]
pub trait InstrumentResolver: Send + Sync {
    async fn resolve(
        &self,
        owner_id: &str,
        instrument_id: &str,
    ) -> Result<InstrumentRecord, ResolveError>;
}

/// Resolver backed by an in-process map, keyed by owner then instrument id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryResolver {
    owners: BTreeMap<String, BTreeMap<String, InstrumentRecord>>,
}

impl InMemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver seeded with [`sample_portfolio`].
    pub fn with_sample_portfolio() -> Self {
        let mut resolver = Self::new();
        for (owner_id, record) in sample_portfolio() {
            resolver.insert(owner_id, record);
        }
        resolver
    }

    /// Register an owner with no cards.
    pub fn add_owner(&mut self, owner_id: impl Into<String>) {
        self.owners.entry(owner_id.into()).or_default();
    }

    /// Register a card for an owner, creating the owner if needed.
    pub fn insert(&mut self, owner_id: impl Into<String>, record: InstrumentRecord) {
        self.owners
            .entry(owner_id.into())
            .or_default()
            .insert(record.instrument_id.clone(), record);
    }

    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    pub fn instrument_count(&self) -> usize {
        self.owners.values().map(BTreeMap::len).sum()
    }

    fn lookup(&self, owner_id: &str, instrument_id: &str) -> Result<InstrumentRecord, ResolveError> {
        let cards = self
            .owners
            .get(owner_id)
            .ok_or_else(|| ResolveError::OwnerNotFound {
                owner_id: owner_id.to_string(),
            })?;
        cards
            .get(instrument_id)
            .cloned()
            .ok_or_else(|| ResolveError::InstrumentNotFound {
                owner_id: owner_id.to_string(),
                instrument_id: instrument_id.to_string(),
            })
    }
}

#[async_trait]
impl InstrumentResolver for InMemoryResolver {
    async fn resolve(
        &self,
        owner_id: &str,
        instrument_id: &str,
    ) -> Result<InstrumentRecord, ResolveError> {
        self.lookup(owner_id, instrument_id)
    }
}

/// Demo portfolio: `User1`..`User3`, each owning `Card<u>1`..`Card<u>21`.
///
/// Card `idx` walks classification-major over every (classification, state)
/// pair; even indexes have a PIN set.
pub fn sample_portfolio() -> Vec<(String, InstrumentRecord)> {
    let mut cards = Vec::new();
    for user in 1..=3 {
        let owner_id = format!("User{}", user);
        let mut idx = 1;
        for classification in Classification::ALL {
            for state in LifecycleState::ALL {
                cards.push((
                    owner_id.clone(),
                    InstrumentRecord {
                        instrument_id: format!("Card{}{}", user, idx),
                        classification,
                        state,
                        pin_is_set: idx % 2 == 0,
                    },
                ));
                idx += 1;
            }
        }
    }
    cards
}
