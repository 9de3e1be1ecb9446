//! Shared application state for the API server.

use std::sync::Arc;

use anyhow::Result;
use card_policy::core::evaluator::Evaluator;
use card_policy::io::resolver::{InMemoryResolver, InstrumentResolver};
use card_policy::io::table_store::load_table_or_reference;
use card_policy::service::CardActionsService;
use tracing::info;

use crate::config::ApiConfig;

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CardActionsService>,
}

impl AppState {
    pub fn new(service: CardActionsService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Build state from config: load and validate the policy table, then
    /// create the in-memory card store.
    ///
    /// An invalid policy table fails here, before the server accepts requests.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let table = load_table_or_reference(config.policy_table.as_deref())?;
        let evaluator = Evaluator::new(Arc::new(table));

        let resolver = if config.seed_sample_cards {
            InMemoryResolver::with_sample_portfolio()
        } else {
            InMemoryResolver::new()
        };
        info!(
            owners = resolver.owner_count(),
            cards = resolver.instrument_count(),
            policy_table = ?config.policy_table,
            "card store ready"
        );
        let resolver: Arc<dyn InstrumentResolver> = Arc::new(resolver);

        Ok(Self::new(CardActionsService::new(resolver, evaluator)))
    }
}
