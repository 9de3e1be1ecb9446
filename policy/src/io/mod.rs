//! I/O collaborators of the policy core.

pub mod resolver;
pub mod table_store;
