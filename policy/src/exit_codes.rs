//! Stable exit codes for `card-policy` commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid arguments, unreadable or invalid policy table, or other errors.
pub const INVALID: i32 = 1;
