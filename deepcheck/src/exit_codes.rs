//! Stable exit codes for deepcheck CLI commands.

/// Command succeeded; for `check`, every included location satisfied the rule.
pub const OK: i32 = 0;
/// Command failed due to an invalid policy, unreadable input or other errors.
pub const INVALID: i32 = 1;
/// `deepcheck check` found locations that did not satisfy the rule.
pub const FAILED: i32 = 2;
