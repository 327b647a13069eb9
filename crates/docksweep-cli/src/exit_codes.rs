//! Unified exit codes for the docksweep CLI.
//! These codes are part of the public contract; CI pipelines key off them.

pub const SUCCESS: i32 = 0;
pub const SUBMIT_FAILED: i32 = 1; // Scheduler or worker launch returned non-zero
pub const CONFIG_ERROR: i32 = 2; // Invalid run directory, missing inputs or bad arguments
