//! Stable exit codes for the `steploop` binary.

/// Session ended by `exit` or end of input.
pub const OK: i32 = 0;
/// Startup failed: invalid config, missing credential, or other errors.
pub const INVALID: i32 = 1;
/// The user denied a command under the terminate policy.
pub const DENIED: i32 = 2;
