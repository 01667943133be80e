//! Exit codes of the `asic` binary. Part of the public contract.

pub const SUCCESS: i32 = 0;
pub const VERIFY_FAILED: i32 = 1; // Container read, but a manifest or structural check failed
pub const INTERNAL_ERROR: i32 = 2; // I/O or configuration error
pub const UNSAFE_CONTAINER: i32 = 3; // Rejected by a zip limit or security check
