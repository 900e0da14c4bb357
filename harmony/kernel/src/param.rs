//! Compile-time kernel parameters.

/// Number of slots in the semaphore table.
pub const NSEM: usize = 64;
