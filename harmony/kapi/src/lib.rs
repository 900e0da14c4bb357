//! Kernel <--> Userspace API
//!
//! Operation numbers, error codes and argument layouts for the semaphore
//! syscalls. Both sides of the boundary encode and decode through
//! [`ops::SyscallOp`] so they can never disagree on the layout.
#![cfg_attr(not(test), no_std)]

pub mod ops;
pub mod raw;
#[cfg(feature = "userspace")]
pub mod userspace;

pub use raw::{SemError, SemFlags, SemId, SyscallArgs, SyscallGate, SEM_VALUE_MAX};
