//! Kernel-resident counting semaphores.
//!
//! A fixed table of semaphores addressed by small integer handles, the
//! wait/post protocol on top of the scheduler's sleep/wakeup, and the syscall
//! adapters that move handles across the user boundary.
#![cfg_attr(not(test), no_std)]
#![deny(absolute_paths_not_starting_with_crate)]
#![warn(missing_debug_implementations)]
#![warn(unsafe_op_in_unsafe_fn)]

pub mod param;
pub mod sched;
pub mod sem;
pub mod syscall;
pub mod uaccess;

pub use syscall::Kernel;

#[cfg(test)]
pub(crate) mod test_utils;
