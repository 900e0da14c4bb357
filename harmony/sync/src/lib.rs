//! Synchronization primitives shared by the kernel crates.
#![cfg_attr(not(test), no_std)]

pub mod spin;

pub use spin::{SpinLock, SpinLockGuard};
