//! Higher-level structured syscalls
//!
//! The userspace side of the semaphore API: a `sem_t` word living somewhere
//! in the caller's memory, and the four calls that operate on it.

use crate::ops::{SemOp, SyscallOp as _};
use crate::raw::{SemError, SemFlags, SyscallGate};

/// A semaphore handle slot in user memory.
///
/// The kernel writes the handle into this slot on [`UserSem::init`] and reads
/// it back on every other call, so the slot may live in memory shared between
/// processes.
#[derive(Debug)]
pub struct UserSem<'g, G: SyscallGate + ?Sized> {
    gate: &'g G,
    addr: usize,
}

impl<'g, G: SyscallGate + ?Sized> UserSem<'g, G> {
    /// Names the handle-sized slot at `addr`.
    ///
    /// # Safety
    ///
    /// `addr` must point to memory the calling process may read and write
    /// through `gate` for as long as this value is used.
    pub const unsafe fn at(gate: &'g G, addr: usize) -> Self {
        Self { gate, addr }
    }

    pub fn addr(&self) -> usize {
        self.addr
    }

    /// `sem_init`: allocates a semaphore and stores its handle in the slot.
    pub fn init(&self, flags: SemFlags, value: u32) -> Result<(), SemError> {
        let op = SemOp::Init {
            addr: self.addr,
            flags,
            value,
        };
        // SAFETY: The slot was vouched for in `UserSem::at`.
        unsafe { op.syscall(self.gate) }
    }

    /// `sem_destroy`
    pub fn destroy(&self) -> Result<(), SemError> {
        unsafe { SemOp::Destroy { addr: self.addr }.syscall(self.gate) }
    }

    /// `sem_wait`: blocks until the count is positive, then decrements it.
    pub fn wait(&self) -> Result<(), SemError> {
        unsafe { SemOp::Wait { addr: self.addr }.syscall(self.gate) }
    }

    /// `sem_post`
    pub fn post(&self) -> Result<(), SemError> {
        unsafe { SemOp::Post { addr: self.addr }.syscall(self.gate) }
    }
}
