//! Copying values between the calling task's memory and the kernel.

use bytemuck::Pod;
use kapi::SemError;

/// A user address could not be accessed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[error("user memory fault at {addr:#x}")]
pub struct Fault {
    pub addr: usize,
}

impl From<Fault> for SemError {
    fn from(_value: Fault) -> Self {
        SemError::MemoryFault
    }
}

/// The address space of the task that issued the syscall.
pub trait UserMemory {
    /// Fills `dst` with the bytes at user address `src`.
    fn copy_in(&self, dst: &mut [u8], src: usize) -> Result<(), Fault>;

    /// Writes `src` at user address `dst`.
    fn copy_out(&self, dst: usize, src: &[u8]) -> Result<(), Fault>;
}

pub fn read_user<T: Pod, M: UserMemory + ?Sized>(mem: &M, addr: usize) -> Result<T, Fault> {
    let mut value: T = bytemuck::Zeroable::zeroed();
    mem.copy_in(bytemuck::bytes_of_mut(&mut value), addr)?;
    Ok(value)
}

pub fn write_user<T: Pod, M: UserMemory + ?Sized>(
    mem: &M,
    addr: usize,
    value: &T,
) -> Result<(), Fault> {
    mem.copy_out(addr, bytemuck::bytes_of(value))
}
