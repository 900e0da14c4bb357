use core::marker::PhantomData;

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use num_enum::{IntoPrimitive, TryFromPrimitive, TryFromPrimitiveError};

/// Largest value a semaphore count can hold.
pub const SEM_VALUE_MAX: u32 = i32::MAX as u32;

/// The trap into the kernel.
///
/// Userspace reaches the kernel through an implementation of this trait; the
/// kernel side decodes the same [`SyscallArgs`] with [`SyscallOp::from_args`].
///
/// [`SyscallOp::from_args`]: crate::ops::SyscallOp::from_args
pub trait SyscallGate {
    /// Performs a raw syscall
    ///
    /// Returns a non-negative value on success and a negated [`SemError`] code
    /// on failure.
    ///
    /// # Safety
    ///
    /// Performing a syscall is inherently unsafe, follow the syscall
    /// documentation to guarantee proper usage and soundness.
    unsafe fn raw_syscall(&self, args: SyscallArgs) -> isize;
}

/// Performs a syscall
///
/// # Safety
///
/// Performing a syscall is inherently unsafe, follow the syscall
/// documentation to guarantee proper usage and soundness.
pub unsafe fn syscall<G: SyscallGate + ?Sized>(
    gate: &G,
    args: SyscallArgs,
) -> Result<usize, SemError> {
    let result = unsafe { gate.raw_syscall(args) };
    match usize::try_from(result) {
        Ok(ret) => Ok(ret),
        Err(_) => Err(SemError::from_errno(result)),
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(usize)]
pub enum RawOperation {
    SemInit = 0,
    SemDestroy,
    SemWait,
    SemPost,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, TryFromPrimitive, IntoPrimitive, thiserror::Error)]
#[repr(u8)]
pub enum SemError {
    /// The arguments could not be decoded.
    #[error("invalid syscall argument")]
    InvalidArgument = 1,
    /// Copying the handle from or to the caller's memory failed.
    #[error("bad user address")]
    MemoryFault,
    /// No free slot is left in the semaphore table.
    #[error("semaphore table is full")]
    TableFull,
    /// The handle is out of range or doesn't name a live semaphore.
    #[error("invalid semaphore handle")]
    InvalidHandle,
    /// The waiting task was killed while blocked.
    #[error("wait interrupted")]
    Interrupted,
    /// The semaphore was destroyed while the caller was blocked on it.
    #[error("semaphore destroyed while waiting")]
    Destroyed,
    /// Posting would push the count past [`SEM_VALUE_MAX`].
    #[error("semaphore value overflow")]
    Overflow,
}

impl<T: TryFromPrimitive> From<TryFromPrimitiveError<T>> for SemError {
    fn from(_value: TryFromPrimitiveError<T>) -> Self {
        Self::InvalidArgument
    }
}

impl SemError {
    pub fn to_errno(self) -> isize {
        let errno: isize = (self as u8).into();
        -errno
    }

    /// Inverse of [`SemError::to_errno`]. Unknown codes map to
    /// [`SemError::InvalidArgument`].
    pub fn from_errno(errno: isize) -> Self {
        errno
            .checked_neg()
            .and_then(|code| u8::try_from(code).ok())
            .and_then(|code| Self::try_from(code).ok())
            .unwrap_or(Self::InvalidArgument)
    }
}

bitflags! {
    /// Flags accepted by `sem_init`.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct SemFlags: usize {
        /// The semaphore is shared between processes. Every kernel semaphore
        /// is, so this is accepted but doesn't change anything.
        const PROCESS_SHARED = 1;
    }
}

/// A semaphore handle as it is stored in user memory (`sem_t`).
#[repr(transparent)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, PartialOrd, Ord, Hash, Pod, Zeroable)]
pub struct SemId(i32);

impl SemId {
    pub const INVALID: SemId = SemId(-1);

    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    pub const fn get(&self) -> i32 {
        self.0
    }

    /// The table index this handle names, if it is in `0..capacity`.
    pub fn index(&self, capacity: usize) -> Option<usize> {
        usize::try_from(self.0).ok().filter(|&idx| idx < capacity)
    }
}

impl From<i32> for SemId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl From<SemId> for i32 {
    fn from(value: SemId) -> Self {
        value.0
    }
}

impl TryFrom<usize> for SemId {
    type Error = core::num::TryFromIntError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Ok(Self(i32::try_from(value)?))
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SyscallArgs<'a> {
    op: usize,
    general: (usize, usize, usize, usize),
    _life: PhantomData<&'a ()>,
}

impl SyscallArgs<'_> {
    pub fn new(op: usize, a: usize, b: usize, c: usize, d: usize) -> Self {
        Self {
            op,
            general: (a, b, c, d),
            _life: PhantomData,
        }
    }

    pub fn op(&self) -> usize {
        self.op
    }

    pub fn args(&self) -> (usize, usize, usize, usize) {
        self.general
    }
}
