use crate::raw::{syscall, SemError, SyscallArgs, SyscallGate};

pub mod sem;

pub use sem::SemOp;

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidOperation {
    #[error("unknown operation")]
    BadOp,
    #[error("invalid argument")]
    InvalidArgument,
}

impl From<InvalidOperation> for SemError {
    fn from(_value: InvalidOperation) -> Self {
        SemError::InvalidArgument
    }
}

impl<T: num_enum::TryFromPrimitive> From<num_enum::TryFromPrimitiveError<T>> for InvalidOperation {
    fn from(_value: num_enum::TryFromPrimitiveError<T>) -> Self {
        Self::BadOp
    }
}

impl From<core::num::TryFromIntError> for InvalidOperation {
    fn from(_value: core::num::TryFromIntError) -> Self {
        Self::InvalidArgument
    }
}

pub trait SyscallOp: Sized + Copy {
    type R;

    /// Performs the syscall associated with this operation
    ///
    /// # Safety
    ///
    /// Syscalls can fundamentally change memory
    unsafe fn syscall<G: SyscallGate + ?Sized>(self, gate: &G) -> Result<Self::R, SemError> {
        let args = self.make_args();
        unsafe { syscall(gate, args).map(|code| self.convert_success_code(code)) }
    }

    fn make_args(&self) -> SyscallArgs<'_>;
    fn from_args(args: SyscallArgs) -> Result<Self, InvalidOperation>;
    fn convert_success_code(&self, code: usize) -> Self::R;
}
