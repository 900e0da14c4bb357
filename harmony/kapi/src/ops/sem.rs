//! Operations on counting semaphores.
//!
//! Every operation names its semaphore by the user address of a [`SemId`],
//! never by the handle value itself. The kernel reads (and, for `Init`,
//! writes) the handle through that address.
//!
//! [`SemId`]: crate::raw::SemId

use super::{InvalidOperation, SyscallOp};
use crate::raw::{RawOperation, SemFlags, SyscallArgs, SEM_VALUE_MAX};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SemOp {
    Init {
        addr: usize,
        flags: SemFlags,
        value: u32,
    },
    Destroy {
        addr: usize,
    },
    Wait {
        addr: usize,
    },
    Post {
        addr: usize,
    },
}

impl SemOp {
    /// The user address of the handle this operation works on.
    pub fn addr(&self) -> usize {
        match *self {
            SemOp::Init { addr, .. }
            | SemOp::Destroy { addr }
            | SemOp::Wait { addr }
            | SemOp::Post { addr } => addr,
        }
    }
}

fn user_addr(addr: usize) -> Result<usize, InvalidOperation> {
    if addr == 0 {
        Err(InvalidOperation::InvalidArgument)
    } else {
        Ok(addr)
    }
}

impl SyscallOp for SemOp {
    type R = ();

    fn make_args(&self) -> SyscallArgs<'_> {
        match *self {
            SemOp::Init { addr, flags, value } => SyscallArgs::new(
                RawOperation::SemInit.into(),
                addr,
                flags.bits(),
                value as usize,
                0,
            ),
            SemOp::Destroy { addr } => {
                SyscallArgs::new(RawOperation::SemDestroy.into(), addr, 0, 0, 0)
            }
            SemOp::Wait { addr } => SyscallArgs::new(RawOperation::SemWait.into(), addr, 0, 0, 0),
            SemOp::Post { addr } => SyscallArgs::new(RawOperation::SemPost.into(), addr, 0, 0, 0),
        }
    }

    fn from_args(args: SyscallArgs) -> Result<Self, InvalidOperation> {
        let op = RawOperation::try_from(args.op())?;
        let (addr, b, c, _) = args.args();
        let addr = user_addr(addr)?;
        match op {
            RawOperation::SemInit => {
                let flags = SemFlags::from_bits(b).ok_or(InvalidOperation::InvalidArgument)?;
                let value = u32::try_from(c)?;
                if value > SEM_VALUE_MAX {
                    return Err(InvalidOperation::InvalidArgument);
                }
                Ok(Self::Init { addr, flags, value })
            }
            RawOperation::SemDestroy => Ok(Self::Destroy { addr }),
            RawOperation::SemWait => Ok(Self::Wait { addr }),
            RawOperation::SemPost => Ok(Self::Post { addr }),
        }
    }

    fn convert_success_code(&self, _code: usize) -> Self::R {}
}
