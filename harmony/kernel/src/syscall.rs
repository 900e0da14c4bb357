//! Syscall entry points for semaphores.
//!
//! Each adapter reads the caller's handle through [`UserMemory`], resolves it
//! against the table and runs the operation. Every failure is reported to the
//! caller as a negative return value; nothing a caller passes in can leave the
//! table inconsistent.

use kapi::ops::{SemOp, SyscallOp};
use kapi::{SemError, SemFlags, SemId, SyscallArgs};

use crate::param::NSEM;
use crate::sched::Scheduler;
use crate::sem::SemTable;
use crate::uaccess::{read_user, write_user, UserMemory};


/// The semaphore subsystem: the table plus the scheduler it blocks through.
///
/// Constructed once at boot and shared by reference with every syscall.
#[derive(Debug)]
pub struct Kernel<S: Scheduler, const N: usize = NSEM> {
    table: SemTable<N>,
    sched: S,
}

impl<S: Scheduler, const N: usize> Kernel<S, N> {
    pub fn new(sched: S) -> Self {
        Self {
            table: SemTable::new(),
            sched,
        }
    }

    pub fn table(&self) -> &SemTable<N> {
        &self.table
    }

    pub fn scheduler(&self) -> &S {
        &self.sched
    }

    /// `sem_init(addr, flags, value)`
    ///
    /// The slot is released again if the handle can't be written back, so a
    /// failed call never leaks a semaphore.
    pub fn sem_init<M: UserMemory + ?Sized>(
        &self,
        mem: &M,
        addr: usize,
        flags: SemFlags,
        value: u32,
    ) -> Result<(), SemError> {
        log::trace!("sem_init flags: {flags:?}");
        let id = self.table.allocate(value)?;
        if let Err(fault) = write_user(mem, addr, &id) {
            log::debug!("rolling back {id:?}: {fault}");
            self.table.release(&self.sched, id);
            return Err(fault.into());
        }
        Ok(())
    }

    /// `sem_destroy(addr)`
    pub fn sem_destroy<M: UserMemory + ?Sized>(&self, mem: &M, addr: usize) -> Result<(), SemError> {
        let id: SemId = read_user(mem, addr)?;
        self.table.destroy(&self.sched, id)
    }

    /// `sem_wait(addr)`. The only call that blocks.
    pub fn sem_wait<M: UserMemory + ?Sized>(&self, mem: &M, addr: usize) -> Result<(), SemError> {
        let id: SemId = read_user(mem, addr)?;
        self.table.wait_on(&self.sched, id)
    }

    /// `sem_post(addr)`
    pub fn sem_post<M: UserMemory + ?Sized>(&self, mem: &M, addr: usize) -> Result<(), SemError> {
        let id: SemId = read_user(mem, addr)?;
        self.table.post_on(&self.sched, id)
    }

    pub fn dispatch<M: UserMemory + ?Sized>(&self, mem: &M, op: SemOp) -> Result<(), SemError> {
        match op {
            SemOp::Init { addr, flags, value } => self.sem_init(mem, addr, flags, value),
            SemOp::Destroy { addr } => self.sem_destroy(mem, addr),
            SemOp::Wait { addr } => self.sem_wait(mem, addr),
            SemOp::Post { addr } => self.sem_post(mem, addr),
        }
    }

    /// Decodes and runs one syscall. Returns `0` or a negative error code.
    pub fn handle<M: UserMemory + ?Sized>(&self, mem: &M, args: SyscallArgs) -> isize {
        log::debug!("SYSCALL: {args:?}");
        let result = SemOp::from_args(args)
            .map_err(SemError::from)
            .and_then(|op| self.dispatch(mem, op));
        match result {
            Ok(()) => 0,
            Err(e) => {
                log::debug!("Returning error: {e}");
                e.to_errno()
            }
        }
    }
}
