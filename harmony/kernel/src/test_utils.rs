//! Host stand-ins for the scheduler, user memory and the trap into the kernel.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, ThreadId};
use std::time::Duration;

use kapi::{SemId, SyscallArgs, SyscallGate};
use sync::SpinLockGuard;

use crate::sched::{Scheduler, WaitChannel};
use crate::uaccess::{read_user, Fault, UserMemory};
use crate::Kernel;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Polls `cond` until it holds.
pub fn wait_until(mut cond: impl FnMut() -> bool) {
    while !cond() {
        thread::sleep(Duration::from_millis(1));
    }
}

#[derive(Debug, Default)]
struct HostState {
    /// Number of wakeups issued per channel.
    wakeups: HashMap<WaitChannel, u64>,
    killed: HashSet<ThreadId>,
    sleepers: usize,
}

impl HostState {
    fn wakeups(&self, chan: WaitChannel) -> u64 {
        self.wakeups.get(&chan).copied().unwrap_or(0)
    }
}

/// Every OS thread is a task. Sleeping threads park on one condition variable
/// and leave once the wakeup counter of their channel moves.
#[derive(Debug, Default)]
pub struct HostScheduler {
    state: Mutex<HostState>,
    woken: Condvar,
}

impl HostScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `thread` as killed and kicks it out of any sleep.
    pub fn kill(&self, thread: ThreadId) {
        self.state.lock().unwrap().killed.insert(thread);
        self.woken.notify_all();
    }

    pub fn sleepers(&self) -> usize {
        self.state.lock().unwrap().sleepers
    }

    /// Blocks until exactly `count` tasks are asleep.
    pub fn wait_for_sleepers(&self, count: usize) {
        wait_until(|| self.sleepers() == count);
    }
}

impl Scheduler for HostScheduler {
    fn sleep<'a, T>(&self, chan: WaitChannel, guard: SpinLockGuard<'a, T>) -> SpinLockGuard<'a, T> {
        let me = thread::current().id();
        let mut state = self.state.lock().unwrap();
        // A wakeup needs `state`, which we hold until `Condvar::wait` releases
        // it, so releasing the spin lock here can't lose one.
        let seen = state.wakeups(chan);
        let lock = SpinLockGuard::unlocked(guard);
        state.sleepers += 1;
        while state.wakeups(chan) == seen && !state.killed.contains(&me) {
            state = self.woken.wait(state).unwrap();
        }
        state.sleepers -= 1;
        drop(state);
        lock.lock()
    }

    fn wakeup(&self, chan: WaitChannel) {
        *self.state.lock().unwrap().wakeups.entry(chan).or_default() += 1;
        self.woken.notify_all();
    }

    fn killed(&self) -> bool {
        let me = thread::current().id();
        self.state.lock().unwrap().killed.contains(&me)
    }
}

/// A region of user memory shared by every task holding a clone.
#[derive(Debug, Clone)]
pub struct HostMemory {
    base: usize,
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl HostMemory {
    pub fn new(base: usize, len: usize) -> Self {
        Self {
            base,
            bytes: Arc::new(Mutex::new(vec![0; len])),
        }
    }

    /// Reads the handle stored at `addr`, as the owning process would.
    pub fn handle_at(&self, addr: usize) -> SemId {
        read_user(self, addr).unwrap()
    }

    fn offset(&self, addr: usize, len: usize, size: usize) -> Result<usize, Fault> {
        let offset = addr.checked_sub(self.base).ok_or(Fault { addr })?;
        match offset.checked_add(len) {
            Some(end) if end <= size => Ok(offset),
            _ => Err(Fault { addr }),
        }
    }
}

impl UserMemory for HostMemory {
    fn copy_in(&self, dst: &mut [u8], src: usize) -> Result<(), Fault> {
        let bytes = self.bytes.lock().unwrap();
        let offset = self.offset(src, dst.len(), bytes.len())?;
        dst.copy_from_slice(&bytes[offset..offset + dst.len()]);
        Ok(())
    }

    fn copy_out(&self, dst: usize, src: &[u8]) -> Result<(), Fault> {
        let mut bytes = self.bytes.lock().unwrap();
        let offset = self.offset(dst, src.len(), bytes.len())?;
        bytes[offset..offset + src.len()].copy_from_slice(src);
        Ok(())
    }
}

/// A user task: traps straight into `kernel` with its own view of memory.
#[derive(Debug)]
pub struct HostTask<'k, M: UserMemory, const N: usize> {
    kernel: &'k Kernel<HostScheduler, N>,
    mem: M,
}

impl<'k, M: UserMemory, const N: usize> HostTask<'k, M, N> {
    pub fn new(kernel: &'k Kernel<HostScheduler, N>, mem: M) -> Self {
        Self { kernel, mem }
    }
}

impl<M: UserMemory, const N: usize> SyscallGate for HostTask<'_, M, N> {
    unsafe fn raw_syscall(&self, args: SyscallArgs) -> isize {
        self.kernel.handle(&self.mem, args)
    }
}
