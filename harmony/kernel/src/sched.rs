//! The scheduler's sleep/wakeup contract.
//!
//! The semaphore code doesn't know how tasks are switched; it only needs a
//! way to park the current task on a channel and to wake everything parked on
//! one. That is what [`Scheduler`] describes.

use sync::SpinLockGuard;

/// Identity of a wait queue.
///
/// Built from the address of the object being waited on, so two objects never
/// share a channel while both are alive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct WaitChannel(usize);

impl WaitChannel {
    pub fn of<T>(object: &T) -> Self {
        Self(object as *const T as usize)
    }
}

/// Sleep and wakeup provided by the task scheduler.
pub trait Scheduler {
    /// Puts the current task to sleep on `chan`.
    ///
    /// Registering the task on `chan` and releasing the lock behind `guard`
    /// must happen as one step with respect to [`Scheduler::wakeup`]: a wakeup
    /// issued by someone who acquired the lock after us must not be lost. The
    /// lock is reacquired before returning.
    ///
    /// Returning does not mean the condition the caller waits for holds. The
    /// task may be woken for another reason (a broadcast, being killed), so
    /// callers re-check their condition in a loop.
    fn sleep<'a, T>(&self, chan: WaitChannel, guard: SpinLockGuard<'a, T>) -> SpinLockGuard<'a, T>;

    /// Makes every task sleeping on `chan` runnable.
    fn wakeup(&self, chan: WaitChannel);

    /// Whether the current task has been killed and must leave the kernel.
    fn killed(&self) -> bool;
}
