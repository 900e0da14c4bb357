//! A single counting semaphore and its wait/post protocol.

use kapi::{SemError, SEM_VALUE_MAX};
use sync::SpinLock;

use crate::sched::{Scheduler, WaitChannel};

#[derive(Debug, Default)]
struct SemState {
    /// Available units.
    count: u32,
    /// Bumped every time the semaphore is retired. A waiter that sees a
    /// different epoch after waking knows its semaphore is gone.
    epoch: u32,
}

/// A counting semaphore.
///
/// Everything lives behind the semaphore's own lock; the lock is also the one
/// handed to the scheduler when a waiter goes to sleep, which is what keeps a
/// concurrent [`Semaphore::post`] from slipping between the count check and
/// the sleep.
#[derive(Debug, Default)]
pub struct Semaphore {
    state: SpinLock<SemState>,
}

impl Semaphore {
    pub const fn new() -> Self {
        Self {
            state: SpinLock::new(SemState { count: 0, epoch: 0 }),
        }
    }

    /// The channel waiters of this semaphore sleep on.
    pub fn channel(&self) -> WaitChannel {
        WaitChannel::of(self)
    }

    /// Current count. Stale as soon as it returns.
    pub fn value(&self) -> u32 {
        self.state.lock().count
    }

    /// P: blocks until a unit is available and takes it.
    ///
    /// Fails with [`SemError::Interrupted`] if the current task is killed while
    /// waiting and with [`SemError::Destroyed`] if the semaphore is retired
    /// under it.
    pub fn wait<S: Scheduler>(&self, sched: &S) -> Result<(), SemError> {
        let mut state = self.state.lock();
        let epoch = state.epoch;
        while state.count == 0 {
            if sched.killed() {
                log::warn!("wait on {:?} interrupted", self.channel());
                return Err(SemError::Interrupted);
            }
            log::trace!("sleeping on {:?}", self.channel());
            state = sched.sleep(self.channel(), state);
            if state.epoch != epoch {
                return Err(SemError::Destroyed);
            }
        }
        state.count -= 1;
        Ok(())
    }

    /// V: returns a unit and wakes the waiters.
    pub fn post<S: Scheduler>(&self, sched: &S) -> Result<(), SemError> {
        let mut state = self.state.lock();
        if state.count >= SEM_VALUE_MAX {
            return Err(SemError::Overflow);
        }
        state.count += 1;
        sched.wakeup(self.channel());
        Ok(())
    }

    /// Gives a freshly allocated semaphore its initial count.
    pub(super) fn reset(&self, count: u32) {
        self.state.lock().count = count;
    }

    /// Invalidates every pending wait and drains the count.
    pub(super) fn retire<S: Scheduler>(&self, sched: &S) {
        let mut state = self.state.lock();
        state.epoch = state.epoch.wrapping_add(1);
        state.count = 0;
        sched.wakeup(self.channel());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::test_utils::{init_logging, wait_until, HostScheduler};

    #[test]
    fn wait_takes_available_units() {
        init_logging();
        let sched = HostScheduler::new();
        let sem = Semaphore::new();
        sem.reset(2);
        sem.wait(&sched).unwrap();
        sem.wait(&sched).unwrap();
        assert_eq!(sem.value(), 0);
        assert_eq!(sched.sleepers(), 0);
    }

    #[test]
    fn post_wakes_a_blocked_waiter() {
        init_logging();
        let sched = HostScheduler::new();
        let sem = Semaphore::new();

        std::thread::scope(|s| {
            let waiter = s.spawn(|| sem.wait(&sched));
            sched.wait_for_sleepers(1);
            sem.post(&sched).unwrap();
            assert_eq!(waiter.join().unwrap(), Ok(()));
        });
        assert_eq!(sem.value(), 0);
    }

    #[test]
    fn waiters_re_check_after_a_broadcast() {
        init_logging();
        let sched = HostScheduler::new();
        let sem = Semaphore::new();
        let done = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..3 {
                s.spawn(|| {
                    sem.wait(&sched).unwrap();
                    done.fetch_add(1, Ordering::SeqCst);
                });
            }
            sched.wait_for_sleepers(3);

            // One unit wakes everybody, but only one may get through.
            sem.post(&sched).unwrap();
            wait_until(|| done.load(Ordering::SeqCst) == 1);
            sched.wait_for_sleepers(2);
            assert_eq!(done.load(Ordering::SeqCst), 1);
            assert_eq!(sem.value(), 0);

            sem.post(&sched).unwrap();
            sem.post(&sched).unwrap();
        });
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(sem.value(), 0);
    }

    #[test]
    fn killed_waiter_is_interrupted() {
        init_logging();
        let sched = HostScheduler::new();
        let sem = Semaphore::new();

        std::thread::scope(|s| {
            let waiter = s.spawn(|| sem.wait(&sched));
            sched.wait_for_sleepers(1);
            sched.kill(waiter.thread().id());
            assert_eq!(waiter.join().unwrap(), Err(SemError::Interrupted));
        });
        // The count is untouched by the aborted wait.
        sem.post(&sched).unwrap();
        assert_eq!(sem.value(), 1);
    }

    #[test]
    fn retire_fails_pending_waits() {
        init_logging();
        let sched = HostScheduler::new();
        let sem = Semaphore::new();

        std::thread::scope(|s| {
            let waiters: Vec<_> = (0..2).map(|_| s.spawn(|| sem.wait(&sched))).collect();
            sched.wait_for_sleepers(2);
            sem.retire(&sched);
            for waiter in waiters {
                assert_eq!(waiter.join().unwrap(), Err(SemError::Destroyed));
            }
        });
    }

    #[test]
    fn post_refuses_to_overflow() {
        let sched = HostScheduler::new();
        let sem = Semaphore::new();
        sem.reset(SEM_VALUE_MAX);
        assert_eq!(sem.post(&sched), Err(SemError::Overflow));
        assert_eq!(sem.value(), SEM_VALUE_MAX);
    }
}
