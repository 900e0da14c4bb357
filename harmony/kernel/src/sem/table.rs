//! The fixed-size table of semaphores and the allocation of its slots.
//!
//! Two lock tiers are involved. The table lock serializes changes to slot
//! status (allocation and deallocation); each [`Semaphore`] has its own lock for
//! its count. The table lock is never held while a semaphore lock is taken.

use core::sync::atomic::{AtomicU8, Ordering};

use kapi::{SemError, SemId};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use sync::SpinLock;

use super::Semaphore;
use crate::param::NSEM;
use crate::sched::Scheduler;

/// Lifecycle of a table slot.
///
/// `Free -> Reserved -> Live -> Retiring -> Free`. Only `Live` slots can be
/// named by a handle; the two transient states keep a slot out of reach while
/// its semaphore is being (re)initialized or torn down outside the table lock.
#[derive(Debug, Copy, Clone, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
enum SlotStatus {
    Free = 0,
    Reserved,
    Live,
    Retiring,
}

#[derive(Debug, Default)]
struct SemSlot {
    /// Written only under the table lock.
    status: AtomicU8,
    sem: Semaphore,
}

impl SemSlot {
    fn status(&self) -> SlotStatus {
        match SlotStatus::try_from(self.status.load(Ordering::Acquire)) {
            Ok(status) => status,
            Err(err) => unreachable!("corrupted semaphore slot: {err:?}"),
        }
    }

    fn set_status(&self, status: SlotStatus) {
        self.status.store(status.into(), Ordering::Release);
    }
}

/// The kernel's semaphore table. A handle is the index of a slot.
#[derive(Debug)]
pub struct SemTable<const N: usize = NSEM> {
    lock: SpinLock<()>,
    slots: [SemSlot; N],
}

impl<const N: usize> Default for SemTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SemTable<N> {
    const HANDLES_FIT: () = assert!(N <= i32::MAX as usize, "slot index must fit in a SemId");

    pub fn new() -> Self {
        let () = Self::HANDLES_FIT;
        Self {
            lock: SpinLock::new(()),
            slots: core::array::from_fn(|_| SemSlot::default()),
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Claims the first free slot and gives it `initial` units.
    ///
    /// The slot only becomes visible to [`SemTable::resolve`] once its count is
    /// set.
    pub fn allocate(&self, initial: u32) -> Result<SemId, SemError> {
        let index = {
            let _table = self.lock.lock();
            let Some(index) = self
                .slots
                .iter()
                .position(|slot| slot.status() == SlotStatus::Free)
            else {
                log::warn!("semaphore table exhausted ({} slots)", N);
                return Err(SemError::TableFull);
            };
            self.slots[index].set_status(SlotStatus::Reserved);
            index
        };

        let slot = &self.slots[index];
        slot.sem.reset(initial);
        {
            let _table = self.lock.lock();
            slot.set_status(SlotStatus::Live);
        }

        // Cannot truncate, see `HANDLES_FIT`.
        let id = SemId::new(index as i32);
        log::debug!("allocated semaphore {id:?} = {initial}");
        Ok(id)
    }

    /// Frees the slot behind `id`.
    ///
    /// Waiters still blocked on it fail with [`SemError::Destroyed`]. Releasing
    /// a handle that is out of range or not live does nothing; a concurrent
    /// destroyer may simply have won.
    pub fn release<S: Scheduler>(&self, sched: &S, id: SemId) {
        let Some(index) = id.index(N) else {
            return;
        };
        let slot = &self.slots[index];
        {
            let _table = self.lock.lock();
            if slot.status() != SlotStatus::Live {
                return;
            }
            slot.set_status(SlotStatus::Retiring);
        }

        slot.sem.retire(sched);

        let _table = self.lock.lock();
        slot.set_status(SlotStatus::Free);
        log::debug!("released semaphore {id:?}");
    }

    /// Looks up the live semaphore named by `id`.
    pub fn resolve(&self, id: SemId) -> Result<&Semaphore, SemError> {
        let slot = id
            .index(N)
            .map(|index| &self.slots[index])
            .ok_or(SemError::InvalidHandle)?;
        if slot.status() == SlotStatus::Live {
            Ok(&slot.sem)
        } else {
            Err(SemError::InvalidHandle)
        }
    }

    pub fn wait_on<S: Scheduler>(&self, sched: &S, id: SemId) -> Result<(), SemError> {
        self.resolve(id)?.wait(sched)
    }

    pub fn post_on<S: Scheduler>(&self, sched: &S, id: SemId) -> Result<(), SemError> {
        self.resolve(id)?.post(sched)
    }

    /// Validates `id` and releases its slot.
    ///
    /// Callers must make sure nobody is still going to wait on or post to the
    /// semaphore; the table doesn't count its users.
    pub fn destroy<S: Scheduler>(&self, sched: &S, id: SemId) -> Result<(), SemError> {
        self.resolve(id)?;
        self.release(sched, id);
        Ok(())
    }

    pub fn value(&self, id: SemId) -> Result<u32, SemError> {
        Ok(self.resolve(id)?.value())
    }

    /// Number of live semaphores.
    pub fn live(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.status() == SlotStatus::Live)
            .count()
    }
}
