//! Per-owner serialization of ledger mutations.
//!
//! Read-check-write sequences on one owner's ledger (bank, apply) must not
//! interleave. Different owners never contend. A slot lives only while some
//! caller holds or waits for it, so the registry stays as small as the set of
//! owners currently in flight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use fueleu_core::RouteId;

type Slots = HashMap<RouteId, Arc<AsyncMutex<()>>>;

#[derive(Debug, Default)]
pub struct OwnerLocks {
    slots: Mutex<Slots>,
}

impl OwnerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `owner`'s ledger. Released on drop.
    pub async fn lock(&self, owner: &RouteId) -> OwnerGuard<'_> {
        let slot = self.slots().entry(owner.clone()).or_default().clone();
        OwnerGuard {
            locks: self,
            owner: owner.clone(),
            held: Some(slot.lock_owned().await),
        }
    }

    /// Number of owners currently holding or waiting for a lock.
    pub fn tracked(&self) -> usize {
        self.slots().len()
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        // A poisoned registry still holds valid mutexes.
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Exclusive access to one owner's ledger.
#[derive(Debug)]
pub struct OwnerGuard<'a> {
    locks: &'a OwnerLocks,
    owner: RouteId,
    held: Option<OwnedMutexGuard<()>>,
}

impl Drop for OwnerGuard<'_> {
    fn drop(&mut self) {
        drop(self.held.take());
        let mut slots = self.locks.slots();
        // Only the registry's own reference left: nobody holds or waits.
        if slots
            .get(&self.owner)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&self.owner);
        }
    }
}
