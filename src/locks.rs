// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! Per-entity exclusive locks.
//!
//! Status transitions are serialized per identity record and per
//! investigation. Cross-entity operations acquire locks in a fixed
//! global order (vault record before investigation) to prevent
//! deadlock, and no lock is held across disclosure or external-send
//! I/O: callers validate under the lock, release, perform the I/O,
//! then re-acquire and re-validate before committing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Registry of named exclusive locks, one per entity id.
#[derive(Default)]
pub struct EntityLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the lock for an entity id.
    pub fn entity(&self, id: &str) -> Arc<Mutex<()>> {
        let mut map = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        map.entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Acquire a guard on an entity lock, recovering from poisoning.
///
/// A poisoned per-entity mutex only means a previous holder panicked;
/// the serialized-transition invariant is unaffected since nothing was
/// committed without its audit entry.
pub fn hold(lock: &Arc<Mutex<()>>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}
