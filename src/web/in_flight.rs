//! Tracks which visitors have a generation running.
//!
//! Each running generation holds an [`InFlightGuard`]; dropping it (success,
//! failure, or the request future being dropped on disconnect) frees the slot.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone, Debug, Default)]
pub(crate) struct InFlight {
    active: Arc<Mutex<HashMap<String, Arc<AtomicBool>>>>,
}

impl InFlight {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<AtomicBool>>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_loading(&self, visitor: &str) -> bool {
        self.lock().contains_key(visitor)
    }

    /// Claims the visitor's slot, `None` if a generation is already running.
    pub(crate) fn try_acquire(&self, visitor: &str) -> Option<InFlightGuard> {
        let mut active = self.lock();
        if active.contains_key(visitor) {
            return None;
        }
        let abandoned = Arc::new(AtomicBool::new(false));
        active.insert(visitor.to_string(), abandoned.clone());
        Some(InFlightGuard {
            registry: self.clone(),
            visitor: visitor.to_string(),
            abandoned,
        })
    }

    /// Frees the visitor's slot and tells the running request its outcome is unwanted.
    pub(crate) fn abandon(&self, visitor: &str) -> bool {
        match self.lock().remove(visitor) {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug)]
pub(crate) struct InFlightGuard {
    registry: InFlight,
    visitor: String,
    abandoned: Arc<AtomicBool>,
}

impl InFlightGuard {
    pub(crate) fn is_abandoned(&self) -> bool {
        self.abandoned.load(Ordering::SeqCst)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut active = self.registry.lock();
        // only clear our own entry, a newer generation may have taken the slot
        if active
            .get(&self.visitor)
            .is_some_and(|flag| Arc::ptr_eq(flag, &self.abandoned))
        {
            active.remove(&self.visitor);
        }
    }
}
