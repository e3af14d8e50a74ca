//! In-memory session storage that forgets expired sessions and never holds
//! more than a fixed number of them.
//!
//! A result session carries the whole generated image, so the store has to
//! shed records rather than grow for the life of the process.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use time::OffsetDateTime;
use tower_sessions::SessionStore;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, ExpiredDeletion};
use tracing::debug;

#[derive(Clone, Debug)]
pub(crate) struct BoundedMemoryStore {
    records: Arc<Mutex<HashMap<Id, Record>>>,
    capacity: NonZeroUsize,
}

impl BoundedMemoryStore {
    pub(crate) fn new(capacity: NonZeroUsize) -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Id, Record>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    fn remove_expired(records: &mut HashMap<Id, Record>) -> usize {
        let now = OffsetDateTime::now_utc();
        let before = records.len();
        records.retain(|_, record| record.expiry_date > now);
        before - records.len()
    }

    /// Stores `record`, first dropping expired sessions and then, if still
    /// full, the ones closest to expiring.
    fn put(&self, record: &Record) {
        let mut records = self.lock();
        Self::remove_expired(&mut records);
        if !records.contains_key(&record.id) {
            while records.len() >= self.capacity.get() {
                let Some(oldest) = records
                    .values()
                    .min_by_key(|existing| existing.expiry_date)
                    .map(|existing| existing.id)
                else {
                    break;
                };
                debug!("Session store full, evicting the least recently active session");
                records.remove(&oldest);
            }
        }
        records.insert(record.id, record.clone());
    }
}

#[async_trait]
impl SessionStore for BoundedMemoryStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        {
            let records = self.lock();
            while records.contains_key(&record.id) {
                record.id = Id::default();
            }
        }
        self.put(record);
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.put(record);
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .lock()
            .get(session_id)
            .filter(|record| record.expiry_date > now)
            .cloned())
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.lock().remove(session_id);
        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for BoundedMemoryStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        let removed = Self::remove_expired(&mut self.lock());
        if removed > 0 {
            debug!("Removed {} expired sessions", removed);
        }
        Ok(())
    }
}
