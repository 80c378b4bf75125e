use anyhow::anyhow;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::model::{Advertisement, AdvertisementId, NewAdvertisement};
use crate::store::traits::{Store, StoreError, StoreResult, StoreSession};

/// In-process store with the same session semantics as [`PostgresStore`].
///
/// Rows live behind a single mutex; sessions stage their writes and apply
/// them atomically on commit, rejecting the batch if two rows would share a
/// `(title, owner)` pair.
///
/// [`PostgresStore`]: crate::store::PostgresStore
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    counters: Arc<SessionCounters>,
    faults: Arc<Faults>,
}

#[derive(Debug, Default)]
struct Tables {
    rows: BTreeMap<AdvertisementId, Advertisement>,
    last_id: AdvertisementId,
}

#[derive(Debug, Default)]
struct SessionCounters {
    opened: AtomicUsize,
    closed: AtomicUsize,
    live: AtomicUsize,
}

#[derive(Debug, Default)]
struct Faults {
    unavailable: AtomicBool,
    fail_close: AtomicBool,
}

/// Snapshot of session bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub opened: usize,
    /// Sessions released through [`StoreSession::close`].
    pub closed: usize,
    /// Sessions not yet dropped.
    pub live: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_stats(&self) -> SessionStats {
        SessionStats {
            opened: self.counters.opened.load(Ordering::SeqCst),
            closed: self.counters.closed.load(Ordering::SeqCst),
            live: self.counters.live.load(Ordering::SeqCst),
        }
    }

    /// Number of committed rows.
    pub fn len(&self) -> usize {
        self.tables.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every session operation fail with a backend error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make `close` report a failure (the session is still released).
    pub fn set_close_failure(&self, fail: bool) {
        self.faults.fail_close.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    type Session = MemorySession;

    async fn open_session(&self) -> StoreResult<MemorySession> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        self.counters.live.fetch_add(1, Ordering::SeqCst);
        Ok(MemorySession {
            store: self.clone(),
            pending: Vec::new(),
        })
    }
}

#[derive(Debug, Clone)]
enum Pending {
    Insert(Advertisement),
    /// Applied only if the row still exists at commit time.
    Update(Advertisement),
    Delete(AdvertisementId),
}

pub struct MemorySession {
    store: MemoryStore,
    pending: Vec<Pending>,
}

impl MemorySession {
    fn ensure_available(&self) -> StoreResult<()> {
        if self.store.faults.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(anyhow!("memory store is unavailable")));
        }
        Ok(())
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.store.counters.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl StoreSession for MemorySession {
    async fn get(&mut self, id: AdvertisementId) -> StoreResult<Option<Advertisement>> {
        self.ensure_available()?;

        // Own staged writes win over committed state.
        for pending in self.pending.iter().rev() {
            match pending {
                Pending::Insert(adv) | Pending::Update(adv) if adv.id == id => {
                    return Ok(Some(adv.clone()))
                }
                Pending::Delete(deleted) if *deleted == id => return Ok(None),
                _ => {}
            }
        }

        Ok(self.store.tables.lock().rows.get(&id).cloned())
    }

    async fn add(&mut self, advertisement: NewAdvertisement) -> StoreResult<Advertisement> {
        self.ensure_available()?;

        // Ids are handed out like a sequence: a rolled back insert leaves a gap.
        let id = {
            let mut tables = self.store.tables.lock();
            tables.last_id += 1;
            tables.last_id
        };

        let adv = Advertisement {
            id,
            title: advertisement.title,
            description: advertisement.description,
            owner: advertisement.owner,
            created_at: chrono::Utc::now(),
        };
        self.pending.push(Pending::Insert(adv.clone()));
        Ok(adv)
    }

    async fn save(&mut self, advertisement: &Advertisement) -> StoreResult<bool> {
        if self.get(advertisement.id).await?.is_none() {
            return Ok(false);
        }
        self.pending.push(Pending::Update(advertisement.clone()));
        Ok(true)
    }

    async fn delete(&mut self, advertisement: &Advertisement) -> StoreResult<()> {
        self.ensure_available()?;
        self.pending.push(Pending::Delete(advertisement.id));
        Ok(())
    }

    async fn commit(&mut self) -> StoreResult<()> {
        self.ensure_available()?;
        let pending = std::mem::take(&mut self.pending);

        let mut tables = self.store.tables.lock();
        let mut candidate = tables.rows.clone();
        for change in pending {
            match change {
                Pending::Insert(adv) => {
                    candidate.insert(adv.id, adv);
                }
                Pending::Update(adv) => {
                    // A concurrent delete wins, as with an UPDATE matching no row.
                    if let Some(row) = candidate.get_mut(&adv.id) {
                        *row = adv;
                    }
                }
                Pending::Delete(id) => {
                    candidate.remove(&id);
                }
            }
        }

        let mut seen = HashSet::new();
        for adv in candidate.values() {
            if !seen.insert((adv.title.as_str(), adv.owner.as_str())) {
                return Err(StoreError::UniqueViolation(format!(
                    "duplicate (title, owner) = ({}, {})",
                    adv.title, adv.owner
                )));
            }
        }

        tables.rows = candidate;
        Ok(())
    }

    async fn close(self) -> StoreResult<()> {
        self.store.counters.closed.fetch_add(1, Ordering::SeqCst);
        if self.store.faults.fail_close.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(anyhow!("failed to release memory session")));
        }
        Ok(())
    }
}
