//! Document-store port.
//!
//! The hosted database is reduced to what the schedule repository needs: keyed
//! JSON documents in named collections, equality filters, and live queries.
//! [`MemoryStore`] is the in-process adapter used by tests and the CLI.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{Result, ScheduleError};

/// A stored document: its key plus a JSON object body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

/// Conjunction of `field == value` clauses. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    /// `active == true`, the soft-delete filter.
    pub fn active() -> Self {
        Self::new().where_eq("active", true)
    }

    /// A document missing a filtered field never matches.
    pub fn matches(&self, data: &Value) -> bool {
        self.clauses
            .iter()
            .all(|(field, expected)| data.get(field) == Some(expected))
    }
}

/// Callback receiving the full matching snapshot after every change.
///
/// A listener may write back into the store; that write is delivered after
/// the current call returns.
pub type Listener = Arc<dyn Fn(&[Document]) + Send + Sync>;

/// Handle for a live query. Dropping it unregisters the listener.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Unregister now instead of at drop.
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Create/read/update/delete/query/subscribe over named collections.
pub trait DocumentStore: Send + Sync {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>>;

    /// All documents whose `active` field is `true`.
    fn query_active(&self, collection: &str) -> Result<Vec<Document>> {
        self.query(collection, &Filter::active())
    }

    /// Insert or fully replace the document at `id`.
    fn upsert(&self, collection: &str, id: &str, data: Value) -> Result<()>;

    /// Read the documents matching `filter`, run `check` on them and, if it
    /// passes, write `data` at `id`. No other write to `collection` can land
    /// between the read and the write. `check` must not call back into the
    /// store.
    ///
    /// # Errors
    /// Whatever `check` returns; nothing is written in that case.
    fn upsert_checked(
        &self,
        collection: &str,
        filter: &Filter,
        id: &str,
        data: Value,
        check: &mut dyn FnMut(&[Document]) -> Result<()>,
    ) -> Result<()>;

    /// Set one top-level field on an existing document.
    ///
    /// # Errors
    /// Returns `ScheduleError::NotFound` if the document does not exist.
    fn update_field(&self, collection: &str, id: &str, field: &str, value: Value) -> Result<()>;

    /// Remove a document. Deleting a missing document is not an error.
    fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// Register a live query.
    ///
    /// The listener is called once with the current snapshot, then again after
    /// every write to `collection`, until the returned handle is dropped. Calls
    /// never overlap and arrive in write order. The last snapshot delivered
    /// always reflects the latest write, though a burst of writes may be
    /// folded into one snapshot.
    fn subscribe(&self, collection: &str, filter: Filter, listener: Listener)
        -> Result<Subscription>;
}

// ---------------------------------------------------------------------------
// In-memory adapter
// ---------------------------------------------------------------------------

type Collections = HashMap<String, BTreeMap<String, Value>>;

struct Registered {
    collection: String,
    filter: Filter,
    listener: Listener,
    /// Owed a fresh snapshot.
    dirty: bool,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: HashMap<u64, Registered>,
    /// Some thread is running [`MemoryStore::dispatch`].
    delivering: bool,
}

#[derive(Default)]
struct Inner {
    collections: RwLock<Collections>,
    listeners: Mutex<Registry>,
}

/// Thread-safe in-process [`DocumentStore`]. Clones share the same data.
///
/// Query results are ordered by document id. Listeners run on a writing
/// thread: if another thread is already delivering when a write or
/// subscription happens, that thread makes the delivery and the caller
/// returns without waiting for it.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions, across all collections.
    pub fn listener_count(&self) -> usize {
        self.registry().map(|r| r.entries.len()).unwrap_or(0)
    }

    fn registry(&self) -> Result<MutexGuard<'_, Registry>> {
        self.inner
            .listeners
            .lock()
            .map_err(|_| poisoned("listener registry"))
    }

    fn snapshot(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        let collections = self
            .inner
            .collections
            .read()
            .map_err(|_| poisoned("collections"))?;
        Ok(matching(&collections, collection, filter))
    }

    /// Mark every listener on `collection` as stale, then deliver.
    fn notify(&self, collection: &str) -> Result<()> {
        self.registry()?
            .entries
            .values_mut()
            .filter(|r| r.collection == collection)
            .for_each(|r| r.dirty = true);
        self.dispatch()
    }

    /// Deliver fresh snapshots to stale listeners until none are left.
    ///
    /// One thread delivers at a time. A thread that finds delivery already
    /// running leaves its marks for that thread and returns, so listeners can
    /// write back into the store without deadlocking. Each snapshot is taken
    /// after the listener's mark is cleared, so a write racing a delivery
    /// always causes one more.
    fn dispatch(&self) -> Result<()> {
        {
            let mut registry = self.registry()?;
            if registry.delivering {
                return Ok(());
            }
            registry.delivering = true;
        }
        let mut running = Delivering {
            inner: &self.inner,
            armed: true,
        };

        loop {
            let batch: Vec<(String, Filter, Listener)> = {
                let mut registry = self.registry()?;
                let batch: Vec<_> = registry
                    .entries
                    .values_mut()
                    .filter(|r| r.dirty)
                    .map(|r| {
                        r.dirty = false;
                        (r.collection.clone(), r.filter.clone(), Arc::clone(&r.listener))
                    })
                    .collect();
                if batch.is_empty() {
                    registry.delivering = false;
                    running.armed = false;
                    return Ok(());
                }
                batch
            };

            for (collection, filter, listener) in batch {
                let docs = self.snapshot(&collection, &filter)?;
                listener(&docs);
            }
        }
    }
}

/// Clears the `delivering` flag if a delivery ends early through an error or
/// a panicking listener.
struct Delivering<'a> {
    inner: &'a Inner,
    armed: bool,
}

impl Drop for Delivering<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut registry = self
                .inner
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            registry.delivering = false;
        }
    }
}

fn matching(collections: &Collections, collection: &str, filter: &Filter) -> Vec<Document> {
    collections
        .get(collection)
        .map(|docs| {
            docs.iter()
                .filter(|(_, data)| filter.matches(data))
                .map(|(id, data)| Document {
                    id: id.clone(),
                    data: data.clone(),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn poisoned(what: &str) -> ScheduleError {
    ScheduleError::Store(format!("{} lock poisoned", what))
}

impl DocumentStore for MemoryStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self
            .inner
            .collections
            .read()
            .map_err(|_| poisoned("collections"))?;

        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        self.snapshot(collection, filter)
    }

    fn upsert(&self, collection: &str, id: &str, data: Value) -> Result<()> {
        {
            let mut collections = self
                .inner
                .collections
                .write()
                .map_err(|_| poisoned("collections"))?;
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.to_string(), data);
        }
        trace!(collection, id, "upsert");
        self.notify(collection)
    }

    fn upsert_checked(
        &self,
        collection: &str,
        filter: &Filter,
        id: &str,
        data: Value,
        check: &mut dyn FnMut(&[Document]) -> Result<()>,
    ) -> Result<()> {
        {
            let mut collections = self
                .inner
                .collections
                .write()
                .map_err(|_| poisoned("collections"))?;
            check(&matching(&collections, collection, filter))?;
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.to_string(), data);
        }
        trace!(collection, id, "checked upsert");
        self.notify(collection)
    }

    fn update_field(&self, collection: &str, id: &str, field: &str, value: Value) -> Result<()> {
        {
            let mut collections = self
                .inner
                .collections
                .write()
                .map_err(|_| poisoned("collections"))?;
            let data = collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| ScheduleError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
            let object = data.as_object_mut().ok_or_else(|| {
                ScheduleError::Store(format!("{}/{} is not a JSON object", collection, id))
            })?;
            object.insert(field.to_string(), value);
        }
        trace!(collection, id, field, "update field");
        self.notify(collection)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let removed = {
            let mut collections = self
                .inner
                .collections
                .write()
                .map_err(|_| poisoned("collections"))?;
            collections
                .get_mut(collection)
                .and_then(|docs| docs.remove(id))
                .is_some()
        };
        trace!(collection, id, removed, "delete");
        if removed {
            self.notify(collection)?;
        }
        Ok(())
    }

    fn subscribe(
        &self,
        collection: &str,
        filter: Filter,
        listener: Listener,
    ) -> Result<Subscription> {
        let id = {
            let mut registry = self.registry()?;
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.insert(
                id,
                Registered {
                    collection: collection.to_string(),
                    filter,
                    listener,
                    dirty: true,
                },
            );
            id
        };
        debug!(collection, listener = id, "listener registered");

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let subscription = Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                if let Ok(mut registry) = inner.listeners.lock() {
                    registry.entries.remove(&id);
                    debug!(listener = id, "listener removed");
                }
            }
        });

        // The initial snapshot goes through the same queue as change
        // notifications, so it can never arrive after one of them.
        self.dispatch()?;
        Ok(subscription)
    }
}
