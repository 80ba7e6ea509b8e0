//! Observable key/value store shared by a page controller and its renderers.
//!
//! Every [`DataStore::set`] overwrites the stored value and then runs every
//! registered [`ChangeListener`] in registration order, whatever key changed.
//! Listeners receive a [`StoreView`] snapshot taken right after the write and
//! re-read the keys they care about. A listener that writes back into the
//! store it is being notified by gets [`StoreError::Reentrant`].

use std::{
    any::Any,
    collections::HashMap,
    fmt,
    marker::PhantomData,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError, RwLock,
    },
    thread::{self, ThreadId},
};

use thiserror::Error;
use tracing::{debug, warn};

pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

type StoredValue = Arc<dyn Any + Send + Sync>;

/// Name of a store slot together with the type kept in it.
pub struct StoreKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> StoreKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for StoreKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StoreKey<T> {}

impl<T> fmt::Debug for StoreKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StoreKey").field(&self.name).finish()
    }
}

pub trait ChangeListener: Send + Sync {
    fn on_change(&self, store: &StoreView) -> Result<(), ListenerError>;
}

impl<F> ChangeListener for F
where
    F: Fn(&StoreView) -> Result<(), ListenerError> + Send + Sync,
{
    fn on_change(&self, store: &StoreView) -> Result<(), ListenerError> {
        self(store)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The value was stored, but a listener failed and later listeners did
    /// not run.
    #[error("change listener #{index} failed after '{key}' was set: {source}")]
    Listener {
        key: &'static str,
        index: usize,
        #[source]
        source: ListenerError,
    },
    /// `set` was called from inside a listener of the same store. Nothing
    /// was written.
    #[error("'{key}' was set from inside a change listener")]
    Reentrant { key: &'static str },
}

/// Read-only snapshot handed to listeners during notification.
pub struct StoreView {
    values: HashMap<&'static str, StoredValue>,
}

impl StoreView {
    pub fn get<T>(&self, key: &StoreKey<T>) -> Option<T>
    where
        T: Any + Clone,
    {
        downcast(key, self.values.get(key.name()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

#[derive(Default)]
pub struct DataStore {
    values: RwLock<HashMap<&'static str, StoredValue>>,
    listeners: RwLock<Vec<Arc<dyn ChangeListener>>>,
    // held for the whole write-then-notify sequence
    writer: Mutex<()>,
    // thread currently running the notification pass
    notifying: Mutex<Option<ThreadId>>,
    notifications: AtomicU64,
}

struct NotifyingGuard<'a> {
    slot: &'a Mutex<Option<ThreadId>>,
}

impl<'a> NotifyingGuard<'a> {
    fn enter(slot: &'a Mutex<Option<ThreadId>>) -> Self {
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(thread::current().id());
        Self { slot }
    }
}

impl Drop for NotifyingGuard<'_> {
    fn drop(&mut self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` when the key was never set.
    pub fn get<T>(&self, key: &StoreKey<T>) -> Option<T>
    where
        T: Any + Clone,
    {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        downcast(key, values.get(key.name()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Overwrites `key` and synchronously notifies every listener.
    ///
    /// The first failing listener stops the notification pass and its error
    /// is returned. The new value stays stored either way.
    ///
    /// Calling `set` from one of this store's own listeners is rejected with
    /// [`StoreError::Reentrant`] and leaves the store untouched. Writers on
    /// other threads wait for the running pass to finish.
    pub fn set<T>(&self, key: &StoreKey<T>, value: T) -> Result<(), StoreError>
    where
        T: Any + Send + Sync,
    {
        if self.is_notifying_on_current_thread() {
            warn!(key = key.name(), "nested store write from a change listener rejected");
            return Err(StoreError::Reentrant { key: key.name() });
        }
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _notifying = NotifyingGuard::enter(&self.notifying);

        let view = {
            let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
            values.insert(key.name(), Arc::new(value));
            StoreView {
                values: values.clone(),
            }
        };
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        self.notifications.fetch_add(1, Ordering::SeqCst);
        debug!(key = key.name(), listeners = listeners.len(), "store value set");

        for (index, listener) in listeners.iter().enumerate() {
            if let Err(source) = listener.on_change(&view) {
                warn!(
                    key = key.name(),
                    index,
                    error = %source,
                    "change listener failed; skipping remaining listeners"
                );
                return Err(StoreError::Listener {
                    key: key.name(),
                    index,
                    source,
                });
            }
        }
        Ok(())
    }

    /// Appends a listener. The same listener may be added more than once.
    pub fn add_change_listener<L>(&self, listener: L)
    where
        L: ChangeListener + 'static,
    {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn is_notifying_on_current_thread(&self) -> bool {
        *self.notifying.lock().unwrap_or_else(PoisonError::into_inner)
            == Some(thread::current().id())
    }

    /// Number of `set` calls so far.
    pub fn notifications(&self) -> u64 {
        self.notifications.load(Ordering::SeqCst)
    }
}

fn downcast<T: Any + Clone>(key: &StoreKey<T>, value: Option<&StoredValue>) -> Option<T> {
    let value = value?;
    match value.downcast_ref::<T>() {
        Some(typed) => Some(typed.clone()),
        None => {
            warn!(
                key = key.name(),
                expected = std::any::type_name::<T>(),
                "store value has a different type than requested"
            );
            None
        }
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
