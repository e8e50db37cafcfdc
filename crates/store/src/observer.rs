//! Push-style collection snapshots (observer pattern).
//!
//! Each collection keeps its latest immutable [`Snapshot`] and a list of
//! listeners. Publishing a new snapshot calls every listener with it;
//! listeners never see a half-updated collection.
//!
//! ```ignore
//! let handle = live.debts.subscribe(|snap| render(snap.items()));
//! // ...
//! handle.unsubscribe(); // or just drop it
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use finanzas_budget::{Debt, DebtPayment, Expense};
use finanzas_core::HouseholdId;

/// Immutable view of a collection at a point in time.
#[derive(Debug)]
pub struct Snapshot<T> {
    version: u64,
    items: Arc<[T]>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            version: self.version,
            items: self.items.clone(),
        }
    }
}

impl<T> Snapshot<T> {
    fn empty() -> Self {
        Self {
            version: 0,
            items: Arc::from(Vec::new()),
        }
    }

    /// Incremented on every publish; 0 means nothing was published yet.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

type Listener<T> = Arc<dyn Fn(&Snapshot<T>) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    listeners: Vec<(u64, Listener<T>)>,
    latest: Snapshot<T>,
    /// Highest source revision accepted by `publish_revision`.
    source_revision: u64,
}

/// Listener registry for one collection.
///
/// Cloning is cheap and shares the same registry.
pub struct Observers<T> {
    inner: Arc<Mutex<Registry<T>>>,
}

impl<T> Clone for Observers<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for Observers<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                next_id: 1,
                listeners: Vec::new(),
                latest: Snapshot::empty(),
                source_revision: 0,
            })),
        }
    }
}

impl<T> Observers<T> {
    pub fn latest(&self) -> Snapshot<T> {
        match self.inner.lock() {
            Ok(reg) => reg.latest.clone(),
            Err(poisoned) => poisoned.into_inner().latest.clone(),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().map(|reg| reg.listeners.len()).unwrap_or(0)
    }
}

impl<T> core::fmt::Debug for Observers<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Observers")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<T> Observers<T>
where
    T: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `on_change`. It is called right away with the latest snapshot
    /// when one has been published, then on every later publish.
    pub fn subscribe<F>(&self, on_change: F) -> SubscriptionHandle
    where
        F: Fn(&Snapshot<T>) + Send + Sync + 'static,
    {
        let listener: Listener<T> = Arc::new(on_change);

        let (id, current) = match self.inner.lock() {
            Ok(mut reg) => {
                let id = reg.next_id;
                reg.next_id += 1;
                reg.listeners.push((id, listener.clone()));
                (id, reg.latest.clone())
            }
            // A poisoned registry still hands out a handle; it just never fires.
            Err(_) => return SubscriptionHandle::inert(),
        };

        if current.version > 0 {
            listener(&current);
        }

        let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.inner);
        SubscriptionHandle::new(move || {
            if let Some(inner) = weak.upgrade() {
                if let Ok(mut reg) = inner.lock() {
                    reg.listeners.retain(|(lid, _)| *lid != id);
                }
            }
        })
    }

    /// Replace the collection and notify listeners.
    pub fn publish(&self, items: Vec<T>) -> Snapshot<T> {
        let (snapshot, listeners) = self.install(items);
        notify(&snapshot, listeners);
        snapshot
    }

    /// Publish `items` read from the source at `revision`.
    ///
    /// Writers that release their own lock before publishing can race; a
    /// revision at or below the last accepted one is dropped so the
    /// snapshot sequence never steps back to older contents.
    pub fn publish_revision(&self, revision: u64, items: Vec<T>) -> bool {
        let installed = {
            let mut reg = match self.inner.lock() {
                Ok(reg) => reg,
                Err(poisoned) => poisoned.into_inner(),
            };
            if revision <= reg.source_revision {
                None
            } else {
                reg.source_revision = revision;
                Some(install_locked(&mut reg, items))
            }
        };
        match installed {
            Some((snapshot, listeners)) => {
                notify(&snapshot, listeners);
                true
            }
            None => false,
        }
    }

    fn install(&self, items: Vec<T>) -> (Snapshot<T>, Vec<Listener<T>>) {
        let mut reg = match self.inner.lock() {
            Ok(reg) => reg,
            Err(poisoned) => poisoned.into_inner(),
        };
        install_locked(&mut reg, items)
    }
}

fn install_locked<T: 'static>(reg: &mut Registry<T>, items: Vec<T>) -> (Snapshot<T>, Vec<Listener<T>>) {
    reg.latest = Snapshot {
        version: reg.latest.version + 1,
        items: Arc::from(items),
    };
    let listeners = reg.listeners.iter().map(|(_, l)| l.clone()).collect();
    (reg.latest.clone(), listeners)
}

// Called outside the registry lock so listeners may subscribe/unsubscribe.
fn notify<T: 'static>(snapshot: &Snapshot<T>, listeners: Vec<Listener<T>>) {
    for listener in listeners {
        listener(snapshot);
    }
}

impl<T> Observers<T>
where
    T: PartialEq + Send + Sync + 'static,
{
    /// Publish only when `items` differs from the latest snapshot (or nothing
    /// was published yet). Returns whether listeners were notified.
    pub fn publish_if_changed(&self, items: Vec<T>) -> bool {
        let latest = self.latest();
        if latest.version > 0 && latest.items() == items.as_slice() {
            return false;
        }
        self.publish(items);
        true
    }
}

/// Keeps a listener registered until dropped or [`unsubscribe`](Self::unsubscribe)d.
#[must_use = "dropping the handle unsubscribes immediately"]
pub struct SubscriptionHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionHandle {
    fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    fn inert() -> Self {
        Self { cancel: None }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl core::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// The three observable collections of one household.
#[derive(Debug, Clone, Default)]
pub struct LiveCollections {
    pub debts: Observers<Debt>,
    pub expenses: Observers<Expense>,
    pub payments: Observers<DebtPayment>,
}

/// Household -> live collections, created on first access.
#[derive(Debug, Default)]
pub struct LiveRegistry {
    inner: Mutex<HashMap<HouseholdId, LiveCollections>>,
}

impl LiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, household: HouseholdId) -> LiveCollections {
        match self.inner.lock() {
            Ok(mut map) => map.entry(household).or_default().clone(),
            Err(_) => LiveCollections::default(),
        }
    }
}
