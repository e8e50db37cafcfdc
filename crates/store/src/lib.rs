//! Data access for the finance dashboard.
//!
//! - `remote`: the [`FinanceStore`] port over the hosted store.
//! - `in_memory` / `rest`: dev/test and PostgREST-backed implementations.
//! - `observer` / `watcher`: push-style snapshots of each collection.
//! - `kv`: fail-soft key/value storage for small preferences.

pub mod error;
pub mod in_memory;
pub mod kv;
pub mod observer;
pub mod remote;
pub mod rest;
pub mod watcher;

pub use error::{KvError, StoreError};
pub use in_memory::InMemoryFinanceStore;
pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, get_json, set_json};
pub use observer::{LiveCollections, LiveRegistry, Observers, Snapshot, SubscriptionHandle};
pub use remote::FinanceStore;
pub use rest::{RestConfig, RestFinanceStore};
pub use watcher::{CollectionWatcher, refresh_live};
