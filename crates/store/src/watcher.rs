//! Polling bridge from a remote store to its live collections.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use finanzas_core::HouseholdId;

use crate::error::StoreError;
use crate::remote::FinanceStore;

/// Re-fetch every collection of `household` and publish the ones that
/// changed. Returns how many collections were republished.
pub async fn refresh_live(store: &dyn FinanceStore, household: HouseholdId) -> Result<usize, StoreError> {
    let live = store.live(household);
    let debts = store.debts(household).await?;
    let expenses = store.expenses(household).await?;
    let payments = store.payments(household).await?;

    let changed = [
        live.debts.publish_if_changed(debts),
        live.expenses.publish_if_changed(expenses),
        live.payments.publish_if_changed(payments),
    ]
    .into_iter()
    .filter(|c| *c)
    .count();
    Ok(changed)
}

/// Background task polling a store at a fixed interval.
///
/// The task is aborted when the watcher is dropped.
#[derive(Debug)]
pub struct CollectionWatcher {
    handle: JoinHandle<()>,
}

impl CollectionWatcher {
    /// Must be called from within a tokio runtime.
    pub fn spawn(store: Arc<dyn FinanceStore>, household: HouseholdId, interval: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match refresh_live(store.as_ref(), household).await {
                    Ok(0) => {}
                    Ok(changed) => debug!(%household, changed, "published refreshed collections"),
                    // Keep the last good snapshot; try again next tick.
                    Err(err) => warn!(%household, error = %err, "collection refresh failed"),
                }
            }
        });
        Self { handle }
    }

    /// Cancel the polling task. A refresh in flight is dropped at its next
    /// await point; dropping the watcher does the same.
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for CollectionWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::InMemoryFinanceStore;
    use crate::observer::LiveCollections;
    use async_trait::async_trait;
    use finanzas_budget::{Debt, DebtPayment, Expense};
    use finanzas_core::Money;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn refresh_publishes_only_changed_collections() {
        let store = InMemoryFinanceStore::new();
        let hh = HouseholdId::new();

        // First refresh publishes all three (nothing published yet).
        assert_eq!(refresh_live(&store, hh).await.unwrap(), 3);
        assert_eq!(refresh_live(&store, hh).await.unwrap(), 0);

        store
            .seed_debt(hh, Debt::open(hh, "Auto", Money::from_units(5_000), 12.0, Money::from_units(250), 2))
            .unwrap();
        // seed_debt already published; the refresh sees the same rows.
        assert_eq!(refresh_live(&store, hh).await.unwrap(), 0);
        assert_eq!(store.live(hh).debts.latest().len(), 1);
    }

    #[tokio::test]
    async fn watcher_publishes_on_first_tick() {
        let store: Arc<dyn FinanceStore> = Arc::new(InMemoryFinanceStore::new());
        let hh = HouseholdId::new();

        let watcher = CollectionWatcher::spawn(store.clone(), hh, Duration::from_millis(10));
        let live = store.live(hh);
        for _ in 0..50 {
            if live.expenses.latest().version() > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(live.expenses.latest().version(), 1);
        watcher.stop();
    }

    /// Counts full refreshes by counting debt reads.
    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryFinanceStore,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl FinanceStore for CountingStore {
        async fn debts(&self, household: HouseholdId) -> Result<Vec<Debt>, StoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.debts(household).await
        }
        async fn expenses(&self, household: HouseholdId) -> Result<Vec<Expense>, StoreError> {
            self.inner.expenses(household).await
        }
        async fn payments(&self, household: HouseholdId) -> Result<Vec<DebtPayment>, StoreError> {
            self.inner.payments(household).await
        }
        async fn insert_expense(&self, household: HouseholdId, expense: Expense) -> Result<Expense, StoreError> {
            self.inner.insert_expense(household, expense).await
        }
        async fn record_payment(&self, household: HouseholdId, payment: DebtPayment) -> Result<Debt, StoreError> {
            self.inner.record_payment(household, payment).await
        }
        fn live(&self, household: HouseholdId) -> LiveCollections {
            self.inner.live(household)
        }
    }

    #[tokio::test]
    async fn stopped_watcher_no_longer_polls() {
        let store = Arc::new(CountingStore::default());
        let watcher = CollectionWatcher::spawn(store.clone(), HouseholdId::new(), Duration::from_millis(5));
        for _ in 0..50 {
            if store.reads.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(store.reads.load(Ordering::SeqCst) > 0);

        watcher.stop();
        let after_stop = store.reads.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.reads.load(Ordering::SeqCst), after_stop);
    }
}
