use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use finanzas_budget::{Debt, DebtPayment, Expense};
use finanzas_core::{DomainError, Entity, HouseholdId};

use crate::error::StoreError;
use crate::observer::{LiveCollections, LiveRegistry};
use crate::remote::FinanceStore;

#[derive(Debug, Default, Clone)]
struct Tables {
    debts: Vec<Debt>,
    expenses: Vec<Expense>,
    payments: Vec<DebtPayment>,
    /// Bumped on every mutation; stamps the snapshots handed to observers.
    revision: u64,
}

impl Tables {
    fn bump(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }
}

/// Household-isolated store for tests/dev. Every mutation republishes the
/// affected collection to its live observers.
#[derive(Debug, Default)]
pub struct InMemoryFinanceStore {
    tables: Mutex<HashMap<HouseholdId, Tables>>,
    live: LiveRegistry,
}

impl InMemoryFinanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a debt directly (debts are created outside the dashboard).
    pub fn seed_debt(&self, household: HouseholdId, debt: Debt) -> Result<Debt, StoreError> {
        debt.validate()?;
        let (revision, debts) = self.with_tables(household, |t| {
            t.debts.push(debt.clone());
            (t.bump(), t.debts.clone())
        })?;
        self.live.get(household).debts.publish_revision(revision, debts);
        Ok(debt)
    }

    fn with_tables<R>(&self, household: HouseholdId, f: impl FnOnce(&mut Tables) -> R) -> Result<R, StoreError> {
        let mut map = self
            .tables
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))?;
        Ok(f(map.entry(household).or_default()))
    }

    fn read<R>(&self, household: HouseholdId, f: impl FnOnce(&Tables) -> R) -> Result<R, StoreError> {
        let map = self
            .tables
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))?;
        Ok(match map.get(&household) {
            Some(tables) => f(tables),
            None => f(&Tables::default()),
        })
    }
}

#[async_trait]
impl FinanceStore for InMemoryFinanceStore {
    async fn debts(&self, household: HouseholdId) -> Result<Vec<Debt>, StoreError> {
        self.read(household, |t| t.debts.clone())
    }

    async fn expenses(&self, household: HouseholdId) -> Result<Vec<Expense>, StoreError> {
        self.read(household, |t| t.expenses.clone())
    }

    async fn payments(&self, household: HouseholdId) -> Result<Vec<DebtPayment>, StoreError> {
        self.read(household, |t| t.payments.clone())
    }

    async fn insert_expense(&self, household: HouseholdId, expense: Expense) -> Result<Expense, StoreError> {
        expense.validate()?;
        let (revision, expenses) = self.with_tables(household, |t| {
            t.expenses.push(expense.clone());
            (t.bump(), t.expenses.clone())
        })?;
        self.live.get(household).expenses.publish_revision(revision, expenses);
        Ok(expense)
    }

    async fn record_payment(&self, household: HouseholdId, payment: DebtPayment) -> Result<Debt, StoreError> {
        let outcome = self.with_tables(household, |t| {
            let Some(slot) = t.debts.iter_mut().find(|d| *d.id() == payment.debt_id) else {
                return Err(DomainError::not_found(format!("debt {}", payment.debt_id)));
            };
            let updated = slot.apply_payment(&payment)?;
            *slot = updated.clone();
            t.payments.push(payment.clone());
            Ok((t.bump(), updated, t.debts.clone(), t.payments.clone()))
        })?;
        let (revision, updated, debts, payments) = outcome?;

        // Published after the table lock is released so listeners may read
        // the store; the revision keeps a slower writer from going backwards.
        let live = self.live.get(household);
        live.payments.publish_revision(revision, payments);
        live.debts.publish_revision(revision, debts);
        Ok(updated)
    }

    fn live(&self, household: HouseholdId) -> LiveCollections {
        self.live.get(household)
    }
}
