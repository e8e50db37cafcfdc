//! Port over the hosted document/relational store.
//!
//! Records are scoped by household. Implementations own IO only; domain
//! rules (validation, applying a payment to a debt) come from
//! `finanzas-budget` so every backend enforces the same invariants.

use std::sync::Arc;

use async_trait::async_trait;

use finanzas_budget::{Debt, DebtPayment, Expense};
use finanzas_core::HouseholdId;

use crate::error::StoreError;
use crate::observer::LiveCollections;

#[async_trait]
pub trait FinanceStore: Send + Sync {
    async fn debts(&self, household: HouseholdId) -> Result<Vec<Debt>, StoreError>;

    async fn expenses(&self, household: HouseholdId) -> Result<Vec<Expense>, StoreError>;

    async fn payments(&self, household: HouseholdId) -> Result<Vec<DebtPayment>, StoreError>;

    /// Validate and append an expense; returns the stored record.
    async fn insert_expense(&self, household: HouseholdId, expense: Expense) -> Result<Expense, StoreError>;

    /// Append a payment and update the debt it belongs to. Returns the
    /// updated debt.
    async fn record_payment(&self, household: HouseholdId, payment: DebtPayment) -> Result<Debt, StoreError>;

    /// Observable collections for `household`.
    fn live(&self, household: HouseholdId) -> LiveCollections;
}

#[async_trait]
impl<S> FinanceStore for Arc<S>
where
    S: FinanceStore + ?Sized,
{
    async fn debts(&self, household: HouseholdId) -> Result<Vec<Debt>, StoreError> {
        (**self).debts(household).await
    }

    async fn expenses(&self, household: HouseholdId) -> Result<Vec<Expense>, StoreError> {
        (**self).expenses(household).await
    }

    async fn payments(&self, household: HouseholdId) -> Result<Vec<DebtPayment>, StoreError> {
        (**self).payments(household).await
    }

    async fn insert_expense(&self, household: HouseholdId, expense: Expense) -> Result<Expense, StoreError> {
        (**self).insert_expense(household, expense).await
    }

    async fn record_payment(&self, household: HouseholdId, payment: DebtPayment) -> Result<Debt, StoreError> {
        (**self).record_payment(household, payment).await
    }

    fn live(&self, household: HouseholdId) -> LiveCollections {
        (**self).live(household)
    }
}
