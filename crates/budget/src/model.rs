use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use finanzas_core::{
    CardId, DebtId, DomainError, DomainResult, Entity, ExpenseId, HouseholdId, Money, PaymentId,
};

/// Who an expense belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Owner {
    OwnerA,
    OwnerB,
    Shared,
}

/// A debt being paid down by the household.
///
/// Debts are never deleted; they are soft-settled when the balance reaches
/// zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    pub id: DebtId,
    pub name: String,
    pub owner_id: HouseholdId,
    pub original_balance: Money,
    pub current_balance: Money,
    /// Nominal annual rate, e.g. `24.0` for 24 %.
    pub annual_rate_percent: f64,
    pub minimum_payment: Money,
    /// Lower numbers are paid first.
    pub priority: i32,
    pub is_settled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settled_date: Option<NaiveDate>,
}

impl Entity for Debt {
    type Id = DebtId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Debt {
    /// New open debt with `current_balance == original_balance`.
    pub fn open(
        owner_id: HouseholdId,
        name: impl Into<String>,
        balance: Money,
        annual_rate_percent: f64,
        minimum_payment: Money,
        priority: i32,
    ) -> Self {
        Self {
            id: DebtId::new(),
            name: name.into(),
            owner_id,
            original_balance: balance,
            current_balance: balance,
            annual_rate_percent,
            minimum_payment,
            priority,
            is_settled: balance.is_zero(),
            settled_date: None,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("debt name must not be empty"));
        }
        if self.original_balance.is_negative() || self.current_balance.is_negative() {
            return Err(DomainError::validation(format!(
                "debt '{}' has a negative balance",
                self.name
            )));
        }
        if !(self.annual_rate_percent.is_finite() && self.annual_rate_percent >= 0.0) {
            return Err(DomainError::validation(format!(
                "debt '{}' has an invalid annual rate",
                self.name
            )));
        }
        if self.minimum_payment.is_negative() {
            return Err(DomainError::validation(format!(
                "debt '{}' has a negative minimum payment",
                self.name
            )));
        }
        if self.is_settled != self.current_balance.is_zero() {
            return Err(DomainError::invariant(format!(
                "debt '{}' settled flag disagrees with its balance",
                self.name
            )));
        }
        Ok(())
    }

    /// Still owes money.
    pub fn is_active(&self) -> bool {
        !self.is_settled && self.current_balance.is_positive()
    }

    pub fn amount_paid(&self) -> Money {
        self.original_balance.floor_sub(self.current_balance)
    }

    /// Share of the original balance already repaid, 0..=100.
    pub fn percent_paid(&self) -> f64 {
        match self.amount_paid().ratio_to(self.original_balance) {
            Some(r) => (r * 100.0).clamp(0.0, 100.0),
            None => 0.0,
        }
    }

    /// Apply one ledger entry, returning the updated debt.
    ///
    /// Overpayment floors the balance at zero and settles the debt.
    pub fn apply_payment(&self, payment: &DebtPayment) -> DomainResult<Debt> {
        if payment.debt_id != self.id {
            return Err(DomainError::invariant("payment belongs to a different debt"));
        }
        payment.validate()?;
        if self.is_settled {
            return Err(DomainError::validation(format!(
                "debt '{}' is already settled",
                self.name
            )));
        }

        let mut next = self.clone();
        next.current_balance = self.current_balance.floor_sub(payment.amount);
        if next.current_balance.is_zero() {
            next.is_settled = true;
            next.settled_date = Some(payment.date);
        }
        Ok(next)
    }

    /// Rebuild the balance from the full payment ledger.
    ///
    /// `current_balance = original_balance - Σ payments`, floored at zero.
    /// Payments for other debts are ignored.
    pub fn reconcile(&self, payments: &[DebtPayment]) -> Debt {
        let mut mine: Vec<&DebtPayment> = payments.iter().filter(|p| p.debt_id == self.id).collect();
        mine.sort_by_key(|p| p.date);

        let mut running = self.original_balance;
        let mut settled_on = None;
        for p in mine {
            running = running.floor_sub(p.amount);
            if running.is_zero() && settled_on.is_none() {
                settled_on = Some(p.date);
            }
        }

        let mut next = self.clone();
        next.current_balance = running;
        next.is_settled = running.is_zero();
        next.settled_date = if next.is_settled { settled_on } else { None };
        next
    }
}

/// A recorded expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: ExpenseId,
    pub date: NaiveDate,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub amount: Money,
    pub owner: Owner,
    #[serde(default)]
    pub is_fixed: bool,
    #[serde(default)]
    pub has_voucher: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<CardId>,
}

impl Entity for Expense {
    type Id = ExpenseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Expense {
    pub fn validate(&self) -> DomainResult<()> {
        if !self.amount.is_positive() {
            return Err(DomainError::validation("expense amount must be positive"));
        }
        if self.category.trim().is_empty() {
            return Err(DomainError::validation("expense category must not be empty"));
        }
        Ok(())
    }
}

/// Append-only payment ledger entry against a debt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtPayment {
    pub id: PaymentId,
    pub debt_id: DebtId,
    pub date: NaiveDate,
    pub amount: Money,
}

impl DebtPayment {
    pub fn new(debt_id: DebtId, date: NaiveDate, amount: Money) -> Self {
        Self {
            id: PaymentId::new(),
            debt_id,
            date,
            amount,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if !self.amount.is_positive() {
            return Err(DomainError::validation("payment amount must be positive"));
        }
        Ok(())
    }
}
