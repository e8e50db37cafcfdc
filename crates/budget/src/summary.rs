//! Derived monthly figures (never persisted).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use finanzas_core::{Money, format};

use crate::model::{Debt, DebtPayment, Expense};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    /// `YYYY-MM`.
    pub month: String,
    pub label: String,
    pub income: Money,
    pub fixed_expenses: Money,
    pub variable_expenses: Money,
    pub debt_payments: Money,
    /// Income left after expenses and debt payments; may be negative.
    pub available: Money,
    pub remaining_debt: Money,
    /// Share of all original debt already repaid, 0..=100.
    pub percent_paid: f64,
}

fn same_month(date: NaiveDate, month: NaiveDate) -> bool {
    date.year() == month.year() && date.month() == month.month()
}

/// Variable (non-fixed) spending dated in the month containing `month`.
pub fn variable_spent_in_month(expenses: &[Expense], month: NaiveDate) -> Money {
    expenses
        .iter()
        .filter(|e| !e.is_fixed && same_month(e.date, month))
        .map(|e| e.amount)
        .sum()
}

pub fn monthly_summary(
    month: NaiveDate,
    income: Money,
    expenses: &[Expense],
    payments: &[DebtPayment],
    debts: &[Debt],
) -> MonthlySummary {
    let (fixed_expenses, variable_expenses) = expenses
        .iter()
        .filter(|e| same_month(e.date, month))
        .fold((Money::ZERO, Money::ZERO), |(fixed, variable), e| {
            if e.is_fixed {
                (fixed + e.amount, variable)
            } else {
                (fixed, variable + e.amount)
            }
        });

    let debt_payments: Money = payments
        .iter()
        .filter(|p| same_month(p.date, month))
        .map(|p| p.amount)
        .sum();

    let remaining_debt: Money = debts.iter().map(|d| d.current_balance).sum();
    let original: Money = debts.iter().map(|d| d.original_balance).sum();
    let percent_paid = original
        .floor_sub(remaining_debt)
        .ratio_to(original)
        .map(|r| (r * 100.0).clamp(0.0, 100.0))
        .unwrap_or(0.0);

    MonthlySummary {
        month: format::month_key(month),
        label: format::month_label(month),
        income,
        fixed_expenses,
        variable_expenses,
        debt_payments,
        available: income - fixed_expenses - variable_expenses - debt_payments,
        remaining_debt,
        percent_paid,
    }
}
