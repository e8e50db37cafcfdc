//! Debt payoff projection with and without an extra monthly payment.
//!
//! Model (per simulated month):
//! - Accrue interest on every open balance: `balance * annual_rate / 100 / 12`,
//!   rounded to cents.
//! - Pay each open debt its minimum (capped at the balance), in payoff order.
//! - Pour whatever is left of the monthly budget into the first open debt in
//!   payoff order, cascading into the next one when it reaches zero.
//!
//! The monthly budget stays constant for the whole run (sum of the starting
//! minimums, plus the extra amount). Minimums freed by settled debts
//! therefore roll into the snowball automatically.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use finanzas_core::{DebtId, DomainError, DomainResult, Money, format};

use crate::model::Debt;

/// Safety bound on simulated months (50 years).
pub const DEFAULT_MAX_MONTHS: u32 = 600;

/// Ordering applied among debts that share the same `priority`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoffStrategy {
    /// Smallest balance first.
    #[default]
    Snowball,
    /// Highest interest rate first.
    Avalanche,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationOptions {
    pub strategy: PayoffStrategy,
    pub max_months: u32,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            strategy: PayoffStrategy::default(),
            max_months: DEFAULT_MAX_MONTHS,
        }
    }
}

/// When a single debt is paid off in each run (months from today).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtPayoffProjection {
    pub debt_id: DebtId,
    pub name: String,
    pub months_without_extra: u32,
    pub months_with_extra: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub extra_amount: Money,
    /// Sum of minimum payments of the open debts.
    pub current_monthly_payment: Money,
    pub new_monthly_payment: Money,
    pub months_without_extra: u32,
    pub months_with_extra: u32,
    pub months_saved: u32,
    pub interest_saved: Money,
    pub total_interest_without_extra: Money,
    pub total_interest_with_extra: Money,
    pub payoff_date_without_extra: NaiveDate,
    pub payoff_date_with_extra: NaiveDate,
    pub payoff_label_without_extra: String,
    pub payoff_label_with_extra: String,
    pub strategy: PayoffStrategy,
    /// Debts in the order they are attacked.
    pub payoff_order: Vec<DebtPayoffProjection>,
}

#[derive(Debug, Clone)]
struct Account {
    id: DebtId,
    name: String,
    balance: i64,
    monthly_rate: f64,
    minimum: i64,
}

#[derive(Debug)]
struct RunOutcome {
    months: u32,
    total_interest: i64,
    paid_off_in: Vec<u32>,
}

/// Project payoff of `debts` with and without `extra` on top of the minimums.
///
/// Payoff dates are the first day of `today`'s month plus the month count.
pub fn simulate_extra_payment(
    debts: &[Debt],
    extra: Money,
    today: NaiveDate,
    options: &SimulationOptions,
) -> DomainResult<SimulationResult> {
    if extra.is_negative() {
        return Err(DomainError::validation(
            "InvalidInput: extra monthly payment must not be negative",
        ));
    }
    for debt in debts {
        debt.validate()?;
    }

    let accounts = payoff_order(debts, options.strategy);
    let current_monthly_payment = accounts
        .iter()
        .try_fold(Money::ZERO, |total, a| total.checked_add(Money::from_cents(a.minimum)))
        .ok_or_else(|| DomainError::validation("InvalidInput: minimum payments overflow"))?;
    let new_monthly_payment = current_monthly_payment
        .checked_add(extra)
        .ok_or_else(|| DomainError::validation("InvalidInput: extra monthly payment is too large"))?;

    let baseline = run(&accounts, current_monthly_payment.cents(), options.max_months)?;
    let boosted = run(&accounts, new_monthly_payment.cents(), options.max_months)?;

    let payoff_date_without_extra = add_months(today, baseline.months)?;
    let payoff_date_with_extra = add_months(today, boosted.months)?;

    let payoff_order = accounts
        .iter()
        .enumerate()
        .map(|(i, a)| DebtPayoffProjection {
            debt_id: a.id,
            name: a.name.clone(),
            months_without_extra: baseline.paid_off_in[i],
            months_with_extra: boosted.paid_off_in[i],
        })
        .collect();

    Ok(SimulationResult {
        extra_amount: extra,
        current_monthly_payment,
        new_monthly_payment,
        months_without_extra: baseline.months,
        months_with_extra: boosted.months,
        months_saved: baseline.months.saturating_sub(boosted.months),
        interest_saved: Money::from_cents(baseline.total_interest)
            .saturating_sub(Money::from_cents(boosted.total_interest)),
        total_interest_without_extra: Money::from_cents(baseline.total_interest),
        total_interest_with_extra: Money::from_cents(boosted.total_interest),
        payoff_label_without_extra: format::month_label(payoff_date_without_extra),
        payoff_label_with_extra: format::month_label(payoff_date_with_extra),
        payoff_date_without_extra,
        payoff_date_with_extra,
        strategy: options.strategy,
        payoff_order,
    })
}

/// Open debts sorted by priority, then by strategy, then by id.
fn payoff_order(debts: &[Debt], strategy: PayoffStrategy) -> Vec<Account> {
    let mut open: Vec<&Debt> = debts.iter().filter(|d| d.is_active()).collect();

    open.sort_by(|a, b| {
        let by_strategy = match strategy {
            PayoffStrategy::Snowball => a
                .current_balance
                .cmp(&b.current_balance)
                .then(b.annual_rate_percent.total_cmp(&a.annual_rate_percent)),
            PayoffStrategy::Avalanche => b
                .annual_rate_percent
                .total_cmp(&a.annual_rate_percent)
                .then(a.current_balance.cmp(&b.current_balance)),
        };
        a.priority
            .cmp(&b.priority)
            .then(by_strategy)
            .then(a.id.cmp(&b.id))
    });

    open.into_iter()
        .map(|d| Account {
            id: d.id,
            name: d.name.clone(),
            balance: d.current_balance.cents(),
            monthly_rate: d.annual_rate_percent / 100.0 / 12.0,
            minimum: d.minimum_payment.cents(),
        })
        .collect()
}

fn run(accounts: &[Account], monthly_budget: i64, max_months: u32) -> DomainResult<RunOutcome> {
    let mut balances: Vec<i64> = accounts.iter().map(|a| a.balance).collect();
    let mut paid_off_in = vec![0u32; accounts.len()];
    let mut total_interest: i64 = 0;
    let mut month: u32 = 0;

    while balances.iter().any(|b| *b > 0) {
        if month >= max_months {
            return Err(DomainError::convergence(format!(
                "SimulationDidNotConverge: debts not paid off within {max_months} months \
                 (monthly payment {} does not outpace interest)",
                format::currency(Money::from_cents(monthly_budget))
            )));
        }
        month += 1;

        for (balance, account) in balances.iter_mut().zip(accounts) {
            if *balance > 0 {
                let interest = (*balance as f64 * account.monthly_rate).round() as i64;
                // Saturate so a diverging run reaches the month cap instead of overflowing.
                *balance = balance.saturating_add(interest);
                total_interest = total_interest.saturating_add(interest);
            }
        }

        let mut available = monthly_budget;
        for (balance, account) in balances.iter_mut().zip(accounts) {
            if *balance > 0 {
                let pay = account.minimum.min(*balance).min(available);
                *balance -= pay;
                available -= pay;
            }
        }

        for balance in balances.iter_mut() {
            if available == 0 {
                break;
            }
            if *balance > 0 {
                let pay = (*balance).min(available);
                *balance -= pay;
                available -= pay;
            }
        }

        for (i, balance) in balances.iter().enumerate() {
            if *balance == 0 && paid_off_in[i] == 0 {
                paid_off_in[i] = month;
            }
        }
    }

    Ok(RunOutcome {
        months: month,
        total_interest,
        paid_off_in,
    })
}

fn add_months(today: NaiveDate, months: u32) -> DomainResult<NaiveDate> {
    format::month_start(today)
        .checked_add_months(Months::new(months))
        .ok_or_else(|| DomainError::invariant("payoff date out of calendar range"))
}
