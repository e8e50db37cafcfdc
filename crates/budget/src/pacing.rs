//! Budget pacing: month-to-date variable spending against a linear ideal.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use finanzas_core::{DomainError, DomainResult, Money, format};

/// Pacing verdict, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacingStatus {
    Excellent,
    Good,
    Warning,
    Danger,
}

/// Offsets (in percentage points) added to the share of the month elapsed.
/// First row whose bound is not exceeded wins; anything above is `Danger`.
const PACING_LADDER: [(f64, PacingStatus); 3] = [
    (-10.0, PacingStatus::Excellent),
    (5.0, PacingStatus::Good),
    (20.0, PacingStatus::Warning),
];

impl PacingStatus {
    fn from_percentages(percent_used: f64, percent_elapsed: f64) -> Self {
        PACING_LADDER
            .iter()
            .find(|(offset, _)| percent_used <= percent_elapsed + offset)
            .map(|(_, status)| *status)
            .unwrap_or(PacingStatus::Danger)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PacingReport {
    pub status: PacingStatus,
    pub message: String,
    pub submessage: String,
    /// `budget - spent`, floored at zero.
    pub amount_remaining: Money,
    /// `spent - budget`, floored at zero.
    pub overage: Money,
    pub percent_used: f64,
    pub percent_of_month_elapsed: f64,
    pub ideal_spend_to_date: Money,
    /// Positive when under the ideal pace.
    pub difference: Money,
}

/// Classify month-to-date variable spending.
///
/// `day_of_month` must be within `1..=days_in_month` and `days_in_month`
/// within `28..=31`.
pub fn classify_pacing(
    variable_spent: Money,
    monthly_budget: Money,
    day_of_month: u32,
    days_in_month: u32,
) -> DomainResult<PacingReport> {
    if !monthly_budget.is_positive() {
        return Err(DomainError::validation(
            "InvalidBudget: monthly variable budget must be positive",
        ));
    }
    if variable_spent.is_negative() {
        return Err(DomainError::validation("variable spending must not be negative"));
    }
    if !(28..=31).contains(&days_in_month) {
        return Err(DomainError::validation(format!(
            "days in month must be between 28 and 31 (got {days_in_month})"
        )));
    }
    if !(1..=days_in_month).contains(&day_of_month) {
        return Err(DomainError::validation(format!(
            "day of month must be between 1 and {days_in_month} (got {day_of_month})"
        )));
    }

    let elapsed_fraction = day_of_month as f64 / days_in_month as f64;
    let ideal_spend_to_date = monthly_budget.scale(elapsed_fraction);
    let difference = ideal_spend_to_date - variable_spent;

    // Scale before dividing so round budgets land exactly on the ladder bounds.
    let percent_used = variable_spent.cents() as f64 * 100.0 / monthly_budget.cents() as f64;
    let percent_of_month_elapsed = day_of_month as f64 * 100.0 / days_in_month as f64;
    let status = PacingStatus::from_percentages(percent_used, percent_of_month_elapsed);

    let amount_remaining = monthly_budget.floor_sub(variable_spent);
    let overage = variable_spent.floor_sub(monthly_budget);
    let (message, submessage) = describe(status, difference, amount_remaining, overage, percent_used, day_of_month);

    Ok(PacingReport {
        status,
        message,
        submessage,
        amount_remaining,
        overage,
        percent_used,
        percent_of_month_elapsed,
        ideal_spend_to_date,
        difference,
    })
}

/// Same as [`classify_pacing`] with the day and month length taken from `today`.
pub fn classify_pacing_on(
    variable_spent: Money,
    monthly_budget: Money,
    today: NaiveDate,
) -> DomainResult<PacingReport> {
    let days = format::days_in_month(today.year(), today.month());
    classify_pacing(variable_spent, monthly_budget, today.day(), days)
}

fn describe(
    status: PacingStatus,
    difference: Money,
    remaining: Money,
    overage: Money,
    percent_used: f64,
    day: u32,
) -> (String, String) {
    let gap = format::currency(difference.abs());
    let used = format::percent(percent_used, 1);
    match status {
        PacingStatus::Excellent => (
            "¡Vas excelente!".to_string(),
            format!("Llevas {gap} menos de lo ideal para el día {day}."),
        ),
        PacingStatus::Good if difference.is_negative() => (
            "Vas bien".to_string(),
            format!("Llevas {gap} por encima del ritmo ideal, dentro del margen."),
        ),
        PacingStatus::Good => (
            "Vas bien".to_string(),
            format!("Llevas {gap} menos de lo ideal para el día {day}."),
        ),
        PacingStatus::Warning => (
            "Cuidado con el ritmo".to_string(),
            format!(
                "Llevas {gap} por encima del ritmo ideal ({used} del presupuesto). Te quedan {} este mes.",
                format::currency(remaining)
            ),
        ),
        PacingStatus::Danger if overage.is_positive() => (
            "Presupuesto excedido".to_string(),
            format!("Te pasaste del presupuesto por {}.", format::currency(overage)),
        ),
        PacingStatus::Danger => (
            "Ritmo de gasto muy alto".to_string(),
            format!(
                "Llevas {gap} por encima del ritmo ideal ({used} del presupuesto). Solo te quedan {}.",
                format::currency(remaining)
            ),
        ),
    }
}
