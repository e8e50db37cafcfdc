//! Display formatting for money, percentages and calendar months.
//!
//! User-facing text is Spanish (`es-MX` conventions: `$15,000.00`,
//! `"marzo 2027"`).

use chrono::{Datelike, NaiveDate};

use crate::money::Money;

const MONTHS_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// `$15,000.00` / `-$1,250.50`.
pub fn currency(amount: Money) -> String {
    let cents = amount.cents();
    let negative = cents < 0;
    let abs = cents.unsigned_abs();
    let whole = group_thousands(abs / 100);
    let frac = abs % 100;

    if negative {
        format!("-${whole}.{frac:02}")
    } else {
        format!("${whole}.{frac:02}")
    }
}

/// `46.7%` with the requested number of decimals.
pub fn percent(value: f64, decimals: usize) -> String {
    format!("{}%", fixed(value, decimals))
}

/// Fixed-precision decimal string. Non-finite values render as `0`.
pub fn fixed(value: f64, decimals: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let rendered = format!("{value:.decimals$}");
    // Avoid "-0.00" for tiny negatives that round to zero.
    let negative_zero = rendered.starts_with('-')
        && rendered
            .trim_start_matches(|c: char| c == '-' || c == '0' || c == '.')
            .is_empty();
    if negative_zero {
        rendered[1..].to_string()
    } else {
        rendered
    }
}

/// Spanish month label, e.g. `"marzo 2027"`.
pub fn month_label(date: NaiveDate) -> String {
    let name = MONTHS_ES[date.month0() as usize];
    format!("{name} {}", date.year())
}

/// `YYYY-MM` key used to bucket records by calendar month.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Number of days in the given calendar month (28..=31). Returns 0 for an
/// invalid month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return 0;
    };
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match next {
        Some(next) => (next - first).num_days() as u32,
        None => 0,
    }
}

fn group_thousands(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut groups: Vec<String> = Vec::new();
    while n >= 1000 {
        groups.push(format!("{:03}", n % 1000));
        n /= 1000;
    }
    groups.push(n.to_string());
    groups.reverse();
    groups.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(currency(Money::from_units(15_000)), "$15,000.00");
        assert_eq!(currency(Money::from_cents(-125_050)), "-$1,250.50");
        assert_eq!(currency(Money::from_cents(5)), "$0.05");
        assert_eq!(currency(Money::from_units(1_234_567)), "$1,234,567.00");
        assert_eq!(currency(Money::ZERO), "$0.00");
    }

    #[test]
    fn percent_and_fixed() {
        assert_eq!(percent(46.666, 1), "46.7%");
        assert_eq!(fixed(41.6666, 2), "41.67");
        assert_eq!(fixed(-0.001, 2), "0.00");
        assert_eq!(fixed(f64::NAN, 1), "0.0");
    }

    #[test]
    fn month_helpers() {
        let d = NaiveDate::from_ymd_opt(2027, 3, 18).unwrap();
        assert_eq!(month_label(d), "marzo 2027");
        assert_eq!(month_key(d), "2027-03");
        assert_eq!(month_start(d), NaiveDate::from_ymd_opt(2027, 3, 1).unwrap());
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2025, 12), 31);
        assert_eq!(days_in_month(2025, 4), 30);
        assert_eq!(days_in_month(2025, 13), 0);
    }
}
