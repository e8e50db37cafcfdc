//! Financial health score: weighted composite of ratios on a 0–100 scale.

use serde::{Deserialize, Serialize};

use finanzas_core::{DomainError, DomainResult, Money, format};

/// How a raw metric maps onto a 0–100 sub-score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Normalization {
    /// 100 at zero, 0 at `ceiling` and above (lower raw is better).
    Inverted { ceiling: f64 },
    /// 0 at zero, 100 at `target` and above (higher raw is better).
    Scaled { target: f64 },
    /// Raw value is already a 0–100 score.
    Direct,
}

impl Normalization {
    fn normalize(self, raw: f64) -> DomainResult<f64> {
        let value = match self {
            Normalization::Inverted { ceiling } => {
                if !(ceiling.is_finite() && ceiling > 0.0) {
                    return Err(DomainError::validation("inverted ceiling must be positive"));
                }
                100.0 * (1.0 - raw / ceiling)
            }
            Normalization::Scaled { target } => {
                if !(target.is_finite() && target > 0.0) {
                    return Err(DomainError::validation("scaled target must be positive"));
                }
                100.0 * raw / target
            }
            Normalization::Direct => raw,
        };
        Ok(value.clamp(0.0, 100.0))
    }
}

/// One weighted raw metric fed into the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthFactorInput {
    pub name: String,
    pub raw: f64,
    /// Relative weight in `[0, 1]`.
    pub weight: f64,
    pub normalization: Normalization,
}

impl HealthFactorInput {
    pub fn new(name: impl Into<String>, raw: f64, weight: f64, normalization: Normalization) -> Self {
        Self {
            name: name.into(),
            raw,
            weight,
            normalization,
        }
    }
}

/// A normalized factor as reported back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthFactor {
    pub name: String,
    /// Sub-score in `[0, 100]`.
    pub value: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthTier {
    Critical,
    Poor,
    Fair,
    Good,
    Excellent,
}

/// Minimum score for each tier, checked top-down.
const TIER_LADDER: [(u8, HealthTier); 4] = [
    (80, HealthTier::Excellent),
    (60, HealthTier::Good),
    (40, HealthTier::Fair),
    (20, HealthTier::Poor),
];

impl HealthTier {
    pub fn from_score(score: u8) -> Self {
        TIER_LADDER
            .iter()
            .find(|(min, _)| score >= *min)
            .map(|(_, tier)| *tier)
            .unwrap_or(HealthTier::Critical)
    }

    pub fn color(self) -> &'static str {
        match self {
            HealthTier::Excellent => "green",
            HealthTier::Good => "blue",
            HealthTier::Fair => "yellow",
            HealthTier::Poor => "orange",
            HealthTier::Critical => "red",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HealthTier::Excellent => "Excelente",
            HealthTier::Good => "Buena",
            HealthTier::Fair => "Regular",
            HealthTier::Poor => "Débil",
            HealthTier::Critical => "Crítica",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthScore {
    pub score: u8,
    pub tier: HealthTier,
    pub color: String,
    pub label: String,
    pub factors: Vec<HealthFactor>,
    /// Total debt as a percentage of annual income, two decimals.
    pub ratio_deuda_ingreso: String,
    pub total_debt: Money,
    pub monthly_income: Money,
    pub monthly_expenses: Money,
}

/// Aggregate weighted factors into a single score.
///
/// The score is the weighted mean of the normalized sub-scores, rounded to
/// the nearest integer and clamped to `[0, 100]`.
pub fn compute_health_score(
    total_debt: Money,
    monthly_income: Money,
    monthly_expenses: Money,
    factors: &[HealthFactorInput],
) -> DomainResult<HealthScore> {
    if !monthly_income.is_positive() {
        return Err(DomainError::validation(
            "InvalidIncome: monthly income must be positive",
        ));
    }
    if total_debt.is_negative() {
        return Err(DomainError::validation("total debt must not be negative"));
    }
    if monthly_expenses.is_negative() {
        return Err(DomainError::validation("monthly expenses must not be negative"));
    }

    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    let mut normalized = Vec::with_capacity(factors.len());

    for factor in factors {
        if !(factor.weight.is_finite() && (0.0..=1.0).contains(&factor.weight)) {
            return Err(DomainError::validation(format!(
                "factor '{}' weight must be within [0, 1]",
                factor.name
            )));
        }
        if !factor.raw.is_finite() {
            return Err(DomainError::validation(format!(
                "factor '{}' has a non-finite value",
                factor.name
            )));
        }

        let value = factor.normalization.normalize(factor.raw)?;
        weighted_sum += value * factor.weight;
        weight_total += factor.weight;
        normalized.push(HealthFactor {
            name: factor.name.clone(),
            value,
            weight: factor.weight,
        });
    }

    if weight_total <= 0.0 {
        return Err(DomainError::validation("factor weights must add up to more than zero"));
    }

    let score = (weighted_sum / weight_total).round().clamp(0.0, 100.0) as u8;
    let tier = HealthTier::from_score(score);

    Ok(HealthScore {
        score,
        tier,
        color: tier.color().to_string(),
        label: tier.label().to_string(),
        factors: normalized,
        ratio_deuda_ingreso: format::fixed(debt_to_annual_income(total_debt, monthly_income), 2),
        total_debt,
        monthly_income,
        monthly_expenses,
    })
}

/// The default factor set: debt load, spending ratio and savings rate.
pub fn standard_factors(
    total_debt: Money,
    monthly_income: Money,
    monthly_expenses: Money,
    monthly_debt_payments: Money,
) -> DomainResult<Vec<HealthFactorInput>> {
    if !monthly_income.is_positive() {
        return Err(DomainError::validation(
            "InvalidIncome: monthly income must be positive",
        ));
    }

    let spending_ratio = monthly_expenses.cents() as f64 * 100.0 / monthly_income.cents() as f64;
    let saved = monthly_income - monthly_expenses - monthly_debt_payments;
    let savings_rate = saved.cents() as f64 * 100.0 / monthly_income.cents() as f64;

    Ok(vec![
        HealthFactorInput::new(
            "Deuda / ingreso anual",
            debt_to_annual_income(total_debt, monthly_income),
            0.4,
            Normalization::Inverted { ceiling: 100.0 },
        ),
        HealthFactorInput::new(
            "Gasto / ingreso",
            spending_ratio,
            0.3,
            Normalization::Inverted { ceiling: 100.0 },
        ),
        HealthFactorInput::new(
            "Tasa de ahorro",
            savings_rate,
            0.3,
            Normalization::Scaled { target: 20.0 },
        ),
    ])
}

fn debt_to_annual_income(total_debt: Money, monthly_income: Money) -> f64 {
    total_debt.cents() as f64 * 100.0 / (monthly_income.cents() as f64 * 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tier_ladder_boundaries() {
        assert_eq!(HealthTier::from_score(100), HealthTier::Excellent);
        assert_eq!(HealthTier::from_score(80), HealthTier::Excellent);
        assert_eq!(HealthTier::from_score(79), HealthTier::Good);
        assert_eq!(HealthTier::from_score(60), HealthTier::Good);
        assert_eq!(HealthTier::from_score(59), HealthTier::Fair);
        assert_eq!(HealthTier::from_score(40), HealthTier::Fair);
        assert_eq!(HealthTier::from_score(39), HealthTier::Poor);
        assert_eq!(HealthTier::from_score(20), HealthTier::Poor);
        assert_eq!(HealthTier::from_score(19), HealthTier::Critical);
        assert_eq!(HealthTier::from_score(0), HealthTier::Critical);
    }

    #[test]
    fn weighted_mean_is_rounded() {
        let factors = vec![
            HealthFactorInput::new("a", 90.0, 0.5, Normalization::Direct),
            HealthFactorInput::new("b", 45.0, 0.5, Normalization::Direct),
        ];
        let hs = compute_health_score(Money::ZERO, Money::from_units(1_000), Money::ZERO, &factors).unwrap();
        // (90 + 45) / 2 = 67.5 -> 68
        assert_eq!(hs.score, 68);
        assert_eq!(hs.tier, HealthTier::Good);
        assert_eq!(hs.color, "blue");
        assert_eq!(hs.factors.len(), 2);
    }

    #[test]
    fn standard_factors_for_a_typical_household() {
        let income = Money::from_units(40_000);
        let debt = Money::from_units(200_000);
        let expenses = Money::from_units(24_000);
        let payments = Money::from_units(8_000);

        let factors = standard_factors(debt, income, expenses, payments).unwrap();
        let hs = compute_health_score(debt, income, expenses, &factors).unwrap();

        // debt/annual income = 41.67 % -> 58.33; spending 60 % -> 40; savings 20 % -> 100.
        assert_eq!(hs.ratio_deuda_ingreso, "41.67");
        assert!((hs.factors[0].value - 58.333).abs() < 1e-2);
        assert!((hs.factors[1].value - 40.0).abs() < 1e-9);
        assert!((hs.factors[2].value - 100.0).abs() < 1e-9);
        // 0.4*58.33 + 0.3*40 + 0.3*100 = 65.33
        assert_eq!(hs.score, 65);
        assert_eq!(hs.tier, HealthTier::Good);
    }

    #[test]
    fn non_positive_income_is_rejected() {
        let err = compute_health_score(Money::ZERO, Money::ZERO, Money::ZERO, &[]).unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("InvalidIncome")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(standard_factors(Money::ZERO, Money::from_units(-5), Money::ZERO, Money::ZERO).is_err());
    }

    #[test]
    fn invalid_weights_are_rejected() {
        let income = Money::from_units(1_000);
        let too_heavy = vec![HealthFactorInput::new("x", 10.0, 1.5, Normalization::Direct)];
        assert!(compute_health_score(Money::ZERO, income, Money::ZERO, &too_heavy).is_err());

        let weightless = vec![HealthFactorInput::new("x", 10.0, 0.0, Normalization::Direct)];
        assert!(compute_health_score(Money::ZERO, income, Money::ZERO, &weightless).is_err());
    }

    #[test]
    fn overspending_clamps_sub_scores_to_zero() {
        let income = Money::from_units(10_000);
        let factors = standard_factors(Money::from_units(500_000), income, Money::from_units(15_000), Money::ZERO).unwrap();
        let hs = compute_health_score(Money::from_units(500_000), income, Money::from_units(15_000), &factors).unwrap();
        assert!(hs.factors.iter().all(|f| f.value == 0.0));
        assert_eq!(hs.score, 0);
        assert_eq!(hs.tier, HealthTier::Critical);
        assert_eq!(hs.color, "red");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        #[test]
        fn score_is_bounded_and_idempotent(
            debt in 0i64..100_000_000i64,
            income in 1i64..10_000_000i64,
            expenses in 0i64..20_000_000i64,
            payments in 0i64..5_000_000i64,
        ) {
            let (debt, income, expenses, payments) = (
                Money::from_cents(debt),
                Money::from_cents(income),
                Money::from_cents(expenses),
                Money::from_cents(payments),
            );
            let factors = standard_factors(debt, income, expenses, payments).unwrap();
            let first = compute_health_score(debt, income, expenses, &factors).unwrap();
            let second = compute_health_score(debt, income, expenses, &factors).unwrap();
            prop_assert!(first.score <= 100);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.tier, HealthTier::from_score(first.score));
        }
    }
}
