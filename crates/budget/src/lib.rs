//! Budgeting module: pacing, health scoring and debt payoff projection.
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns. Every
//! function here takes an immutable snapshot and returns a derived value that
//! is never stored.

pub mod health;
pub mod model;
pub mod pacing;
pub mod simulator;
pub mod summary;

pub use health::{
    HealthFactor, HealthFactorInput, HealthScore, HealthTier, Normalization, compute_health_score,
    standard_factors,
};
pub use model::{Debt, DebtPayment, Expense, Owner};
pub use pacing::{PacingReport, PacingStatus, classify_pacing, classify_pacing_on};
pub use simulator::{
    DebtPayoffProjection, PayoffStrategy, SimulationOptions, SimulationResult,
    simulate_extra_payment,
};
pub use summary::{MonthlySummary, monthly_summary, variable_spent_in_month};
