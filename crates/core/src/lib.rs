//! `finanzas-core` — shared building blocks for the household finance domain.
//!
//! This crate contains **pure** primitives (no IO): identifiers, the money
//! value object, display formatting and the domain error model.

pub mod entity;
pub mod error;
pub mod format;
pub mod id;
pub mod money;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CardId, DebtId, ExpenseId, HouseholdId, PaymentId};
pub use money::Money;
pub use value_object::ValueObject;
