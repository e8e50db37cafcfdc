//! Entity trait: records that keep their identity while their values change.

/// Entity marker + minimal interface.
///
/// Debts and expenses are entities: a debt with a new balance is still the
/// same debt.
pub trait Entity {
    /// Strongly-typed identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
