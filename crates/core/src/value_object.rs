//! Value object trait: equality by value, not identity.

/// Marker trait for immutable values compared by their attributes.
///
/// `Money` is the canonical example: two amounts of 1500 cents are the same
/// amount regardless of where they came from. "Changing" a value object means
/// building a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
