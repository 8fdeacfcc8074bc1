//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity and are compared by their attribute values.
/// In this workspace they cover things like stored attachment descriptors and
/// the client actions returned to the UI:
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Protocol {
///     number: String,
/// }
///
/// impl ValueObject for Protocol {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
