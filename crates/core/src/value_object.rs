//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity: two quote line items with the same product,
/// quantity and price are interchangeable. They are immutable once built; to
/// "modify" one, build a new one.
///
/// ```ignore
/// let a = LineItem::new("Widget", 2, 10.0);
/// let b = LineItem::new("Widget", 2, 10.0);
/// assert_eq!(a, b);
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
