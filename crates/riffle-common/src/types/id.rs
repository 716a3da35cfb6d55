//! Identifier types for graph elements.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a vertex in the graph.
///
/// Vertex IDs are dense non-negative integers assigned on first mention and
/// never reused. Deleting edges does not reclaim vertex IDs.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[repr(transparent)]
pub struct VertexId(pub u32);

impl VertexId {
    /// Creates a new VertexId from a raw u32 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw u32 value.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VertexId({})", self.0)
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for VertexId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<VertexId> for u32 {
    fn from(id: VertexId) -> Self {
        id.0
    }
}

/// Unique identifier for an edge in the graph.
///
/// Edge IDs are assigned on insertion and stay stable until the edge is
/// deleted.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[repr(transparent)]
pub struct EdgeId(pub u32);

impl EdgeId {
    /// Creates a new EdgeId from a raw u32 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw u32 value.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for EdgeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<EdgeId> for u32 {
    fn from(id: EdgeId) -> Self {
        id.0
    }
}

/// Interned identifier for an edge type or property key.
///
/// Type IDs are small non-negative integers handed out by the registry in
/// insertion order. [`TypeId::ANY`] is a distinguished sentinel: as a filter
/// it matches every type, and on a stored adjacency entry it marks an edge
/// created without a type.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct TypeId(pub u16);

impl TypeId {
    /// The wildcard sentinel that matches any type during adjacency
    /// filtering.
    pub const ANY: Self = Self(u16::MAX);

    /// Creates a new TypeId from a raw u16 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw u16 value.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns `true` if this is the wildcard sentinel.
    #[inline]
    #[must_use]
    pub const fn is_any(self) -> bool {
        self.0 == u16::MAX
    }

    /// Returns `true` if this filter accepts an entry tagged with `other`.
    ///
    /// A wildcard filter accepts everything; a concrete filter accepts only
    /// an exact match.
    #[inline]
    #[must_use]
    pub const fn matches(self, other: Self) -> bool {
        self.is_any() || self.0 == other.0
    }
}

impl Default for TypeId {
    fn default() -> Self {
        Self::ANY
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            write!(f, "TypeId(ANY)")
        } else {
            write!(f, "TypeId({})", self.0)
        }
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            write!(f, "ANY")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<u16> for TypeId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_id_basic() {
        let id = VertexId::new(42);
        assert_eq!(id.as_u32(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_vertex_id_ordering() {
        assert!(VertexId::new(1) < VertexId::new(2));
    }

    #[test]
    fn test_edge_id_basic() {
        let id = EdgeId::new(100);
        assert_eq!(id.as_u32(), 100);
    }

    #[test]
    fn test_type_id_any_matches_everything() {
        let follows = TypeId::new(0);
        let likes = TypeId::new(1);

        assert!(TypeId::ANY.matches(follows));
        assert!(TypeId::ANY.matches(likes));
        assert!(TypeId::ANY.matches(TypeId::ANY));
    }

    #[test]
    fn test_concrete_type_id_matches_exactly() {
        let follows = TypeId::new(0);
        let likes = TypeId::new(1);

        assert!(follows.matches(follows));
        assert!(!follows.matches(likes));
        // An untyped entry is tagged ANY and must not satisfy a typed filter.
        assert!(!follows.matches(TypeId::ANY));
    }

    #[test]
    fn test_conversions() {
        let vertex_id: VertexId = 42u32.into();
        let raw: u32 = vertex_id.into();
        assert_eq!(raw, 42);

        let edge_id: EdgeId = 7u32.into();
        let raw: u32 = edge_id.into();
        assert_eq!(raw, 7);
    }
}
