//! Standard collection type aliases for Riffle.
//!
//! Use these instead of direct HashMap/HashSet so hashing stays consistent
//! across the codebase.
//!
//! | Type | Use Case |
//! |------|----------|
//! | [`RiffleMap`] | Single-threaded hash map |
//! | [`RiffleSet`] | Single-threaded hash set |
//! | [`RiffleIndexMap`] | Insertion-order preserving map |
//! | [`RiffleIndexSet`] | Insertion-order preserving set |

use rustc_hash::FxBuildHasher;

/// Standard HashMap with FxHash (fast, non-cryptographic).
///
/// FxHash is optimized for the small integer and string keys that dominate
/// graph workloads.
pub type RiffleMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

/// Standard HashSet with FxHash.
pub type RiffleSet<T> = hashbrown::HashSet<T, FxBuildHasher>;

/// Ordered map preserving insertion order.
pub type RiffleIndexMap<K, V> = indexmap::IndexMap<K, V, FxBuildHasher>;

/// Ordered set preserving insertion order.
///
/// The registry relies on insertion indices being stable, which is exactly
/// what an index set provides.
pub type RiffleIndexSet<T> = indexmap::IndexSet<T, FxBuildHasher>;

/// Create a new empty [`RiffleMap`].
#[inline]
#[must_use]
pub fn riffle_map<K, V>() -> RiffleMap<K, V> {
    RiffleMap::with_hasher(FxBuildHasher)
}

/// Create a new [`RiffleMap`] with the specified capacity.
#[inline]
#[must_use]
pub fn riffle_map_with_capacity<K, V>(capacity: usize) -> RiffleMap<K, V> {
    RiffleMap::with_capacity_and_hasher(capacity, FxBuildHasher)
}

/// Create a new empty [`RiffleSet`].
#[inline]
#[must_use]
pub fn riffle_set<T>() -> RiffleSet<T> {
    RiffleSet::with_hasher(FxBuildHasher)
}

/// Create a new empty [`RiffleIndexSet`].
#[inline]
#[must_use]
pub fn riffle_index_set<T>() -> RiffleIndexSet<T> {
    RiffleIndexSet::with_hasher(FxBuildHasher)
}
