//! The versioned in-memory graph.
//!
//! [`GraphStore`] is where edges actually live. It keeps one forward and one
//! backward adjacency index per vertex, each split into the committed
//! entries plus the staged additions and deletions of the in-flight delta,
//! so queries can range over any [`GraphVersion`] without copying.

mod adjacency;
mod sorted_list;
mod store;

pub use sorted_list::SortedIdList;
pub use store::GraphStore;

/// Direction of edge traversal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Along the edge, from source to destination.
    Forward,
    /// Against the edge, from destination to source.
    Backward,
}

impl Direction {
    /// Returns the opposite direction.
    #[inline]
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// The logical graph views that coexist between two commits.
///
/// `Permanent` is the committed graph; edges staged for deletion remain
/// logically present in it until [`GraphStore::commit`] runs. The two diff
/// views expose only the staged changes, and `Merged` is
/// `(Permanent ∪ DiffPlus) \ DiffMinus`, served by in-line filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GraphVersion {
    /// Edges committed before the current in-flight delta.
    Permanent,
    /// Edges staged for addition, not yet merged.
    DiffPlus,
    /// Edges staged for deletion, still present under `Permanent`.
    DiffMinus,
    /// The post-delta graph: permanent plus staged additions, minus staged
    /// deletions.
    Merged,
}
