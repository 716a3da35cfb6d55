//! Versioned, type-tagged neighbor lists.
//!
//! One [`VersionedNeighbors`] exists per (vertex, direction). It holds the
//! committed entries plus the staged additions and deletions, and serves
//! every [`GraphVersion`] view by in-line filtering during iteration.

use riffle_common::types::{TypeId, VertexId};

use super::{GraphVersion, SortedIdList};

/// A neighbor list sorted by (neighbor, type).
///
/// Parallel arrays: `neighbors[i]` is adjacent under edge type `types[i]`.
/// The same neighbor may appear more than once with different types (the
/// graph is a multigraph), never twice with the same type.
#[derive(Clone, Debug, Default)]
pub(crate) struct TypedNeighborList {
    neighbors: Vec<VertexId>,
    types: Vec<TypeId>,
}

impl TypedNeighborList {
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Binary-searches for the exact (neighbor, type) entry.
    fn position(&self, neighbor: VertexId, edge_type: TypeId) -> Result<usize, usize> {
        self.indices()
            .collect::<Vec<usize>>()
            .binary_search_by(|&i| (self.neighbors[i], self.types[i]).cmp(&(neighbor, edge_type)))
    }

    fn indices(&self) -> std::ops::Range<usize> {
        0..self.neighbors.len()
    }

    /// Inserts an entry, returning `false` if it was already present.
    pub fn insert(&mut self, neighbor: VertexId, edge_type: TypeId) -> bool {
        match self.position(neighbor, edge_type) {
            Ok(_) => false,
            Err(pos) => {
                self.neighbors.insert(pos, neighbor);
                self.types.insert(pos, edge_type);
                true
            }
        }
    }

    /// Removes an entry, returning `false` if it was not present.
    pub fn remove(&mut self, neighbor: VertexId, edge_type: TypeId) -> bool {
        match self.position(neighbor, edge_type) {
            Ok(pos) => {
                self.neighbors.remove(pos);
                self.types.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    pub fn contains(&self, neighbor: VertexId, edge_type: TypeId) -> bool {
        self.position(neighbor, edge_type).is_ok()
    }

    /// The contiguous index range of entries for `neighbor`.
    fn neighbor_range(&self, neighbor: VertexId) -> std::ops::Range<usize> {
        let start = self.neighbors.partition_point(|&n| n < neighbor);
        let end = self.neighbors.partition_point(|&n| n <= neighbor);
        start..end
    }

    /// Returns `true` if any entry for `neighbor` passes the type filter.
    pub fn contains_neighbor(&self, neighbor: VertexId, filter: TypeId) -> bool {
        self.neighbor_range(neighbor)
            .any(|i| filter.matches(self.types[i]))
    }

    /// The edge types recorded for `neighbor`, ascending.
    pub fn types_of(&self, neighbor: VertexId) -> Vec<TypeId> {
        self.neighbor_range(neighbor)
            .map(|i| self.types[i])
            .collect()
    }

    /// Iterates (neighbor, type) entries in (neighbor, type) order.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, TypeId)> + '_ {
        self.neighbors.iter().copied().zip(self.types.iter().copied())
    }

    /// Removes and returns every entry.
    pub fn drain(&mut self) -> Vec<(VertexId, TypeId)> {
        let drained = self.iter().collect();
        self.neighbors.clear();
        self.types.clear();
        drained
    }
}

/// The committed and staged neighbor entries of one (vertex, direction).
#[derive(Clone, Debug, Default)]
pub(crate) struct VersionedNeighbors {
    /// Entries committed before the in-flight delta. Entries staged in
    /// `diff_minus` remain here until commit.
    pub permanent: TypedNeighborList,
    /// Entries staged for addition.
    pub diff_plus: TypedNeighborList,
    /// Entries staged for deletion; always a subset of `permanent` and
    /// disjoint from `diff_plus`.
    pub diff_minus: TypedNeighborList,
}

impl VersionedNeighbors {
    /// Walks the deduplicated, ascending neighbor IDs of a version view.
    pub fn for_each_neighbor(
        &self,
        version: GraphVersion,
        filter: TypeId,
        mut f: impl FnMut(VertexId),
    ) {
        let mut last: Option<VertexId> = None;
        let mut emit = |id: VertexId, f: &mut dyn FnMut(VertexId)| {
            if last != Some(id) {
                last = Some(id);
                f(id);
            }
        };

        match version {
            GraphVersion::Permanent => {
                for (n, t) in self.permanent.iter() {
                    if filter.matches(t) {
                        emit(n, &mut f);
                    }
                }
            }
            GraphVersion::DiffPlus => {
                for (n, t) in self.diff_plus.iter() {
                    if filter.matches(t) {
                        emit(n, &mut f);
                    }
                }
            }
            GraphVersion::DiffMinus => {
                for (n, t) in self.diff_minus.iter() {
                    if filter.matches(t) {
                        emit(n, &mut f);
                    }
                }
            }
            GraphVersion::Merged => {
                // Sorted two-way merge of the surviving permanent entries
                // and the staged additions; the two sides are disjoint per
                // entry but may share neighbor IDs across types.
                let mut perm = self
                    .permanent
                    .iter()
                    .filter(|&(n, t)| filter.matches(t) && !self.diff_minus.contains(n, t))
                    .peekable();
                let mut plus = self
                    .diff_plus
                    .iter()
                    .filter(|&(_, t)| filter.matches(t))
                    .peekable();
                loop {
                    match (perm.peek().copied(), plus.peek().copied()) {
                        (Some((a, _)), Some((b, _))) => {
                            if a <= b {
                                perm.next();
                                emit(a, &mut f);
                            } else {
                                plus.next();
                                emit(b, &mut f);
                            }
                        }
                        (Some((a, _)), None) => {
                            perm.next();
                            emit(a, &mut f);
                        }
                        (None, Some((b, _))) => {
                            plus.next();
                            emit(b, &mut f);
                        }
                        (None, None) => break,
                    }
                }
            }
        }
    }

    /// Materializes a version view into an owned sorted list.
    pub fn view(&self, version: GraphVersion, filter: TypeId) -> SortedIdList {
        let mut list = SortedIdList::with_capacity(self.view_len(version, filter));
        self.for_each_neighbor(version, filter, |id| list.push_ascending(id));
        list
    }

    /// Counts a version view without allocating.
    pub fn view_len(&self, version: GraphVersion, filter: TypeId) -> usize {
        let mut count = 0;
        self.for_each_neighbor(version, filter, |_| count += 1);
        count
    }

    /// Membership test against a version view.
    pub fn view_contains(&self, version: GraphVersion, filter: TypeId, id: VertexId) -> bool {
        match version {
            GraphVersion::Permanent => self.permanent.contains_neighbor(id, filter),
            GraphVersion::DiffPlus => self.diff_plus.contains_neighbor(id, filter),
            GraphVersion::DiffMinus => self.diff_minus.contains_neighbor(id, filter),
            GraphVersion::Merged => {
                self.permanent
                    .neighbor_range(id)
                    .any(|i| {
                        filter.matches(self.permanent.types[i])
                            && !self.diff_minus.contains(id, self.permanent.types[i])
                    })
                    || self.diff_plus.contains_neighbor(id, filter)
            }
        }
    }
}
