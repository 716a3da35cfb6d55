//! The versioned adjacency store.

use riffle_common::collections::{riffle_map, RiffleMap};
use riffle_common::types::{EdgeId, TypeId, Value, VertexId};
use riffle_common::utils::error::{Error, Result};

use super::adjacency::{TypedNeighborList, VersionedNeighbors};
use super::{Direction, GraphVersion, SortedIdList};

/// The in-memory graph: vertices, typed directed edges, properties, and the
/// forward/backward adjacency indexes that serve every version view.
///
/// Mutations are staged: [`add_edge`](Self::add_edge) and
/// [`delete_edge`](Self::delete_edge) only touch the diff lists, and
/// [`commit`](Self::commit) folds them into the permanent graph atomically.
/// Between the two, queries may range over [`GraphVersion::Permanent`],
/// the two diff views, or [`GraphVersion::Merged`].
///
/// The store keeps `FORWARD(u) ∋ v ⇔ BACKWARD(v) ∋ u` in every version by
/// mirroring every mutation; [`check_consistency`](Self::check_consistency)
/// verifies it.
#[derive(Debug, Default)]
pub struct GraphStore {
    /// Outgoing adjacency, indexed by vertex ID.
    forward: Vec<VersionedNeighbors>,
    /// Incoming adjacency, indexed by vertex ID.
    backward: Vec<VersionedNeighbors>,
    /// Vertex type tags; `TypeId::ANY` marks an untyped vertex.
    vertex_types: Vec<TypeId>,
    /// Vertex properties keyed by interned property-key ID.
    vertex_properties: RiffleMap<VertexId, RiffleMap<TypeId, Value>>,
    /// Edge properties keyed by interned property-key ID.
    edge_properties: RiffleMap<EdgeId, RiffleMap<TypeId, Value>>,
    /// (source, destination, type) to edge ID. Updated when staged
    /// additions are cancelled and when deletions commit.
    edge_ids: RiffleMap<(VertexId, VertexId, TypeId), EdgeId>,
    /// Next edge ID to hand out.
    next_edge_id: u32,
}

impl GraphStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            forward: Vec::new(),
            backward: Vec::new(),
            vertex_types: Vec::new(),
            vertex_properties: riffle_map(),
            edge_properties: riffle_map(),
            edge_ids: riffle_map(),
            next_edge_id: 0,
        }
    }

    /// Highest vertex ID mentioned so far, plus one.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.forward.len()
    }

    /// Grows the adjacency and type arrays to cover `vertex`.
    pub fn ensure_vertex(&mut self, vertex: VertexId) {
        let needed = vertex.as_u32() as usize + 1;
        if self.forward.len() < needed {
            self.forward.resize_with(needed, VersionedNeighbors::default);
            self.backward.resize_with(needed, VersionedNeighbors::default);
            self.vertex_types.resize(needed, TypeId::ANY);
        }
    }

    // === Mutation ===

    /// Stages an edge addition under DIFF_PLUS and returns its edge ID.
    ///
    /// If the same (source, destination, type) is staged for deletion, the
    /// deletion is cancelled instead and the existing ID is returned.
    /// Adding an edge that already exists is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Exhaustion`] when the edge ID space is exhausted.
    pub fn add_edge(&mut self, src: VertexId, dst: VertexId, edge_type: TypeId) -> Result<EdgeId> {
        self.ensure_vertex(src);
        self.ensure_vertex(dst);

        let key = (src, dst, edge_type);
        let fwd = &mut self.forward[src.as_u32() as usize];

        if fwd.diff_minus.contains(dst, edge_type) {
            // Re-adding a staged deletion cancels it.
            fwd.diff_minus.remove(dst, edge_type);
            self.backward[dst.as_u32() as usize]
                .diff_minus
                .remove(src, edge_type);
            return Ok(self.edge_ids[&key]);
        }
        if fwd.permanent.contains(dst, edge_type) || fwd.diff_plus.contains(dst, edge_type) {
            return Ok(self.edge_ids[&key]);
        }

        let id = EdgeId::new(self.next_edge_id);
        self.next_edge_id = self.next_edge_id.checked_add(1).ok_or(Error::Exhaustion {
            message: "edge ID space exhausted".to_string(),
        })?;

        self.forward[src.as_u32() as usize]
            .diff_plus
            .insert(dst, edge_type);
        self.backward[dst.as_u32() as usize]
            .diff_plus
            .insert(src, edge_type);
        self.edge_ids.insert(key, id);
        Ok(id)
    }

    /// Stages an edge deletion under DIFF_MINUS.
    ///
    /// A `TypeId::ANY` filter deletes every edge between the pair. Deleting
    /// an edge that is only staged for addition cancels the addition.
    /// Deleting a non-existent edge is a no-op. Returns how many edges were
    /// affected.
    pub fn delete_edge(&mut self, src: VertexId, dst: VertexId, edge_type: TypeId) -> usize {
        if self.forward.len() <= src.as_u32() as usize
            || self.backward.len() <= dst.as_u32() as usize
        {
            return 0;
        }

        if edge_type.is_any() {
            // Delete every parallel edge between the pair, including an
            // untyped one (whose entry is itself tagged ANY).
            let fwd = &self.forward[src.as_u32() as usize];
            let mut types = fwd.permanent.types_of(dst);
            types.extend(fwd.diff_plus.types_of(dst));
            types.sort_unstable();
            types.dedup();
            return types
                .into_iter()
                .map(|t| self.delete_exact(src, dst, t))
                .sum();
        }
        self.delete_exact(src, dst, edge_type)
    }

    /// Stages the deletion of the single edge whose entry tag is exactly
    /// `edge_type`.
    fn delete_exact(&mut self, src: VertexId, dst: VertexId, edge_type: TypeId) -> usize {
        let key = (src, dst, edge_type);
        let fwd = &mut self.forward[src.as_u32() as usize];

        if fwd.diff_plus.contains(dst, edge_type) {
            // Deleting a staged addition cancels it outright.
            fwd.diff_plus.remove(dst, edge_type);
            self.backward[dst.as_u32() as usize]
                .diff_plus
                .remove(src, edge_type);
            if let Some(id) = self.edge_ids.remove(&key) {
                self.edge_properties.remove(&id);
            }
            return 1;
        }
        if fwd.permanent.contains(dst, edge_type) && !fwd.diff_minus.contains(dst, edge_type) {
            fwd.diff_minus.insert(dst, edge_type);
            self.backward[dst.as_u32() as usize]
                .diff_minus
                .insert(src, edge_type);
            return 1;
        }
        0
    }

    /// Folds the staged delta into the permanent graph.
    ///
    /// Every DIFF_PLUS entry moves into PERMANENT and every DIFF_MINUS
    /// entry is removed, together with its edge ID and properties. Both
    /// diff sets end up empty; committing an empty delta is a no-op.
    pub fn commit(&mut self) {
        let mut added = 0usize;
        let mut removed = 0usize;

        for src in 0..self.forward.len() {
            let lists = &mut self.forward[src];
            for (dst, edge_type) in lists.diff_minus.drain() {
                lists.permanent.remove(dst, edge_type);
                let key = (VertexId::new(src as u32), dst, edge_type);
                if let Some(id) = self.edge_ids.remove(&key) {
                    self.edge_properties.remove(&id);
                }
                removed += 1;
            }
            for (dst, edge_type) in lists.diff_plus.drain() {
                lists.permanent.insert(dst, edge_type);
                added += 1;
            }
        }
        for lists in &mut self.backward {
            for (src, edge_type) in lists.diff_minus.drain() {
                lists.permanent.remove(src, edge_type);
            }
            for (src, edge_type) in lists.diff_plus.drain() {
                lists.permanent.insert(src, edge_type);
            }
        }

        if added > 0 || removed > 0 {
            tracing::debug!(added, removed, "committed graph delta");
        }
    }

    /// Returns `true` if any addition or deletion is staged.
    #[must_use]
    pub fn has_staged_changes(&self) -> bool {
        self.forward
            .iter()
            .any(|l| !l.diff_plus.is_empty() || !l.diff_minus.is_empty())
    }

    // === Adjacency views ===

    fn lists(&self, vertex: VertexId, direction: Direction) -> Option<&VersionedNeighbors> {
        let side = match direction {
            Direction::Forward => &self.forward,
            Direction::Backward => &self.backward,
        };
        side.get(vertex.as_u32() as usize)
    }

    /// The sorted neighbor IDs of `vertex` under a direction, version and
    /// type filter. A never-mentioned vertex has no neighbors.
    #[must_use]
    pub fn adjacency(
        &self,
        vertex: VertexId,
        direction: Direction,
        version: GraphVersion,
        type_filter: TypeId,
    ) -> SortedIdList {
        self.lists(vertex, direction)
            .map(|l| l.view(version, type_filter))
            .unwrap_or_default()
    }

    /// Size of an adjacency view, computed without materializing it.
    #[must_use]
    pub fn adjacency_len(
        &self,
        vertex: VertexId,
        direction: Direction,
        version: GraphVersion,
        type_filter: TypeId,
    ) -> usize {
        self.lists(vertex, direction)
            .map_or(0, |l| l.view_len(version, type_filter))
    }

    /// Membership test against an adjacency view.
    #[must_use]
    pub fn adjacency_contains(
        &self,
        vertex: VertexId,
        direction: Direction,
        version: GraphVersion,
        type_filter: TypeId,
        candidate: VertexId,
    ) -> bool {
        self.lists(vertex, direction)
            .is_some_and(|l| l.view_contains(version, type_filter, candidate))
    }

    /// Enumerates all (from, to) pairs of a version view in ascending
    /// (from, to) order, as seen from `direction`.
    ///
    /// For `Forward` the pairs are (source, destination); for `Backward`
    /// they are (destination, source). This seeds the executor's initial
    /// prefixes.
    #[must_use]
    pub fn all_edges(
        &self,
        direction: Direction,
        version: GraphVersion,
        type_filter: TypeId,
    ) -> Vec<(VertexId, VertexId)> {
        let side = match direction {
            Direction::Forward => &self.forward,
            Direction::Backward => &self.backward,
        };
        let mut edges = Vec::new();
        for (from, lists) in side.iter().enumerate() {
            lists.for_each_neighbor(version, type_filter, |to| {
                edges.push((VertexId::new(from as u32), to));
            });
        }
        edges
    }

    // === Vertex and edge metadata ===

    /// Tags a vertex with a type.
    pub fn set_vertex_type(&mut self, vertex: VertexId, vertex_type: TypeId) {
        self.ensure_vertex(vertex);
        self.vertex_types[vertex.as_u32() as usize] = vertex_type;
    }

    /// The type tag of a vertex; `TypeId::ANY` if untyped or unknown.
    #[must_use]
    pub fn vertex_type(&self, vertex: VertexId) -> TypeId {
        self.vertex_types
            .get(vertex.as_u32() as usize)
            .copied()
            .unwrap_or(TypeId::ANY)
    }

    /// Sets a vertex property.
    pub fn set_vertex_property(&mut self, vertex: VertexId, key: TypeId, value: Value) {
        self.ensure_vertex(vertex);
        self.vertex_properties
            .entry(vertex)
            .or_insert_with(riffle_map)
            .insert(key, value);
    }

    /// Reads a vertex property.
    #[must_use]
    pub fn vertex_property(&self, vertex: VertexId, key: TypeId) -> Option<&Value> {
        self.vertex_properties.get(&vertex)?.get(&key)
    }

    /// Sets an edge property.
    pub fn set_edge_property(&mut self, edge: EdgeId, key: TypeId, value: Value) {
        self.edge_properties
            .entry(edge)
            .or_insert_with(riffle_map)
            .insert(key, value);
    }

    /// Reads an edge property.
    #[must_use]
    pub fn edge_property(&self, edge: EdgeId, key: TypeId) -> Option<&Value> {
        self.edge_properties.get(&edge)?.get(&key)
    }

    /// Resolves (source, destination, type) to an edge ID.
    ///
    /// With a `TypeId::ANY` filter, the edge with the smallest type ID
    /// between the pair is returned.
    #[must_use]
    pub fn edge_id(&self, src: VertexId, dst: VertexId, edge_type: TypeId) -> Option<EdgeId> {
        if !edge_type.is_any() {
            return self.edge_ids.get(&(src, dst, edge_type)).copied();
        }
        let lists = self.lists(src, Direction::Forward)?;
        let mut types = lists.permanent.types_of(dst);
        types.extend(lists.diff_plus.types_of(dst));
        types.sort_unstable();
        types
            .into_iter()
            .find_map(|t| self.edge_ids.get(&(src, dst, t)).copied())
    }

    /// Verifies the forward/backward mirror invariant across all versions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Inconsistency`] naming the first disagreeing pair.
    pub fn check_consistency(&self) -> Result<()> {
        type ListOf = for<'a> fn(&'a VersionedNeighbors) -> &'a TypedNeighborList;
        let views: [(ListOf, &str); 3] = [
            (|l| &l.permanent, "PERMANENT"),
            (|l| &l.diff_plus, "DIFF_PLUS"),
            (|l| &l.diff_minus, "DIFF_MINUS"),
        ];

        for (src, lists) in self.forward.iter().enumerate() {
            let src_id = VertexId::new(src as u32);
            for (list_of, name) in views {
                for (dst, edge_type) in list_of(lists).iter() {
                    let mirrored = self
                        .backward
                        .get(dst.as_u32() as usize)
                        .is_some_and(|b| list_of(b).contains(src_id, edge_type));
                    if !mirrored {
                        return Err(Error::Inconsistency {
                            message: format!(
                                "forward {name} edge {src_id}->{dst} has no backward mirror"
                            ),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANY: TypeId = TypeId::ANY;

    fn v(id: u32) -> VertexId {
        VertexId::new(id)
    }

    fn ids(list: &SortedIdList) -> Vec<u32> {
        list.iter().map(VertexId::as_u32).collect()
    }

    fn store_with_edges(edges: &[(u32, u32)]) -> GraphStore {
        let mut store = GraphStore::new();
        for &(s, d) in edges {
            store.add_edge(v(s), v(d), ANY).unwrap();
        }
        store.commit();
        store
    }

    #[test]
    fn test_add_commit_and_views() {
        let mut store = GraphStore::new();
        store.add_edge(v(0), v(1), ANY).unwrap();
        store.add_edge(v(0), v(2), ANY).unwrap();

        // Staged edges are visible in DIFF_PLUS and MERGED but not PERMANENT.
        let fwd = |st: &GraphStore, ver| st.adjacency(v(0), Direction::Forward, ver, ANY);
        assert!(fwd(&store, GraphVersion::Permanent).is_empty());
        assert_eq!(ids(&fwd(&store, GraphVersion::DiffPlus)), vec![1, 2]);
        assert_eq!(ids(&fwd(&store, GraphVersion::Merged)), vec![1, 2]);

        store.commit();
        assert_eq!(ids(&fwd(&store, GraphVersion::Permanent)), vec![1, 2]);
        assert!(fwd(&store, GraphVersion::DiffPlus).is_empty());
        assert!(store.check_consistency().is_ok());
    }

    #[test]
    fn test_backward_mirrors_forward() {
        let store = store_with_edges(&[(0, 1), (2, 1), (3, 1)]);
        let back = store.adjacency(v(1), Direction::Backward, GraphVersion::Permanent, ANY);
        assert_eq!(ids(&back), vec![0, 2, 3]);
    }

    #[test]
    fn test_staged_deletion_views() {
        let mut store = store_with_edges(&[(0, 1), (0, 2)]);
        store.delete_edge(v(0), v(1), ANY);

        let fwd = |st: &GraphStore, ver| st.adjacency(v(0), Direction::Forward, ver, ANY);
        // The deleted edge stays visible under PERMANENT until commit.
        assert_eq!(ids(&fwd(&store, GraphVersion::Permanent)), vec![1, 2]);
        assert_eq!(ids(&fwd(&store, GraphVersion::DiffMinus)), vec![1]);
        assert_eq!(ids(&fwd(&store, GraphVersion::Merged)), vec![2]);

        store.commit();
        assert_eq!(ids(&fwd(&store, GraphVersion::Permanent)), vec![2]);
        assert!(store.check_consistency().is_ok());
    }

    #[test]
    fn test_add_then_delete_before_commit_is_identity() {
        let mut store = store_with_edges(&[(0, 1)]);
        let before = store.adjacency(v(0), Direction::Forward, GraphVersion::Merged, ANY);

        store.add_edge(v(0), v(5), ANY).unwrap();
        store.delete_edge(v(0), v(5), ANY);
        assert!(!store.has_staged_changes());

        let after = store.adjacency(v(0), Direction::Forward, GraphVersion::Merged, ANY);
        assert_eq!(before, after);

        store.commit();
        assert_eq!(
            ids(&store.adjacency(v(0), Direction::Forward, GraphVersion::Permanent, ANY)),
            vec![1]
        );
    }

    #[test]
    fn test_delete_then_add_cancels_deletion() {
        let mut store = store_with_edges(&[(0, 1)]);
        let id_before = store.edge_id(v(0), v(1), ANY).unwrap();

        store.delete_edge(v(0), v(1), ANY);
        let id_after = store.add_edge(v(0), v(1), ANY).unwrap();
        assert_eq!(id_before, id_after);
        assert!(!store.has_staged_changes());

        store.commit();
        assert!(store
            .adjacency_contains(v(0), Direction::Forward, GraphVersion::Permanent, ANY, v(1)));
    }

    #[test]
    fn test_delete_nonexistent_edge_is_noop() {
        let mut store = store_with_edges(&[(0, 1)]);
        assert_eq!(store.delete_edge(v(0), v(9), ANY), 0);
        assert_eq!(store.delete_edge(v(7), v(8), ANY), 0);
        assert!(!store.has_staged_changes());
    }

    #[test]
    fn test_commit_is_idempotent_on_empty_diffs() {
        let mut store = store_with_edges(&[(0, 1), (1, 2)]);
        let before = store.all_edges(Direction::Forward, GraphVersion::Permanent, ANY);
        store.commit();
        store.commit();
        let after = store.all_edges(Direction::Forward, GraphVersion::Permanent, ANY);
        assert_eq!(before, after);
    }

    #[test]
    fn test_typed_multigraph_edges() {
        let mut store = GraphStore::new();
        let follows = TypeId::new(0);
        let likes = TypeId::new(1);
        let e1 = store.add_edge(v(0), v(1), follows).unwrap();
        let e2 = store.add_edge(v(0), v(1), likes).unwrap();
        assert_ne!(e1, e2);
        store.commit();

        let fwd =
            |filter| store.adjacency(v(0), Direction::Forward, GraphVersion::Permanent, filter);
        assert_eq!(ids(&fwd(ANY)), vec![1]);
        assert_eq!(ids(&fwd(follows)), vec![1]);
        assert_eq!(ids(&fwd(likes)), vec![1]);

        // Untyped deletion removes both parallel edges.
        let mut store = store;
        assert_eq!(store.delete_edge(v(0), v(1), ANY), 2);
        store.commit();
        assert!(store
            .adjacency(v(0), Direction::Forward, GraphVersion::Permanent, ANY)
            .is_empty());
    }

    #[test]
    fn test_typed_filter_excludes_untyped_edges() {
        let mut store = GraphStore::new();
        let follows = TypeId::new(0);
        store.add_edge(v(0), v(1), ANY).unwrap();
        store.commit();

        assert!(store
            .adjacency(v(0), Direction::Forward, GraphVersion::Permanent, follows)
            .is_empty());
    }

    #[test]
    fn test_deleted_edge_drops_id_and_properties() {
        let mut store = GraphStore::new();
        let key = TypeId::new(3);
        let id = store.add_edge(v(0), v(1), ANY).unwrap();
        store.set_edge_property(id, key, Value::Int(9));
        store.commit();

        store.delete_edge(v(0), v(1), ANY);
        // Still resolvable while only staged.
        assert_eq!(store.edge_id(v(0), v(1), ANY), Some(id));

        store.commit();
        assert_eq!(store.edge_id(v(0), v(1), ANY), None);
        assert_eq!(store.edge_property(id, key), None);
    }

    #[test]
    fn test_unknown_vertex_has_empty_adjacency() {
        let store = GraphStore::new();
        assert!(store
            .adjacency(v(99), Direction::Forward, GraphVersion::Merged, ANY)
            .is_empty());
        assert_eq!(
            store.adjacency_len(v(99), Direction::Backward, GraphVersion::Permanent, ANY),
            0
        );
    }

    #[test]
    fn test_all_edges_enumeration() {
        let store = store_with_edges(&[(1, 2), (0, 1), (1, 3)]);
        let forward = store.all_edges(Direction::Forward, GraphVersion::Permanent, ANY);
        assert_eq!(
            forward,
            vec![(v(0), v(1)), (v(1), v(2)), (v(1), v(3))]
        );
        let backward = store.all_edges(Direction::Backward, GraphVersion::Permanent, ANY);
        assert_eq!(
            backward,
            vec![(v(1), v(0)), (v(2), v(1)), (v(3), v(1))]
        );
    }

    #[test]
    fn test_self_loop_edges() {
        let store = store_with_edges(&[(2, 2), (0, 1)]);
        assert!(store
            .adjacency_contains(v(2), Direction::Forward, GraphVersion::Permanent, ANY, v(2)));
        assert!(store
            .adjacency_contains(v(2), Direction::Backward, GraphVersion::Permanent, ANY, v(2)));
    }
}
