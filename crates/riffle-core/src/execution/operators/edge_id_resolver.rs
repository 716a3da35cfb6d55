//! Resolution of pattern-edge variables to edge IDs.

use riffle_common::types::{TypeId, VertexId};
use riffle_common::utils::error::{Error, Result};

use super::Operator;
use crate::execution::{MatchTuple, TupleBatch};
use crate::graph::GraphStore;

/// Where an edge variable's endpoints live in the tuple, and the declared
/// edge type.
#[derive(Clone, Copy, Debug)]
pub struct EdgeLookup {
    /// Column of the source vertex.
    pub src_index: usize,
    /// Column of the destination vertex.
    pub dst_index: usize,
    /// Declared type of the pattern edge, or `TypeId::ANY`.
    pub edge_type: TypeId,
}

/// Appends one edge-ID column per lookup to every tuple.
///
/// Only planned in when the WHERE or RETURN clause mentions an edge
/// variable.
pub struct EdgeIdResolver<'a> {
    lookups: Vec<EdgeLookup>,
    store: &'a GraphStore,
    next: Box<dyn Operator + 'a>,
}

impl<'a> EdgeIdResolver<'a> {
    /// Creates a resolver forwarding to `next`.
    #[must_use]
    pub fn new(lookups: Vec<EdgeLookup>, store: &'a GraphStore, next: Box<dyn Operator + 'a>) -> Self {
        Self {
            lookups,
            store,
            next,
        }
    }
}

impl Operator for EdgeIdResolver<'_> {
    fn process(&mut self, batch: &TupleBatch) -> Result<()> {
        let mut resolved = Vec::with_capacity(batch.tuples.len());
        for tuple in &batch.tuples {
            let mut extended: MatchTuple = tuple.clone();
            for lookup in &self.lookups {
                let src = VertexId::new(tuple[lookup.src_index]);
                let dst = VertexId::new(tuple[lookup.dst_index]);
                let id = self.store.edge_id(src, dst, lookup.edge_type).ok_or_else(|| {
                    Error::Inconsistency {
                        message: format!("matched edge {src}->{dst} has no edge ID"),
                    }
                })?;
                extended.push(id.as_u32());
            }
            resolved.push(extended);
        }
        self.next.process(&TupleBatch::new(batch.tag, resolved))
    }

    fn finish(&mut self) -> Result<()> {
        self.next.finish()
    }
}
