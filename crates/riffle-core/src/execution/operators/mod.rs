//! The operator pipeline behind the join.
//!
//! Completed tuples flow through a push-based chain: each operator accepts
//! a batch, transforms it, and forwards the result to the next one, with
//! the sink-facing operator at the end. The planner emits exactly the
//! subchain a query's clauses demand:
//!
//! - [`EdgeIdResolver`] - Resolve pattern-edge variables to edge IDs
//! - [`Filter`] - Apply property predicates
//! - [`Projection`] - Reorder or drop columns
//! - [`PropertyResolver`] - Turn IDs into output values, into the sink
//! - [`GroupByAndAggregate`] - Grouped aggregation, into the sink

mod aggregate;
mod edge_id_resolver;
mod filter;
mod projection;
mod property_resolver;

pub use aggregate::{AggregateExpr, AggregateFunction, GroupByAndAggregate};
pub use edge_id_resolver::{EdgeIdResolver, EdgeLookup};
pub use filter::{Filter, FilterPredicate, PredicateOperand};
pub use projection::Projection;
pub use property_resolver::PropertyResolver;

use riffle_common::types::{EdgeId, TypeId, Value, VertexId};
use riffle_common::utils::error::Result;

use super::{MatchTuple, TupleBatch};
use crate::graph::GraphStore;

/// A pipeline operator: accept a batch, forward to the next operator or
/// the sink.
pub trait Operator {
    /// Processes one batch of tuples.
    ///
    /// # Errors
    ///
    /// Propagates downstream failures unchanged.
    fn process(&mut self, batch: &TupleBatch) -> Result<()>;

    /// Signals end-of-stream. Stateful operators flush here.
    ///
    /// # Errors
    ///
    /// Propagates downstream failures unchanged.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// What a tuple column holds and how to render it into output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DescriptorKind {
    /// The vertex ID itself.
    VertexIdField,
    /// A property of the vertex at the column.
    VertexProperty,
    /// The edge ID itself.
    EdgeIdField,
    /// A property of the edge at the column.
    EdgeProperty,
}

/// Points at one column of a tuple and says how to resolve it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropertyDescriptor {
    /// How to interpret the column.
    pub kind: DescriptorKind,
    /// Which column of the tuple to read.
    pub tuple_index: usize,
    /// Interned property key; ignored for the ID kinds.
    pub key: TypeId,
}

impl PropertyDescriptor {
    /// A descriptor that emits the vertex ID at `tuple_index`.
    #[must_use]
    pub const fn vertex_id(tuple_index: usize) -> Self {
        Self {
            kind: DescriptorKind::VertexIdField,
            tuple_index,
            key: TypeId::ANY,
        }
    }

    /// A descriptor that resolves a property of the vertex at
    /// `tuple_index`.
    #[must_use]
    pub const fn vertex_property(tuple_index: usize, key: TypeId) -> Self {
        Self {
            kind: DescriptorKind::VertexProperty,
            tuple_index,
            key,
        }
    }

    /// A descriptor that emits the edge ID at `tuple_index`.
    #[must_use]
    pub const fn edge_id(tuple_index: usize) -> Self {
        Self {
            kind: DescriptorKind::EdgeIdField,
            tuple_index,
            key: TypeId::ANY,
        }
    }

    /// A descriptor that resolves a property of the edge at `tuple_index`.
    #[must_use]
    pub const fn edge_property(tuple_index: usize, key: TypeId) -> Self {
        Self {
            kind: DescriptorKind::EdgeProperty,
            tuple_index,
            key,
        }
    }

    /// Resolves this descriptor against one tuple.
    ///
    /// Unset properties resolve to [`Value::Null`].
    #[must_use]
    pub fn resolve(&self, tuple: &MatchTuple, store: &GraphStore) -> Value {
        let raw = tuple[self.tuple_index];
        match self.kind {
            DescriptorKind::VertexIdField | DescriptorKind::EdgeIdField => Value::Int(raw as i32),
            DescriptorKind::VertexProperty => store
                .vertex_property(VertexId::new(raw), self.key)
                .cloned()
                .unwrap_or(Value::Null),
            DescriptorKind::EdgeProperty => store
                .edge_property(EdgeId::new(raw), self.key)
                .cloned()
                .unwrap_or(Value::Null),
        }
    }
}

/// Comparison operators usable in WHERE predicates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `<>`
    NotEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
}

impl CompareOp {
    /// Evaluates the comparison. Incomparable values (missing properties,
    /// mismatched kinds) fail every operator.
    #[must_use]
    pub fn evaluate(self, left: &Value, right: &Value) -> bool {
        use std::cmp::Ordering;
        let Some(ordering) = left.compare(right) else {
            return false;
        };
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::NotEq => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }
}
