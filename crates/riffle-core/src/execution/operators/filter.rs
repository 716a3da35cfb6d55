//! Predicate evaluation over resolved tuple columns.

use riffle_common::types::Value;
use riffle_common::utils::error::Result;

use super::{CompareOp, Operator, PropertyDescriptor};
use crate::execution::{MatchTuple, TupleBatch};
use crate::graph::GraphStore;

/// The right-hand side of a predicate.
#[derive(Clone, Debug)]
pub enum PredicateOperand {
    /// A constant from the query text.
    Literal(Value),
    /// Another resolved column property.
    Property(PropertyDescriptor),
}

/// One `left op right` comparison from the WHERE clause.
#[derive(Clone, Debug)]
pub struct FilterPredicate {
    /// Left operand, always a column property.
    pub left: PropertyDescriptor,
    /// The comparison.
    pub op: CompareOp,
    /// Right operand.
    pub right: PredicateOperand,
}

impl FilterPredicate {
    fn holds(&self, tuple: &MatchTuple, store: &GraphStore) -> bool {
        let left = self.left.resolve(tuple, store);
        let right = match &self.right {
            PredicateOperand::Literal(value) => value.clone(),
            PredicateOperand::Property(descriptor) => descriptor.resolve(tuple, store),
        };
        self.op.evaluate(&left, &right)
    }
}

/// Drops tuples failing the conjunction of its predicates.
pub struct Filter<'a> {
    predicates: Vec<FilterPredicate>,
    store: &'a GraphStore,
    next: Box<dyn Operator + 'a>,
}

impl<'a> Filter<'a> {
    /// Creates a filter forwarding survivors to `next`.
    #[must_use]
    pub fn new(
        predicates: Vec<FilterPredicate>,
        store: &'a GraphStore,
        next: Box<dyn Operator + 'a>,
    ) -> Self {
        Self {
            predicates,
            store,
            next,
        }
    }
}

impl Operator for Filter<'_> {
    fn process(&mut self, batch: &TupleBatch) -> Result<()> {
        let store = self.store;
        let surviving: Vec<MatchTuple> = batch
            .tuples
            .iter()
            .filter(|tuple| self.predicates.iter().all(|p| p.holds(tuple, store)))
            .cloned()
            .collect();
        if surviving.is_empty() {
            return Ok(());
        }
        self.next.process(&TupleBatch::new(batch.tag, surviving))
    }

    fn finish(&mut self) -> Result<()> {
        self.next.finish()
    }
}
