//! Column reordering and dropping.

use riffle_common::utils::error::Result;

use super::Operator;
use crate::execution::{MatchTuple, TupleBatch};

/// Keeps the listed columns, in the listed order.
pub struct Projection<'a> {
    indices: Vec<usize>,
    next: Box<dyn Operator + 'a>,
}

impl<'a> Projection<'a> {
    /// Creates a projection forwarding to `next`.
    #[must_use]
    pub fn new(indices: Vec<usize>, next: Box<dyn Operator + 'a>) -> Self {
        Self { indices, next }
    }
}

impl Operator for Projection<'_> {
    fn process(&mut self, batch: &TupleBatch) -> Result<()> {
        let projected = batch
            .tuples
            .iter()
            .map(|tuple| self.indices.iter().map(|&i| tuple[i]).collect::<MatchTuple>())
            .collect();
        self.next.process(&TupleBatch::new(batch.tag, projected))
    }

    fn finish(&mut self) -> Result<()> {
        self.next.finish()
    }
}
