//! The sink-facing operator that turns tuples into output rows.

use riffle_common::types::Value;
use riffle_common::utils::error::Result;

use super::{Operator, PropertyDescriptor};
use crate::execution::TupleBatch;
use crate::graph::GraphStore;
use crate::sink::OutputSink;

/// Resolves each descriptor against every tuple and appends the resulting
/// rows to the output sink.
///
/// The identity form - one vertex-ID descriptor per variable - is what a
/// MATCH without a RETURN clause gets.
pub struct PropertyResolver<'a> {
    descriptors: Vec<PropertyDescriptor>,
    store: &'a GraphStore,
    sink: &'a mut dyn OutputSink,
}

impl<'a> PropertyResolver<'a> {
    /// Creates a resolver writing to `sink`.
    #[must_use]
    pub fn new(
        descriptors: Vec<PropertyDescriptor>,
        store: &'a GraphStore,
        sink: &'a mut dyn OutputSink,
    ) -> Self {
        Self {
            descriptors,
            store,
            sink,
        }
    }
}

impl Operator for PropertyResolver<'_> {
    fn process(&mut self, batch: &TupleBatch) -> Result<()> {
        for tuple in &batch.tuples {
            let row: Vec<Value> = self
                .descriptors
                .iter()
                .map(|d| d.resolve(tuple, self.store))
                .collect();
            self.sink.append(batch.tag, &row)?;
        }
        Ok(())
    }
}
