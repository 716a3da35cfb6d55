//! A sink that retains every row.

use riffle_common::types::Value;
use riffle_common::utils::error::Result;

use super::{render_row, OutputSink};
use crate::execution::MatchOutputTag;

/// Retains all appended rows in order.
///
/// Output order is only defined up to batch boundaries, so equality
/// between sinks is multiset equality, via [`same_multiset`](Self::same_multiset).
#[derive(Debug, Default)]
pub struct InMemorySink {
    rows: Vec<(MatchOutputTag, Vec<Value>)>,
}

impl InMemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The retained rows, in arrival order.
    #[must_use]
    pub fn rows(&self) -> &[(MatchOutputTag, Vec<Value>)] {
        &self.rows
    }

    /// Consumes the sink, returning the retained rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<(MatchOutputTag, Vec<Value>)> {
        self.rows
    }

    /// Number of retained rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if nothing was appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rendered lines, sorted, for multiset comparison.
    #[must_use]
    pub fn sorted_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .rows
            .iter()
            .map(|(tag, row)| render_row(*tag, row))
            .collect();
        lines.sort();
        lines
    }

    /// Multiset equality with another sink.
    #[must_use]
    pub fn same_multiset(&self, other: &InMemorySink) -> bool {
        self.sorted_lines() == other.sorted_lines()
    }
}

impl OutputSink for InMemorySink {
    fn append(&mut self, tag: MatchOutputTag, row: &[Value]) -> Result<()> {
        self.rows.push((tag, row.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiset_equality_ignores_order() {
        let mut a = InMemorySink::new();
        let mut b = InMemorySink::new();
        a.append(MatchOutputTag::Matched, &[Value::Int(1), Value::Int(2)])
            .unwrap();
        a.append(MatchOutputTag::Matched, &[Value::Int(3), Value::Int(4)])
            .unwrap();
        b.append(MatchOutputTag::Matched, &[Value::Int(3), Value::Int(4)])
            .unwrap();
        b.append(MatchOutputTag::Matched, &[Value::Int(1), Value::Int(2)])
            .unwrap();

        assert!(a.same_multiset(&b));

        b.append(MatchOutputTag::Deleted, &[Value::Int(1), Value::Int(2)])
            .unwrap();
        assert!(!a.same_multiset(&b));
    }
}
