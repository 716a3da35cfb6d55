//! Grouped aggregation at the end of the pipeline.

use std::hash::{Hash, Hasher};

use riffle_common::collections::RiffleIndexMap;
use riffle_common::types::Value;
use riffle_common::utils::error::Result;

use super::{Operator, PropertyDescriptor};
use crate::execution::{MatchOutputTag, TupleBatch};
use crate::graph::GraphStore;
use crate::sink::OutputSink;

/// The supported aggregation functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregateFunction {
    /// `COUNT(*)` - rows per group.
    CountStar,
    /// `SUM(x)` - numeric sum.
    Sum,
    /// `MIN(x)` - smallest comparable value.
    Min,
    /// `MAX(x)` - largest comparable value.
    Max,
    /// `AVG(x)` - numeric mean.
    Avg,
}

/// One aggregation requested by the RETURN clause.
#[derive(Clone, Copy, Debug)]
pub struct AggregateExpr {
    /// The function to fold with.
    pub function: AggregateFunction,
    /// The column to fold over; `None` only for `COUNT(*)`.
    pub descriptor: Option<PropertyDescriptor>,
}

/// A group key wrapping resolved values with bit-exact equality, so
/// doubles can live in a hash map key.
#[derive(Clone, Debug)]
struct GroupKey(Vec<Value>);

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(&other.0).all(|(a, b)| match (a, b) {
                (Value::Double(x), Value::Double(y)) => x.to_bits() == y.to_bits(),
                _ => a == b,
            })
    }
}

impl Eq for GroupKey {}

impl Hash for GroupKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for value in &self.0 {
            match value {
                Value::Null => 0u8.hash(state),
                Value::Int(i) => {
                    1u8.hash(state);
                    i.hash(state);
                }
                Value::Double(d) => {
                    2u8.hash(state);
                    d.to_bits().hash(state);
                }
                Value::Boolean(b) => {
                    3u8.hash(state);
                    b.hash(state);
                }
                Value::String(s) => {
                    4u8.hash(state);
                    s.hash(state);
                }
            }
        }
    }
}

/// Running state of one aggregator.
#[derive(Clone, Debug)]
enum AggState {
    Count(i64),
    Sum { int: i64, double: f64, saw_double: bool },
    Extreme { keep_min: bool, current: Option<Value> },
    Avg { sum: f64, count: i64 },
}

impl AggState {
    fn initial(function: AggregateFunction) -> Self {
        match function {
            AggregateFunction::CountStar => AggState::Count(0),
            AggregateFunction::Sum => AggState::Sum {
                int: 0,
                double: 0.0,
                saw_double: false,
            },
            AggregateFunction::Min => AggState::Extreme {
                keep_min: true,
                current: None,
            },
            AggregateFunction::Max => AggState::Extreme {
                keep_min: false,
                current: None,
            },
            AggregateFunction::Avg => AggState::Avg { sum: 0.0, count: 0 },
        }
    }

    fn update(&mut self, value: Option<&Value>) {
        match self {
            AggState::Count(count) => *count += 1,
            AggState::Sum {
                int,
                double,
                saw_double,
            } => match value {
                Some(Value::Int(i)) => *int += i64::from(*i),
                Some(Value::Double(d)) => {
                    *double += d;
                    *saw_double = true;
                }
                _ => {}
            },
            AggState::Extreme { keep_min, current } => {
                if let Some(value) = value {
                    if value == &Value::Null {
                        return;
                    }
                    let replace = match current {
                        None => true,
                        Some(best) => match value.compare(best) {
                            Some(ordering) => {
                                if *keep_min {
                                    ordering == std::cmp::Ordering::Less
                                } else {
                                    ordering == std::cmp::Ordering::Greater
                                }
                            }
                            None => false,
                        },
                    };
                    if replace {
                        *current = Some(value.clone());
                    }
                }
            }
            AggState::Avg { sum, count } => match value {
                Some(Value::Int(i)) => {
                    *sum += f64::from(*i);
                    *count += 1;
                }
                Some(Value::Double(d)) => {
                    *sum += d;
                    *count += 1;
                }
                _ => {}
            },
        }
    }

    fn finalize(&self) -> Value {
        match self {
            AggState::Count(count) => int_value(*count),
            AggState::Sum {
                int,
                double,
                saw_double,
            } => {
                if *saw_double {
                    Value::Double(*int as f64 + double)
                } else {
                    int_value(*int)
                }
            }
            AggState::Extreme { current, .. } => current.clone().unwrap_or(Value::Null),
            AggState::Avg { sum, count } => {
                if *count == 0 {
                    Value::Null
                } else {
                    Value::Double(sum / *count as f64)
                }
            }
        }
    }
}

/// An i64 aggregate result as a value, widening to Double past i32 range.
fn int_value(value: i64) -> Value {
    i32::try_from(value).map_or(Value::Double(value as f64), Value::Int)
}

/// Groups rows by the non-aggregated columns and folds the aggregators,
/// emitting one row per group at end-of-stream.
pub struct GroupByAndAggregate<'a> {
    group_by: Vec<PropertyDescriptor>,
    aggregates: Vec<AggregateExpr>,
    store: &'a GraphStore,
    sink: &'a mut dyn OutputSink,
    groups: RiffleIndexMap<GroupKey, Vec<AggState>>,
    tag: Option<MatchOutputTag>,
}

impl<'a> GroupByAndAggregate<'a> {
    /// Creates the aggregation terminal writing to `sink`.
    #[must_use]
    pub fn new(
        group_by: Vec<PropertyDescriptor>,
        aggregates: Vec<AggregateExpr>,
        store: &'a GraphStore,
        sink: &'a mut dyn OutputSink,
    ) -> Self {
        Self {
            group_by,
            aggregates,
            store,
            sink,
            groups: RiffleIndexMap::default(),
            tag: None,
        }
    }
}

impl Operator for GroupByAndAggregate<'_> {
    fn process(&mut self, batch: &TupleBatch) -> Result<()> {
        self.tag = Some(batch.tag);
        for tuple in &batch.tuples {
            let key = GroupKey(
                self.group_by
                    .iter()
                    .map(|d| d.resolve(tuple, self.store))
                    .collect(),
            );
            let states = self.groups.entry(key).or_insert_with(|| {
                self.aggregates
                    .iter()
                    .map(|a| AggState::initial(a.function))
                    .collect()
            });
            for (expr, state) in self.aggregates.iter().zip(states.iter_mut()) {
                let value = expr.descriptor.map(|d| d.resolve(tuple, self.store));
                state.update(value.as_ref());
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let tag = self.tag.unwrap_or(MatchOutputTag::Matched);
        for (key, states) in &self.groups {
            let mut row = key.0.clone();
            row.extend(states.iter().map(AggState::finalize));
            self.sink.append(tag, &row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::MatchTuple;
    use crate::sink::InMemorySink;
    use riffle_common::types::{TypeId, VertexId};

    #[test]
    fn test_count_star_without_grouping() {
        let store = GraphStore::new();
        let mut sink = InMemorySink::new();
        {
            let mut op = GroupByAndAggregate::new(
                Vec::new(),
                vec![AggregateExpr {
                    function: AggregateFunction::CountStar,
                    descriptor: None,
                }],
                &store,
                &mut sink,
            );
            let tuples: Vec<MatchTuple> = (0..5)
                .map(|i| MatchTuple::from_slice(&[i, i + 1]))
                .collect();
            op.process(&TupleBatch::new(MatchOutputTag::Matched, tuples))
                .unwrap();
            op.finish().unwrap();
        }
        assert_eq!(sink.rows().len(), 1);
        assert_eq!(sink.rows()[0].1, vec![Value::Int(5)]);
    }

    #[test]
    fn test_sum_and_avg_over_property() {
        let mut store = GraphStore::new();
        let age = TypeId::new(0);
        store.set_vertex_property(VertexId::new(0), age, Value::Int(10));
        store.set_vertex_property(VertexId::new(1), age, Value::Int(20));

        let mut sink = InMemorySink::new();
        {
            let descriptor = Some(PropertyDescriptor::vertex_property(0, age));
            let mut op = GroupByAndAggregate::new(
                Vec::new(),
                vec![
                    AggregateExpr {
                        function: AggregateFunction::Sum,
                        descriptor,
                    },
                    AggregateExpr {
                        function: AggregateFunction::Avg,
                        descriptor,
                    },
                    AggregateExpr {
                        function: AggregateFunction::Min,
                        descriptor,
                    },
                    AggregateExpr {
                        function: AggregateFunction::Max,
                        descriptor,
                    },
                ],
                &store,
                &mut sink,
            );
            let tuples = vec![
                MatchTuple::from_slice(&[0]),
                MatchTuple::from_slice(&[1]),
            ];
            op.process(&TupleBatch::new(MatchOutputTag::Matched, tuples))
                .unwrap();
            op.finish().unwrap();
        }
        assert_eq!(
            sink.rows()[0].1,
            vec![
                Value::Int(30),
                Value::Double(15.0),
                Value::Int(10),
                Value::Int(20),
            ]
        );
    }
}
