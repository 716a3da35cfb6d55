//! The worst-case-optimal generic-join executor.
//!
//! Executes a [`JoinPlan`] against the graph store, extending prefixes one
//! variable at a time by multiway intersection of sorted adjacency lists,
//! and streams completed tuples into the operator pipeline in batches.

use riffle_common::types::{TypeId, VertexId};
use riffle_common::utils::error::{Error, Result};

use super::operators::Operator;
use super::rule::{IntersectionRule, JoinPlan};
use super::{MatchOutputTag, MatchTuple, TupleBatch};
use crate::graph::{GraphStore, GraphVersion, SortedIdList};

/// How many extended prefixes accumulate before recursing into the next
/// stage. Bounds transient memory to O(pattern length × batch × depth);
/// the value is a tuning knob with no externally observable effect.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Counters the executor maintains while running.
#[derive(Clone, Copy, Debug, Default)]
pub struct JoinStats {
    /// Elements of the smaller list examined across all intersections.
    ///
    /// On skewed inputs this tracks the smallest adjacency list per
    /// prefix, not the product of list sizes.
    pub intersection_probes: u64,
    /// Completed tuples handed to the pipeline.
    pub tuples_emitted: u64,
}

/// Executes a generic-join plan, batched and depth-first.
///
/// At every stage the rule with the fewest candidate extensions is
/// evaluated first and the remaining rules are intersected against it,
/// keeping the running intersection small. The rule choice never changes
/// the output set, only its enumeration cost.
pub struct GenericJoinExecutor<'a> {
    plan: &'a JoinPlan,
    store: &'a GraphStore,
    batch_size: usize,
    stats: JoinStats,
}

impl<'a> GenericJoinExecutor<'a> {
    /// Creates an executor for `plan` over `store`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyPlan`] for a plan with no stages or a stage
    /// with no rules.
    pub fn new(plan: &'a JoinPlan, store: &'a GraphStore) -> Result<Self> {
        if plan.stages.is_empty() || plan.stages.iter().any(|s| s.rules.is_empty()) {
            return Err(Error::EmptyPlan);
        }
        Ok(Self {
            plan,
            store,
            batch_size: DEFAULT_BATCH_SIZE,
            stats: JoinStats::default(),
        })
    }

    /// Overrides the batch size. Batching is transparent to the output
    /// set; tests use small batches to exercise the recursion.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// The counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> JoinStats {
        self.stats
    }

    /// The output tag a plan produces, derived from the seed rule's graph
    /// version.
    #[must_use]
    pub fn output_tag(&self) -> MatchOutputTag {
        match self.plan.stages[0].rules[0].version {
            GraphVersion::DiffPlus => MatchOutputTag::Emerged,
            GraphVersion::DiffMinus => MatchOutputTag::Deleted,
            GraphVersion::Permanent | GraphVersion::Merged => MatchOutputTag::Matched,
        }
    }

    /// Runs the plan to completion, streaming tuples into `output`.
    ///
    /// The caller owns the pipeline's end-of-stream: `output.finish()` is
    /// not invoked here, so several plans may share one pipeline.
    ///
    /// # Errors
    ///
    /// Propagates pipeline errors; the executor never swallows them.
    pub fn execute(&mut self, output: &mut dyn Operator) -> Result<()> {
        let plan = self.plan;
        let store = self.store;
        let tag = self.output_tag();

        let seed = &plan.stages[0];
        let first = &seed.rules[0];
        let edges = store.all_edges(first.direction, first.version, first.edge_type);
        if edges.is_empty() {
            return Ok(());
        }
        tracing::trace!(initial_prefixes = edges.len(), "seeding generic join");

        let mut batch: Vec<MatchTuple> = Vec::with_capacity(self.batch_size);
        for (from, to) in edges {
            if plan.equal_seed_endpoints && from != to {
                continue;
            }
            if !vertex_matches(store, from, plan.from_vertex_filter)
                || !vertex_matches(store, to, seed.to_vertex_filter)
            {
                continue;
            }
            let prefix = [from, to];
            let extra_rules_hold = seed.rules[1..].iter().all(|rule| {
                store.adjacency_contains(
                    prefix[rule.prefix_index],
                    rule.direction,
                    rule.version,
                    rule.edge_type,
                    to,
                )
            });
            if !extra_rules_hold || !loop_rules_hold(store, &seed.loop_rules, &prefix) {
                continue;
            }

            batch.push(MatchTuple::from_slice(&[from.as_u32(), to.as_u32()]));
            if batch.len() >= self.batch_size {
                self.extend(&batch, 1, tag, output)?;
                batch.clear();
            }
        }
        if !batch.is_empty() {
            self.extend(&batch, 1, tag, output)?;
        }
        Ok(())
    }

    /// Recursively extends a batch of prefixes through stage `stage_index`
    /// and onward, handing completed tuples to `output`.
    fn extend(
        &mut self,
        prefixes: &[MatchTuple],
        stage_index: usize,
        tag: MatchOutputTag,
        output: &mut dyn Operator,
    ) -> Result<()> {
        let plan = self.plan;
        let store = self.store;

        if stage_index >= plan.stages.len() {
            self.stats.tuples_emitted += prefixes.len() as u64;
            return output.process(&TupleBatch::new(tag, prefixes.to_vec()));
        }

        let stage = &plan.stages[stage_index];
        let mut next: Vec<MatchTuple> = Vec::with_capacity(self.batch_size);

        for prefix in prefixes {
            // Evaluate the cheapest rule first; intersect the rest against
            // its list. This is what keeps cost near the smallest list on
            // skewed graphs.
            let mut min_index = 0;
            let mut min_len = usize::MAX;
            for (i, rule) in stage.rules.iter().enumerate() {
                let len = adjacency_len(store, prefix, rule);
                if len < min_len {
                    min_len = len;
                    min_index = i;
                }
            }
            if min_len == 0 {
                continue;
            }

            let mut extensions = adjacency(store, prefix, &stage.rules[min_index]);
            for (i, rule) in stage.rules.iter().enumerate() {
                if i == min_index || extensions.is_empty() {
                    continue;
                }
                let candidates = adjacency(store, prefix, rule);
                extensions =
                    extensions.intersect_counted(&candidates, &mut self.stats.intersection_probes);
            }
            if !stage.to_vertex_filter.is_any() {
                extensions.retain(|&v| stage.to_vertex_filter.matches(store.vertex_type(v)));
            }

            for x in extensions.iter() {
                let mut extended = prefix.clone();
                extended.push(x.as_u32());
                if !loop_rules_hold_tuple(store, &stage.loop_rules, &extended) {
                    continue;
                }
                next.push(extended);
                if next.len() >= self.batch_size {
                    self.extend(&next, stage_index + 1, tag, output)?;
                    next.clear();
                }
            }
        }

        if !next.is_empty() {
            self.extend(&next, stage_index + 1, tag, output)?;
        }
        Ok(())
    }
}

fn vertex_matches(store: &GraphStore, vertex: VertexId, filter: TypeId) -> bool {
    filter.matches(store.vertex_type(vertex))
}

fn adjacency(store: &GraphStore, prefix: &MatchTuple, rule: &IntersectionRule) -> SortedIdList {
    store.adjacency(
        VertexId::new(prefix[rule.prefix_index]),
        rule.direction,
        rule.version,
        rule.edge_type,
    )
}

fn adjacency_len(store: &GraphStore, prefix: &MatchTuple, rule: &IntersectionRule) -> usize {
    store.adjacency_len(
        VertexId::new(prefix[rule.prefix_index]),
        rule.direction,
        rule.version,
        rule.edge_type,
    )
}

fn loop_rules_hold(store: &GraphStore, rules: &[IntersectionRule], prefix: &[VertexId; 2]) -> bool {
    rules.iter().all(|rule| {
        let vertex = prefix[rule.prefix_index];
        store.adjacency_contains(vertex, rule.direction, rule.version, rule.edge_type, vertex)
    })
}

fn loop_rules_hold_tuple(store: &GraphStore, rules: &[IntersectionRule], tuple: &MatchTuple) -> bool {
    rules.iter().all(|rule| {
        let vertex = VertexId::new(tuple[rule.prefix_index]);
        store.adjacency_contains(vertex, rule.direction, rule.version, rule.edge_type, vertex)
    })
}
