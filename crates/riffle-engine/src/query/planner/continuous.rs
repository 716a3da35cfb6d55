//! Planning of CONTINUOUS MATCH queries.
//!
//! A pattern with n relations expands into n delta plans by the standard
//! incremental view-maintenance decomposition: delta plan i designates
//! relation i as the diff-relation, ranges relations before it over
//! MERGED and relations after it over PERMANENT. Every newly emerging
//! match contains at least one added edge, and fixing which relation is
//! the first diff-relation counts it exactly once; symmetrically for
//! deletions.

use riffle_common::utils::error::{Error, Result};
use riffle_core::graph::GraphVersion;
use riffle_core::TypeRegistry;

use super::{
    build_join_plan, build_pipeline_spec, choose_seed_variable, order_remaining_variables,
    prefix_width, variable_positions, ContinuousMatchPlan, DeltaQueryPlan,
};
use crate::query::query_graph::QueryGraph;
use crate::query::structured::StructuredQuery;

/// Compiles a CONTINUOUS MATCH query into delta plans.
pub struct ContinuousMatchPlanner<'a> {
    query: &'a StructuredQuery,
    registry: &'a TypeRegistry,
}

impl<'a> ContinuousMatchPlanner<'a> {
    /// Creates a planner over a parsed query and registry.
    #[must_use]
    pub fn new(query: &'a StructuredQuery, registry: &'a TypeRegistry) -> Self {
        Self { query, registry }
    }

    /// Validates and plans the query.
    ///
    /// # Errors
    ///
    /// Rejects RETURN clauses (continuous output is the matched vertex
    /// IDs), plus everything [`QueryGraph::build`] rejects.
    pub fn plan(&self) -> Result<ContinuousMatchPlan> {
        if self.query.has_return_clause() {
            return Err(Error::validation(
                "CONTINUOUS MATCH supports a pattern and WHERE clause only",
            ));
        }
        let graph = QueryGraph::build(self.query, self.registry)?;

        // All delta plans emit identity rows in this one canonical order,
        // so emerged and deleted tuples compare across plans.
        let mut canonical = vec![choose_seed_variable(&graph)];
        order_remaining_variables(&graph, &mut canonical);

        let mut delta_plans = Vec::with_capacity(graph.relation_count());
        for diff_index in 0..graph.relation_count() {
            let diff_relation = graph.relation(diff_index);

            // The diff relation's endpoints come first, from then to.
            let mut ordered = vec![diff_relation.from.clone()];
            if diff_relation.to != diff_relation.from {
                ordered.push(diff_relation.to.clone());
            }
            order_remaining_variables(&graph, &mut ordered);

            let emerged = build_join_plan(
                &graph,
                &ordered,
                &|index| delta_version(index, diff_index, GraphVersion::DiffPlus),
                Some(diff_index),
            );
            let deleted = build_join_plan(
                &graph,
                &ordered,
                &|index| delta_version(index, diff_index, GraphVersion::DiffMinus),
                Some(diff_index),
            );

            let positions = variable_positions(&ordered);
            let pipeline = build_pipeline_spec(
                self.query,
                &graph,
                self.registry,
                &positions,
                prefix_width(&ordered),
                &canonical,
            )?;
            delta_plans.push(DeltaQueryPlan {
                emerged,
                deleted,
                pipeline,
            });
        }

        tracing::debug!(
            delta_plans = delta_plans.len(),
            "planned CONTINUOUS MATCH"
        );
        Ok(ContinuousMatchPlan { delta_plans })
    }
}

/// Relations before the diff use MERGED, the diff relation uses the diff
/// version, relations after it use PERMANENT.
fn delta_version(index: usize, diff_index: usize, diff_version: GraphVersion) -> GraphVersion {
    match index.cmp(&diff_index) {
        std::cmp::Ordering::Less => GraphVersion::Merged,
        std::cmp::Ordering::Equal => diff_version,
        std::cmp::Ordering::Greater => GraphVersion::Permanent,
    }
}
