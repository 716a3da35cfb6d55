//! Planning of one-time MATCH queries.

use riffle_common::utils::error::Result;
use riffle_core::graph::GraphVersion;
use riffle_core::TypeRegistry;

use super::{
    build_join_plan, build_pipeline_spec, choose_seed_variable, order_remaining_variables,
    prefix_width, variable_positions, OneTimeMatchPlan,
};
use crate::query::query_graph::QueryGraph;
use crate::query::structured::StructuredQuery;

/// Compiles a MATCH query into a [`OneTimeMatchPlan`].
///
/// Deterministic: the same pattern always yields the same variable
/// ordering and the same stages. Every rule ranges over
/// [`GraphVersion::Permanent`].
pub struct OneTimeMatchPlanner<'a> {
    query: &'a StructuredQuery,
    registry: &'a TypeRegistry,
}

impl<'a> OneTimeMatchPlanner<'a> {
    /// Creates a planner over a parsed query and registry.
    #[must_use]
    pub fn new(query: &'a StructuredQuery, registry: &'a TypeRegistry) -> Self {
        Self { query, registry }
    }

    /// Validates and plans the query.
    ///
    /// # Errors
    ///
    /// Whatever [`QueryGraph::build`] or pipeline validation rejects; no
    /// partial plan is returned.
    pub fn plan(&self) -> Result<OneTimeMatchPlan> {
        let graph = QueryGraph::build(self.query, self.registry)?;

        let mut ordered = vec![choose_seed_variable(&graph)];
        order_remaining_variables(&graph, &mut ordered);

        let join = build_join_plan(&graph, &ordered, &|_| GraphVersion::Permanent, None);
        let positions = variable_positions(&ordered);
        let pipeline = build_pipeline_spec(
            self.query,
            &graph,
            self.registry,
            &positions,
            prefix_width(&ordered),
            &ordered,
        )?;

        tracing::debug!(
            variables = ?ordered,
            stages = join.stages.len(),
            "planned one-time MATCH"
        );
        Ok(OneTimeMatchPlan {
            ordered_variables: ordered,
            join,
            pipeline,
        })
    }
}
