//! Query planning: variable ordering, stage construction, and the
//! operator pipeline behind the join.
//!
//! Both planners share the greedy variable-ordering heuristic and the
//! stage builder; they differ in which graph version each relation's
//! rules range over.

pub mod continuous;
pub mod one_time;

pub use continuous::ContinuousMatchPlanner;
pub use one_time::OneTimeMatchPlanner;

use riffle_common::collections::{riffle_map, RiffleMap};
use riffle_common::utils::error::{Error, Result};
use riffle_core::execution::operators::{
    AggregateExpr, EdgeLookup, FilterPredicate, PredicateOperand, PropertyDescriptor,
};
use riffle_core::execution::rule::{IntersectionRule, JoinPlan, Stage};
use riffle_core::graph::{Direction, GraphVersion};
use riffle_core::TypeRegistry;

use super::query_graph::QueryGraph;
use super::structured::{PredicateRhs, StructuredQuery};

/// The declarative description of the operator chain a query needs.
///
/// Plans are stateless; the engine instantiates operators from this spec
/// at execution time, wiring them to the store and the sink.
#[derive(Clone, Debug, Default)]
pub struct PipelineSpec {
    /// Edge variables to resolve, appended as columns after the vertex
    /// columns in this order.
    pub edge_lookups: Vec<EdgeLookup>,
    /// WHERE predicates over pre-projection columns.
    pub filter: Vec<FilterPredicate>,
    /// Columns surviving projection, in output order. `None` skips the
    /// projection operator entirely.
    pub projection: Option<Vec<usize>>,
    /// Terminal resolver descriptors (post-projection columns).
    pub resolvers: Vec<PropertyDescriptor>,
    /// Grouped aggregation replacing the plain resolver when present.
    pub aggregation: Option<AggregationSpec>,
}

/// Group-by columns and aggregators of an aggregating RETURN clause.
#[derive(Clone, Debug)]
pub struct AggregationSpec {
    /// Resolved per-row values that key the groups.
    pub group_by: Vec<PropertyDescriptor>,
    /// The aggregators, in RETURN-clause order.
    pub aggregates: Vec<AggregateExpr>,
}

/// A compiled one-time MATCH.
#[derive(Clone, Debug)]
pub struct OneTimeMatchPlan {
    /// The variable ordering the join binds, seed first.
    pub ordered_variables: Vec<String>,
    /// The generic-join stages.
    pub join: JoinPlan,
    /// The operator chain after the join.
    pub pipeline: PipelineSpec,
}

/// One relation's delta decomposition: the same stages once over
/// DIFF_PLUS (tagging EMERGED) and once over DIFF_MINUS (tagging
/// DELETED).
#[derive(Clone, Debug)]
pub struct DeltaQueryPlan {
    /// Sub-plan ranging the diff relation over DIFF_PLUS.
    pub emerged: JoinPlan,
    /// Sub-plan ranging the diff relation over DIFF_MINUS.
    pub deleted: JoinPlan,
    /// Operator chain; identity output is aligned to the canonical
    /// variable order so rows compare across delta plans.
    pub pipeline: PipelineSpec,
}

/// A compiled CONTINUOUS MATCH: one delta plan per pattern relation.
#[derive(Clone, Debug)]
pub struct ContinuousMatchPlan {
    /// Delta plans in pattern-relation order.
    pub delta_plans: Vec<DeltaQueryPlan>,
}

/// Picks the seed variable: highest degree, ties to the lexicographically
/// smallest name.
pub(crate) fn choose_seed_variable(graph: &QueryGraph) -> String {
    let mut best: Option<(&String, usize)> = None;
    for variable in graph.variables_sorted() {
        let degree = graph.degree(variable);
        if best.is_none_or(|(_, best_degree)| degree > best_degree) {
            best = Some((variable, degree));
        }
    }
    best.map(|(name, _)| name.clone()).unwrap_or_default()
}

/// Extends `ordered` until it covers the pattern, greedily choosing the
/// uncovered variable with the most pattern edges into the covered set,
/// then the highest degree, then the smallest name.
pub(crate) fn order_remaining_variables(graph: &QueryGraph, ordered: &mut Vec<String>) {
    while ordered.len() < graph.variable_count() {
        let mut candidates: Vec<&String> = Vec::new();
        for covered in ordered.iter() {
            for neighbor in graph.neighbor_variables(covered) {
                if !ordered.contains(neighbor) {
                    candidates.push(neighbor);
                }
            }
        }
        candidates.sort();
        candidates.dedup();

        let mut best: Option<(&String, usize, usize)> = None;
        for candidate in candidates {
            let connections: usize = ordered
                .iter()
                .map(|covered| graph.relations_between(candidate, covered).len())
                .sum();
            let degree = graph.degree(candidate);
            let better = best.is_none_or(|(_, best_connections, best_degree)| {
                connections > best_connections
                    || (connections == best_connections && degree > best_degree)
            });
            if better {
                best = Some((candidate, connections, degree));
            }
        }
        match best {
            // Candidates are sorted, so ties fall to the smallest name.
            Some((name, _, _)) => ordered.push(name.clone()),
            // Unreachable for a validated (connected) pattern.
            None => break,
        }
    }
}

/// Maps each variable to the prefix position where it is first bound.
pub(crate) fn variable_positions(ordered: &[String]) -> RiffleMap<String, usize> {
    let mut positions = riffle_map();
    for (index, variable) in ordered.iter().enumerate() {
        positions.entry(variable.clone()).or_insert(index);
    }
    positions
}

/// Tuple width the join produces: the seed always binds two positions,
/// even when a self-loop pattern binds one variable twice.
pub(crate) fn prefix_width(ordered: &[String]) -> usize {
    ordered.len().max(2)
}

/// Builds the generic-join stages for a variable ordering.
///
/// `version_of` maps a relation index to the graph version its rules
/// range over; `pinned_first` forces a relation to be the seed's
/// enumerated rule (the continuous planner pins the diff relation).
pub(crate) fn build_join_plan(
    graph: &QueryGraph,
    ordered: &[String],
    version_of: &dyn Fn(usize) -> GraphVersion,
    pinned_first: Option<usize>,
) -> JoinPlan {
    let single = ordered.len() == 1;
    let v0 = ordered[0].as_str();
    let v1 = if single { v0 } else { ordered[1].as_str() };

    let mut seed_relations: Vec<usize> = if single {
        graph.self_loops(v0).to_vec()
    } else {
        graph.relations_between(v0, v1).to_vec()
    };
    if let Some(pinned) = pinned_first {
        if let Some(position) = seed_relations.iter().position(|&r| r == pinned) {
            seed_relations.remove(position);
        }
        seed_relations.insert(0, pinned);
    }

    let mut seed_rules = Vec::with_capacity(seed_relations.len());
    for &index in &seed_relations {
        let relation = graph.relation(index);
        let direction = if relation.from == v0 {
            Direction::Forward
        } else {
            Direction::Backward
        };
        seed_rules.push(IntersectionRule::new(
            0,
            direction,
            version_of(index),
            relation.edge_type,
        ));
    }

    let mut seed_loops = Vec::new();
    if !single {
        for (position, variable) in [(0, v0), (1, v1)] {
            for &index in graph.self_loops(variable) {
                let relation = graph.relation(index);
                seed_loops.push(IntersectionRule::new(
                    position,
                    Direction::Forward,
                    version_of(index),
                    relation.edge_type,
                ));
            }
        }
    }

    let mut stages = vec![Stage {
        rules: seed_rules,
        loop_rules: seed_loops,
        to_vertex_filter: graph.variable_filter(v1),
    }];

    for i in 2..ordered.len() {
        let vi = ordered[i].as_str();
        let mut rules = Vec::new();
        for (j, vj) in ordered.iter().enumerate().take(i) {
            for &index in graph.relations_between(vj, vi) {
                let relation = graph.relation(index);
                let direction = if relation.from == *vj {
                    Direction::Forward
                } else {
                    Direction::Backward
                };
                rules.push(IntersectionRule::new(
                    j,
                    direction,
                    version_of(index),
                    relation.edge_type,
                ));
            }
        }
        let loop_rules = graph
            .self_loops(vi)
            .iter()
            .map(|&index| {
                IntersectionRule::new(
                    i,
                    Direction::Forward,
                    version_of(index),
                    graph.relation(index).edge_type,
                )
            })
            .collect();
        stages.push(Stage {
            rules,
            loop_rules,
            to_vertex_filter: graph.variable_filter(vi),
        });
    }

    JoinPlan {
        stages,
        from_vertex_filter: graph.variable_filter(v0),
        equal_seed_endpoints: single,
    }
}

/// Classifies a clause variable, growing the vertex or edge list.
fn note_output_variable(
    name: &str,
    graph: &QueryGraph,
    vertex_vars: &mut Vec<String>,
    edge_vars: &mut Vec<String>,
) -> Result<()> {
    if graph.is_vertex_variable(name) {
        if !vertex_vars.iter().any(|v| v == name) {
            vertex_vars.push(name.to_string());
        }
        Ok(())
    } else if graph.edge_variable_relation(name).is_some() {
        if !edge_vars.iter().any(|v| v == name) {
            edge_vars.push(name.to_string());
        }
        Ok(())
    } else {
        Err(Error::validation(format!(
            "variable {name} is not declared in the pattern"
        )))
    }
}

/// A descriptor over pre-projection columns, for WHERE predicates.
fn filter_descriptor(
    name: &str,
    property: &str,
    graph: &QueryGraph,
    registry: &TypeRegistry,
    positions: &RiffleMap<String, usize>,
    width: usize,
    filter_edge_vars: &[String],
) -> Result<PropertyDescriptor> {
    let key = registry.lookup_property_key(property)?;
    if graph.is_vertex_variable(name) {
        Ok(PropertyDescriptor::vertex_property(positions[name], key))
    } else {
        let offset = filter_edge_vars
            .iter()
            .position(|v| v == name)
            .ok_or_else(|| {
                Error::validation(format!("variable {name} is not declared in the pattern"))
            })?;
        Ok(PropertyDescriptor::edge_property(width + offset, key))
    }
}

/// A descriptor over post-projection columns, for output and grouping.
fn output_descriptor(
    name: &str,
    property: Option<&str>,
    graph: &QueryGraph,
    registry: &TypeRegistry,
    projected: &RiffleMap<String, usize>,
) -> Result<PropertyDescriptor> {
    let position = projected[name];
    let is_vertex = graph.is_vertex_variable(name);
    match property {
        None => Ok(if is_vertex {
            PropertyDescriptor::vertex_id(position)
        } else {
            PropertyDescriptor::edge_id(position)
        }),
        Some(property) => {
            let key = registry.lookup_property_key(property)?;
            Ok(if is_vertex {
                PropertyDescriptor::vertex_property(position, key)
            } else {
                PropertyDescriptor::edge_property(position, key)
            })
        }
    }
}

/// Builds the operator-chain spec a query's clauses demand.
///
/// `identity_order` is the variable order of identity output (no RETURN
/// clause): the plan's own ordering for one-time queries, the canonical
/// ordering for delta plans.
pub(crate) fn build_pipeline_spec(
    query: &StructuredQuery,
    graph: &QueryGraph,
    registry: &TypeRegistry,
    positions: &RiffleMap<String, usize>,
    width: usize,
    identity_order: &[String],
) -> Result<PipelineSpec> {
    // Output-mentioned variables, vertices and edges separately, in
    // mention order.
    let mut vertex_vars: Vec<String> = Vec::new();
    let mut edge_vars: Vec<String> = Vec::new();
    for name in &query.return_variables {
        note_output_variable(name, graph, &mut vertex_vars, &mut edge_vars)?;
    }
    for (name, _) in &query.return_property_pairs {
        note_output_variable(name, graph, &mut vertex_vars, &mut edge_vars)?;
    }
    for aggregation in &query.aggregations {
        if let Some(name) = &aggregation.variable {
            note_output_variable(name, graph, &mut vertex_vars, &mut edge_vars)?;
        }
    }

    // Predicate-mentioned edge variables ride along after the output
    // ones; predicate vertex variables only need to exist.
    let mut filter_edge_vars = edge_vars.clone();
    for predicate in &query.predicates {
        let mut operands = vec![predicate.variable.as_str()];
        if let PredicateRhs::Property(variable, _) = &predicate.rhs {
            operands.push(variable);
        }
        for name in operands {
            if graph.is_vertex_variable(name) {
                continue;
            }
            if graph.edge_variable_relation(name).is_some() {
                if !filter_edge_vars.iter().any(|v| v == name) {
                    filter_edge_vars.push(name.to_string());
                }
            } else {
                return Err(Error::validation(format!(
                    "variable {name} is not declared in the pattern"
                )));
            }
        }
    }

    let edge_lookups = filter_edge_vars
        .iter()
        .map(|name| {
            let relation = graph.relation(
                graph
                    .edge_variable_relation(name)
                    .expect("collected from the pattern"),
            );
            EdgeLookup {
                src_index: positions[&relation.from],
                dst_index: positions[&relation.to],
                edge_type: relation.edge_type,
            }
        })
        .collect::<Vec<_>>();

    let mut filter = Vec::with_capacity(query.predicates.len());
    for predicate in &query.predicates {
        let left = filter_descriptor(
            &predicate.variable,
            &predicate.property,
            graph,
            registry,
            positions,
            width,
            &filter_edge_vars,
        )?;
        let right = match &predicate.rhs {
            PredicateRhs::Literal(value) => PredicateOperand::Literal(value.clone()),
            PredicateRhs::Property(variable, property) => {
                PredicateOperand::Property(filter_descriptor(
                    variable,
                    property,
                    graph,
                    registry,
                    positions,
                    width,
                    &filter_edge_vars,
                )?)
            }
        };
        filter.push(FilterPredicate {
            left,
            op: predicate.op,
            right,
        });
    }

    if !query.has_return_clause() {
        // Identity output: one vertex-ID column per variable.
        let resolvers = identity_order
            .iter()
            .map(|variable| PropertyDescriptor::vertex_id(positions[variable]))
            .collect();
        return Ok(PipelineSpec {
            edge_lookups,
            filter,
            projection: None,
            resolvers,
            aggregation: None,
        });
    }

    // Project onto the mentioned vertex columns, then the mentioned edge
    // columns. Descriptors below address the post-projection layout.
    let mut projection = Vec::new();
    let mut projected: RiffleMap<String, usize> = riffle_map();
    for variable in &vertex_vars {
        projected.insert(variable.clone(), projection.len());
        projection.push(positions[variable]);
    }
    for variable in &edge_vars {
        let offset = filter_edge_vars
            .iter()
            .position(|v| v == variable)
            .expect("output edge variables are collected first");
        projected.insert(variable.clone(), projection.len());
        projection.push(width + offset);
    }

    let mut resolvers = Vec::new();
    for name in &query.return_variables {
        resolvers.push(output_descriptor(name, None, graph, registry, &projected)?);
    }
    for (name, property) in &query.return_property_pairs {
        resolvers.push(output_descriptor(
            name,
            Some(property),
            graph,
            registry,
            &projected,
        )?);
    }

    let aggregation = if query.aggregations.is_empty() {
        None
    } else {
        let mut aggregates = Vec::with_capacity(query.aggregations.len());
        for aggregation in &query.aggregations {
            let descriptor = match &aggregation.variable {
                None => None,
                Some(name) => Some(output_descriptor(
                    name,
                    aggregation.property.as_deref(),
                    graph,
                    registry,
                    &projected,
                )?),
            };
            aggregates.push(AggregateExpr {
                function: aggregation.function,
                descriptor,
            });
        }
        Some(AggregationSpec {
            group_by: resolvers.clone(),
            aggregates,
        })
    };

    Ok(PipelineSpec {
        edge_lookups,
        filter,
        projection: Some(projection),
        resolvers,
        aggregation,
    })
}
