//! The undirected view of a MATCH pattern, as the planners consume it.

use riffle_common::collections::{riffle_map, RiffleMap, RiffleSet};
use riffle_common::types::TypeId;
use riffle_common::utils::error::{Error, Result};
use riffle_core::TypeRegistry;

use super::structured::{QueryRelation, StructuredQuery};

/// A pattern relation with every type string resolved through the
/// registry.
#[derive(Clone, Debug)]
pub struct ResolvedRelation {
    /// Source variable name.
    pub from: String,
    /// Destination variable name.
    pub to: String,
    /// Resolved edge type, or `TypeId::ANY`.
    pub edge_type: TypeId,
    /// Edge variable, when the query names the edge.
    pub edge_variable: Option<String>,
}

impl ResolvedRelation {
    /// `true` when both endpoints are the same variable.
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// Variable-to-variable adjacency over the pattern relations.
///
/// Built by validating a [`StructuredQuery`] against a registry: every
/// type string must already be interned, variable types must be declared
/// consistently, and the pattern must be non-empty and connected. No
/// partial graph escapes a failed validation.
#[derive(Debug)]
pub struct QueryGraph {
    relations: Vec<ResolvedRelation>,
    adjacency: RiffleMap<String, RiffleMap<String, Vec<usize>>>,
    variable_filters: RiffleMap<String, TypeId>,
    edge_variables: RiffleMap<String, usize>,
}

impl QueryGraph {
    /// Validates a structured query and builds its graph.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyPlan`] for a pattern with no edges;
    /// [`Error::NoSuchType`] for a type never interned;
    /// [`Error::Validation`] for conflicting variable types, edge-variable
    /// collisions, or a disconnected pattern.
    pub fn build(query: &StructuredQuery, registry: &TypeRegistry) -> Result<Self> {
        if query.relations.is_empty() {
            return Err(Error::EmptyPlan);
        }

        let mut graph = Self {
            relations: Vec::with_capacity(query.relations.len()),
            adjacency: riffle_map(),
            variable_filters: riffle_map(),
            edge_variables: riffle_map(),
        };

        for relation in &query.relations {
            graph.add_relation(relation, registry)?;
        }

        for edge_variable in graph.edge_variables.keys() {
            if graph.adjacency.contains_key(edge_variable) {
                return Err(Error::validation(format!(
                    "name {edge_variable} is used for both a vertex and an edge variable"
                )));
            }
        }

        graph.check_connected()?;
        Ok(graph)
    }

    fn add_relation(&mut self, relation: &QueryRelation, registry: &TypeRegistry) -> Result<()> {
        let index = self.relations.len();
        let edge_type = registry.lookup_type(relation.edge_type.as_deref())?;

        for endpoint in [&relation.from, &relation.to] {
            if let Some(vertex_type) = &endpoint.vertex_type {
                let resolved = registry.lookup_type(Some(vertex_type))?;
                let previous = self
                    .variable_filters
                    .insert(endpoint.name.clone(), resolved);
                if previous.is_some_and(|p| p != resolved) {
                    return Err(Error::validation(format!(
                        "variable {} is declared with conflicting types",
                        endpoint.name
                    )));
                }
            }
        }

        let from = relation.from.name.clone();
        let to = relation.to.name.clone();
        self.adjacency
            .entry(from.clone())
            .or_insert_with(riffle_map)
            .entry(to.clone())
            .or_default()
            .push(index);
        if from != to {
            self.adjacency
                .entry(to.clone())
                .or_insert_with(riffle_map)
                .entry(from.clone())
                .or_default()
                .push(index);
        }

        if let Some(edge_variable) = &relation.edge_variable {
            if self
                .edge_variables
                .insert(edge_variable.clone(), index)
                .is_some()
            {
                return Err(Error::validation(format!(
                    "edge variable {edge_variable} is declared twice"
                )));
            }
        }

        self.relations.push(ResolvedRelation {
            from,
            to,
            edge_type,
            edge_variable: relation.edge_variable.clone(),
        });
        Ok(())
    }

    fn check_connected(&self) -> Result<()> {
        let start = &self.relations[0].from;
        let mut visited: RiffleSet<&str> = RiffleSet::default();
        let mut frontier = vec![start.as_str()];
        while let Some(variable) = frontier.pop() {
            if !visited.insert(variable) {
                continue;
            }
            if let Some(neighbors) = self.adjacency.get(variable) {
                frontier.extend(neighbors.keys().map(String::as_str));
            }
        }
        if visited.len() != self.variable_count() {
            return Err(Error::validation(
                "the pattern is not connected; every variable must be reachable",
            ));
        }
        Ok(())
    }

    /// Number of distinct variables.
    #[must_use]
    pub fn variable_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Variable names in lexicographic order, for deterministic
    /// iteration.
    #[must_use]
    pub fn variables_sorted(&self) -> Vec<&String> {
        let mut variables: Vec<&String> = self.adjacency.keys().collect();
        variables.sort();
        variables
    }

    /// Number of pattern edges incident to a variable.
    #[must_use]
    pub fn degree(&self, variable: &str) -> usize {
        self.adjacency
            .get(variable)
            .map_or(0, |n| n.values().map(Vec::len).sum())
    }

    /// The variables sharing at least one relation with `variable`.
    #[must_use]
    pub fn neighbor_variables(&self, variable: &str) -> Vec<&String> {
        self.adjacency
            .get(variable)
            .map(|n| n.keys().collect())
            .unwrap_or_default()
    }

    /// Relation indices between two variables (in pattern order).
    #[must_use]
    pub fn relations_between(&self, a: &str, b: &str) -> &[usize] {
        self.adjacency
            .get(a)
            .and_then(|n| n.get(b))
            .map_or(&[], Vec::as_slice)
    }

    /// The resolved relation at `index`.
    #[must_use]
    pub fn relation(&self, index: usize) -> &ResolvedRelation {
        &self.relations[index]
    }

    /// Number of pattern relations.
    #[must_use]
    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// The vertex-type filter declared for a variable, or `TypeId::ANY`.
    #[must_use]
    pub fn variable_filter(&self, variable: &str) -> TypeId {
        self.variable_filters
            .get(variable)
            .copied()
            .unwrap_or(TypeId::ANY)
    }

    /// The relation an edge variable names, if any.
    #[must_use]
    pub fn edge_variable_relation(&self, name: &str) -> Option<usize> {
        self.edge_variables.get(name).copied()
    }

    /// `true` if `name` is a vertex variable of the pattern.
    #[must_use]
    pub fn is_vertex_variable(&self, name: &str) -> bool {
        self.adjacency.contains_key(name)
    }

    /// Self-loop relation indices on a variable.
    #[must_use]
    pub fn self_loops(&self, variable: &str) -> &[usize] {
        self.relations_between(variable, variable)
    }
}
