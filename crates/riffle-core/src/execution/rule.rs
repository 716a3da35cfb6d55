//! Generic-join plans: stages of intersection rules.

use riffle_common::types::TypeId;

use crate::graph::{Direction, GraphVersion};

/// One relation's contribution to extending a prefix.
///
/// The candidate set this rule proposes for a prefix is
/// `Adj(prefix[prefix_index], direction, version, edge_type)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntersectionRule {
    /// Which bound position of the prefix to extend from.
    pub prefix_index: usize,
    /// Forward if the pattern edge leaves the bound position, backward if
    /// it enters it.
    pub direction: Direction,
    /// Which graph view the rule ranges over.
    pub version: GraphVersion,
    /// Declared edge type, or `TypeId::ANY`.
    pub edge_type: TypeId,
}

impl IntersectionRule {
    /// Creates a rule.
    #[must_use]
    pub fn new(
        prefix_index: usize,
        direction: Direction,
        version: GraphVersion,
        edge_type: TypeId,
    ) -> Self {
        Self {
            prefix_index,
            direction,
            version,
            edge_type,
        }
    }
}

/// The rules that bind one more variable.
///
/// Stage 0 is the seed: its first rule is enumerated to produce the initial
/// length-2 prefixes and its remaining rules filter them. Every later stage
/// intersects its rules' adjacency lists to extend each prefix by one
/// vertex.
#[derive(Clone, Debug, Default)]
pub struct Stage {
    /// Intersection rules between the new variable and bound variables.
    pub rules: Vec<IntersectionRule>,
    /// Self-loop constraints that become checkable at this stage: the
    /// vertex at `prefix_index` must have an edge to itself under the
    /// rule's version and type.
    pub loop_rules: Vec<IntersectionRule>,
    /// Vertex-type filter on the newly bound variable, or `TypeId::ANY`.
    pub to_vertex_filter: TypeId,
}

impl Stage {
    /// Creates a stage with no loop rules and no vertex-type filter.
    #[must_use]
    pub fn new(rules: Vec<IntersectionRule>) -> Self {
        Self {
            rules,
            loop_rules: Vec::new(),
            to_vertex_filter: TypeId::ANY,
        }
    }
}

/// A compiled generic-join plan.
#[derive(Clone, Debug, Default)]
pub struct JoinPlan {
    /// The stages, seed first. A valid plan has at least one stage and a
    /// non-empty seed rule list.
    pub stages: Vec<Stage>,
    /// Vertex-type filter on the first bound variable, or `TypeId::ANY`.
    pub from_vertex_filter: TypeId,
    /// The seed binds the same variable twice (a self-loop pattern edge);
    /// only edges with equal endpoints become prefixes.
    pub equal_seed_endpoints: bool,
}

impl JoinPlan {
    /// Creates a plan over the given stages.
    #[must_use]
    pub fn new(stages: Vec<Stage>) -> Self {
        Self {
            stages,
            from_vertex_filter: TypeId::ANY,
            equal_seed_endpoints: false,
        }
    }
}
