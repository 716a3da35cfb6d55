//! The parsed query structure.
//!
//! A [`StructuredQuery`] is what the parser hands to the planners: an
//! operation, a list of pattern relations, and the optional WHERE, RETURN
//! and FILE clauses. It lives for one planning call and carries no
//! resolved IDs - interning happens at plan (or mutation) time against an
//! injected registry.

use riffle_common::types::Value;
use riffle_core::execution::operators::{AggregateFunction, CompareOp};

/// Which statement kind the query text contained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryOperation {
    /// `CREATE ...;` - stage vertices and edges, then commit.
    Create,
    /// `DELETE ...;` - stage edge deletions, then commit.
    Delete,
    /// `MATCH ...;` - one-time query against the committed graph.
    Match,
    /// `CONTINUOUS MATCH ... FILE '...';` - register a delta query.
    ContinuousMatch,
}

/// One vertex mention inside a pattern.
///
/// In MATCH patterns the name is a variable; in CREATE and DELETE it is a
/// numeric vertex ID.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryVariable {
    /// Variable name or numeric vertex ID.
    pub name: String,
    /// Declared vertex type, if any.
    pub vertex_type: Option<String>,
    /// Properties listed on the vertex (CREATE only).
    pub properties: Vec<(String, Value)>,
}

impl QueryVariable {
    /// A bare variable with no type and no properties.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertex_type: None,
            properties: Vec::new(),
        }
    }
}

/// One directed pattern edge.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryRelation {
    /// Source endpoint.
    pub from: QueryVariable,
    /// Destination endpoint.
    pub to: QueryVariable,
    /// Declared edge type; `None` means any type.
    pub edge_type: Option<String>,
    /// Edge variable, when the query names the edge (`-[e:T]->`).
    pub edge_variable: Option<String>,
    /// Properties listed on the edge (CREATE only).
    pub edge_properties: Vec<(String, Value)>,
}

/// Right-hand side of a WHERE predicate.
#[derive(Clone, Debug, PartialEq)]
pub enum PredicateRhs {
    /// A literal from the query text.
    Literal(Value),
    /// Another `variable.property` operand.
    Property(String, String),
}

/// One `variable.property <op> operand` predicate.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryPropertyPredicate {
    /// Left operand variable.
    pub variable: String,
    /// Left operand property key.
    pub property: String,
    /// The comparison.
    pub op: CompareOp,
    /// Right operand.
    pub rhs: PredicateRhs,
}

/// One aggregation in the RETURN clause.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryAggregation {
    /// The aggregation function.
    pub function: AggregateFunction,
    /// Aggregated variable; `None` only for `COUNT(*)`.
    pub variable: Option<String>,
    /// Aggregated property of the variable, when present.
    pub property: Option<String>,
}

/// The full parsed query.
#[derive(Clone, Debug, PartialEq)]
pub struct StructuredQuery {
    /// The statement kind.
    pub operation: QueryOperation,
    /// Pattern relations, in the order the query text lists them.
    pub relations: Vec<QueryRelation>,
    /// WHERE predicates, conjoined.
    pub predicates: Vec<QueryPropertyPredicate>,
    /// Bare variables in the RETURN clause.
    pub return_variables: Vec<String>,
    /// `variable.property` pairs in the RETURN clause.
    pub return_property_pairs: Vec<(String, String)>,
    /// Aggregations in the RETURN clause.
    pub aggregations: Vec<QueryAggregation>,
    /// Output path of a CONTINUOUS MATCH.
    pub sink_path: Option<String>,
}

impl StructuredQuery {
    /// An empty query of the given operation.
    #[must_use]
    pub fn new(operation: QueryOperation) -> Self {
        Self {
            operation,
            relations: Vec::new(),
            predicates: Vec::new(),
            return_variables: Vec::new(),
            return_property_pairs: Vec::new(),
            aggregations: Vec::new(),
            sink_path: None,
        }
    }

    /// `true` if the RETURN clause requested anything.
    #[must_use]
    pub fn has_return_clause(&self) -> bool {
        !self.return_variables.is_empty()
            || !self.return_property_pairs.is_empty()
            || !self.aggregations.is_empty()
    }
}
