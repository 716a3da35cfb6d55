//! The main database struct and query dispatch.
//!
//! Start here with [`RiffleDB`] - it owns the graph store, the type
//! registry and every registered continuous query, and serializes reads
//! and writes through one lock so no query ever observes a half-applied
//! commit.

use std::fmt;

use parking_lot::RwLock;

use riffle_common::types::{TypeId, Value, VertexId};
use riffle_common::utils::error::{Error, Result};
use riffle_core::execution::operators::{
    EdgeIdResolver, Filter, GroupByAndAggregate, Operator, Projection, PropertyResolver,
};
use riffle_core::execution::rule::JoinPlan;
use riffle_core::execution::{GenericJoinExecutor, MatchOutputTag};
use riffle_core::graph::GraphStore;
use riffle_core::sink::{FileSink, InMemorySink, OutputSink};
use riffle_core::TypeRegistry;

use crate::config::Config;
use crate::query::parser;
use crate::query::planner::{
    ContinuousMatchPlan, ContinuousMatchPlanner, OneTimeMatchPlanner, PipelineSpec,
};
use crate::query::structured::{QueryOperation, StructuredQuery};

/// What a query returned.
#[derive(Debug)]
pub enum QueryOutput {
    /// A mutation's summary line.
    Mutation {
        /// Human-readable description of what changed.
        message: String,
    },
    /// The tagged rows of a one-time MATCH.
    Rows(Vec<(MatchOutputTag, Vec<Value>)>),
    /// Confirmation that a continuous query is now registered.
    Registered {
        /// Where its output goes.
        path: String,
    },
}

impl QueryOutput {
    /// The rows of a MATCH result; empty for other outputs.
    #[must_use]
    pub fn rows(&self) -> &[(MatchOutputTag, Vec<Value>)] {
        match self {
            QueryOutput::Rows(rows) => rows,
            _ => &[],
        }
    }
}

impl fmt::Display for QueryOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOutput::Mutation { message } => f.write_str(message),
            QueryOutput::Rows(rows) => {
                for (index, (tag, row)) in rows.iter().enumerate() {
                    if index > 0 {
                        writeln!(f)?;
                    }
                    f.write_str(&riffle_core::sink::render_row(*tag, row))?;
                }
                Ok(())
            }
            QueryOutput::Registered { path } => {
                write!(f, "continuous match registered, output to {path}")
            }
        }
    }
}

/// A continuous query and the sink its deltas stream into.
struct RegisteredQuery {
    plan: ContinuousMatchPlan,
    sink: FileSink,
}

/// Everything behind the lock.
struct EngineState {
    store: GraphStore,
    registry: TypeRegistry,
    continuous: Vec<RegisteredQuery>,
}

/// Your handle to a Riffle database.
///
/// # Examples
///
/// ```
/// use riffle_engine::RiffleDB;
///
/// let db = RiffleDB::new();
/// db.execute("CREATE (0)->(1),(1)->(2),(2)->(0);")?;
/// let result = db.execute("MATCH (a)->(b),(b)->(c),(c)->(a);")?;
/// assert_eq!(result.rows().len(), 3);
/// # Ok::<(), riffle_common::Error>(())
/// ```
pub struct RiffleDB {
    config: Config,
    state: RwLock<EngineState>,
}

impl RiffleDB {
    /// Creates an empty in-memory database with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a database with custom configuration.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            state: RwLock::new(EngineState {
                store: GraphStore::new(),
                registry: TypeRegistry::new(),
                continuous: Vec::new(),
            }),
        }
    }

    /// Parses and executes one statement.
    ///
    /// Mutations take the write lock; MATCH takes the read lock and plans
    /// and executes under one guard, so the graph cannot move between
    /// plan and execute.
    ///
    /// # Errors
    ///
    /// Parse and validation failures reject the query and leave the store
    /// untouched.
    pub fn execute(&self, text: &str) -> Result<QueryOutput> {
        let query = parser::parse(text)?;
        match query.operation {
            QueryOperation::Create => self.execute_create(&query),
            QueryOperation::Delete => self.execute_delete(&query),
            QueryOperation::Match => self.execute_match(&query),
            QueryOperation::ContinuousMatch => self.register_continuous(&query),
        }
    }

    /// Verifies the store's forward/backward mirror invariant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Inconsistency`] if the indexes disagree.
    pub fn check_consistency(&self) -> Result<()> {
        self.state.read().store.check_consistency()
    }

    fn execute_create(&self, query: &StructuredQuery) -> Result<QueryOutput> {
        let mut state = self.state.write();
        let mut edges_created = 0usize;

        for relation in &query.relations {
            let src = parse_vertex_id(&relation.from.name)?;
            let dst = parse_vertex_id(&relation.to.name)?;

            for (endpoint, vertex) in [(&relation.from, src), (&relation.to, dst)] {
                if let Some(vertex_type) = &endpoint.vertex_type {
                    let type_id = state.registry.intern_type(vertex_type)?;
                    state.store.set_vertex_type(vertex, type_id);
                }
                for (key, value) in &endpoint.properties {
                    let key_id = state.registry.intern_property_key(key)?;
                    state.store.set_vertex_property(vertex, key_id, value.clone());
                }
            }

            let edge_type = match &relation.edge_type {
                Some(name) => state.registry.intern_type(name)?,
                None => TypeId::ANY,
            };
            let edge = state.store.add_edge(src, dst, edge_type)?;
            for (key, value) in &relation.edge_properties {
                let key_id = state.registry.intern_property_key(key)?;
                state.store.set_edge_property(edge, key_id, value.clone());
            }
            edges_created += 1;
        }

        run_continuous(&mut state, self.config.batch_size)?;
        state.store.commit();
        debug_assert!(state.store.check_consistency().is_ok());

        Ok(QueryOutput::Mutation {
            message: format!("{edges_created} edges created"),
        })
    }

    fn execute_delete(&self, query: &StructuredQuery) -> Result<QueryOutput> {
        let mut state = self.state.write();
        let mut edges_deleted = 0usize;

        for relation in &query.relations {
            let src = parse_vertex_id(&relation.from.name)?;
            let dst = parse_vertex_id(&relation.to.name)?;
            let edge_type = state
                .registry
                .lookup_type(relation.edge_type.as_deref())?;
            edges_deleted += state.store.delete_edge(src, dst, edge_type);
        }

        run_continuous(&mut state, self.config.batch_size)?;
        state.store.commit();
        debug_assert!(state.store.check_consistency().is_ok());

        Ok(QueryOutput::Mutation {
            message: format!("{edges_deleted} edges deleted"),
        })
    }

    fn execute_match(&self, query: &StructuredQuery) -> Result<QueryOutput> {
        let state = self.state.read();
        let plan = OneTimeMatchPlanner::new(query, &state.registry).plan()?;

        let mut sink = InMemorySink::new();
        run_join_plan(
            &plan.join,
            &plan.pipeline,
            &state.store,
            &mut sink,
            self.config.batch_size,
        )?;
        Ok(QueryOutput::Rows(sink.into_rows()))
    }

    fn register_continuous(&self, query: &StructuredQuery) -> Result<QueryOutput> {
        let mut state = self.state.write();
        let plan = ContinuousMatchPlanner::new(query, &state.registry).plan()?;
        let path = query
            .sink_path
            .clone()
            .ok_or_else(|| Error::validation("CONTINUOUS MATCH requires a FILE clause"))?;
        let sink = FileSink::create(&path)?;
        state.continuous.push(RegisteredQuery { plan, sink });
        tracing::debug!(path, "registered continuous MATCH");
        Ok(QueryOutput::Registered { path })
    }
}

impl Default for RiffleDB {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs every registered delta plan against the staged diffs, before the
/// mutation commits.
fn run_continuous(state: &mut EngineState, batch_size: usize) -> Result<()> {
    if state.continuous.is_empty() || !state.store.has_staged_changes() {
        return Ok(());
    }
    let store = &state.store;
    for registered in &mut state.continuous {
        for delta in &registered.plan.delta_plans {
            run_join_plan(
                &delta.emerged,
                &delta.pipeline,
                store,
                &mut registered.sink,
                batch_size,
            )?;
            run_join_plan(
                &delta.deleted,
                &delta.pipeline,
                store,
                &mut registered.sink,
                batch_size,
            )?;
        }
    }
    Ok(())
}

/// Instantiates the operator chain a pipeline spec describes and streams
/// one join plan through it.
fn run_join_plan(
    join: &JoinPlan,
    pipeline: &PipelineSpec,
    store: &GraphStore,
    sink: &mut dyn OutputSink,
    batch_size: usize,
) -> Result<()> {
    let mut chain: Box<dyn Operator + '_> = match &pipeline.aggregation {
        Some(spec) => Box::new(GroupByAndAggregate::new(
            spec.group_by.clone(),
            spec.aggregates.clone(),
            store,
            sink,
        )),
        None => Box::new(PropertyResolver::new(
            pipeline.resolvers.clone(),
            store,
            sink,
        )),
    };
    if let Some(indices) = &pipeline.projection {
        chain = Box::new(Projection::new(indices.clone(), chain));
    }
    if !pipeline.filter.is_empty() {
        chain = Box::new(Filter::new(pipeline.filter.clone(), store, chain));
    }
    if !pipeline.edge_lookups.is_empty() {
        chain = Box::new(EdgeIdResolver::new(
            pipeline.edge_lookups.clone(),
            store,
            chain,
        ));
    }

    let mut executor = GenericJoinExecutor::new(join, store)?.with_batch_size(batch_size);
    executor.execute(chain.as_mut())?;
    chain.finish()
}

/// CREATE and DELETE patterns name vertices by dense numeric ID.
fn parse_vertex_id(name: &str) -> Result<VertexId> {
    name.parse::<u32>().map(VertexId::new).map_err(|_| {
        Error::validation(format!(
            "vertex {name:?} must be a non-negative integer ID in CREATE and DELETE"
        ))
    })
}
