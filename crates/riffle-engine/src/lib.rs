//! The Riffle engine: query text in, tagged tuples out.
//!
//! Start with [`RiffleDB`] - it owns the graph store and registry, parses
//! the restricted Cypher subset, plans one-time and continuous MATCH
//! queries, and runs them through the generic-join executor in
//! `riffle_core`.

pub mod config;
pub mod database;
pub mod query;

pub use config::Config;
pub use database::{QueryOutput, RiffleDB};
