//! Pluggable output sinks.
//!
//! The pipeline's terminal operators write tagged rows through the
//! [`OutputSink`] trait. [`InMemorySink`] retains everything for callers
//! and tests; [`FileSink`] streams the human-readable one-line-per-tuple
//! format used by continuous queries.

mod file;
mod in_memory;

pub use file::FileSink;
pub use in_memory::InMemorySink;

use riffle_common::types::Value;
use riffle_common::utils::error::Result;

use crate::execution::MatchOutputTag;

/// Where resolved output rows go.
pub trait OutputSink {
    /// Appends one tagged row.
    ///
    /// # Errors
    ///
    /// Propagates I/O failures from writing sinks.
    fn append(&mut self, tag: MatchOutputTag, row: &[Value]) -> Result<()>;
}

/// Renders a row the way the file sink writes it: space-separated fields
/// followed by the tag name.
#[must_use]
pub fn render_row(tag: MatchOutputTag, row: &[Value]) -> String {
    let mut line = String::new();
    for value in row {
        line.push_str(&value.to_string());
        line.push(' ');
    }
    line.push_str(tag.name());
    line
}
