//! Query execution: the generic-join executor and the operator pipeline
//! that post-processes its tuples.

pub mod generic_join;
pub mod operators;
pub mod rule;

pub use generic_join::{GenericJoinExecutor, JoinStats};
pub use rule::{IntersectionRule, JoinPlan, Stage};

use smallvec::SmallVec;
use std::fmt;

/// How a completed tuple relates to the graph delta that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchOutputTag {
    /// Found by a one-time MATCH against the current graph.
    Matched,
    /// Appeared because of staged additions.
    Emerged,
    /// Disappeared because of staged deletions.
    Deleted,
}

impl MatchOutputTag {
    /// The tag's wire name, as written by the file sink.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            MatchOutputTag::Matched => "MATCHED",
            MatchOutputTag::Emerged => "EMERGED",
            MatchOutputTag::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for MatchOutputTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A partial or completed match: vertex IDs in variable order, with any
/// resolved edge IDs appended after them.
///
/// Small patterns stay inline; longer ones spill to the heap.
pub type MatchTuple = SmallVec<[u32; 8]>;

/// A batch of tuples flowing through the operator pipeline, all under the
/// same output tag.
#[derive(Clone, Debug)]
pub struct TupleBatch {
    /// The tag of every tuple in the batch.
    pub tag: MatchOutputTag,
    /// The tuples, in the executor's depth-first emission order.
    pub tuples: Vec<MatchTuple>,
}

impl TupleBatch {
    /// Creates a batch.
    #[must_use]
    pub fn new(tag: MatchOutputTag, tuples: Vec<MatchTuple>) -> Self {
        Self { tag, tuples }
    }
}
