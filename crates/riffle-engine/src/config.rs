//! Engine configuration.

use riffle_core::execution::generic_join::DEFAULT_BATCH_SIZE;

/// Engine configuration.
///
/// The defaults work for most cases; the batch size is an executor tuning
/// knob with no externally observable effect on query output.
#[derive(Debug, Clone)]
pub struct Config {
    /// How many extended prefixes the executor buffers before recursing
    /// into the next stage.
    pub batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl Config {
    /// A configuration with the given executor batch size.
    #[must_use]
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }
}
