//! Common utilities used throughout Riffle.
//!
//! - [`error`] - The crate-wide [`Error`](error::Error) and
//!   [`Result`](error::Result) types

pub mod error;

pub use error::{Error, Result};
