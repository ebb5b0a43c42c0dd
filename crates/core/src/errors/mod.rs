//! Error handling for gfxswap
//!
//! Errors are only produced by fallible edges: configuration installation and
//! swap-file I/O. Accounting and eviction never fail.

mod builders;
mod types;

pub use types::{Error, Result};
