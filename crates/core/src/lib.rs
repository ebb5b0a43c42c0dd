//! Core errors and diagnostics shared by the `gfxswap` crates.
//!
//! - **`errors`**: the primary `Error` enum and `Result` alias. Only operations
//!   that touch swap files or configuration can fail; the cache manager itself
//!   is infallible.
//! - **`tracing`**: subscriber setup for binaries. Libraries only emit events.

pub mod errors;
pub mod tracing;

pub use self::errors::{Error, Result};
