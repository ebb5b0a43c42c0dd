//! Core error types

/// Result type alias for gfxswap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for gfxswap operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// I/O on a graphic swap file
    #[error("swap file {operation} failed: {source}")]
    SwapIo {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Encoding or decoding a payload into its swap file
    #[error("failed to {operation} swapped payload: {source}")]
    SwapCodec {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The graphic has nothing materialised and nothing to restore from
    #[error("graphic {id} has no payload available")]
    NotAvailable { id: u64 },

    /// Tracing subscriber installation
    #[error("failed to initialise tracing: {message}")]
    Tracing { message: String },
}

impl Error {
    /// Whether the error originated from the swap file layer
    #[must_use]
    pub const fn is_swap_failure(&self) -> bool {
        matches!(self, Self::SwapIo { .. } | Self::SwapCodec { .. })
    }
}
