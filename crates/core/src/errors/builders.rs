//! Builder methods for creating errors with context

use super::types::Error;

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a swap file I/O error
    #[must_use]
    pub fn swap_io(operation: &'static str, source: std::io::Error) -> Self {
        Error::SwapIo { operation, source }
    }

    /// Create a swap payload encoding/decoding error
    #[must_use]
    pub fn swap_codec(
        operation: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::SwapCodec {
            operation,
            source: source.into(),
        }
    }

    /// Create a not-available error for the graphic with the given id
    #[must_use]
    pub fn not_available(id: u64) -> Self {
        Error::NotAvailable { id }
    }

    /// Create a tracing initialisation error
    #[must_use]
    pub fn tracing(message: impl Into<String>) -> Self {
        Error::Tracing {
            message: message.into(),
        }
    }
}
