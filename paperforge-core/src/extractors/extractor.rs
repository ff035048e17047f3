// Extractor abstraction for uploaded documents
//
// This is the boundary between format-specific parsing (bytes -> text) and the
// format-agnostic cleanup stages (classifier, normalizer, length cap).

use crate::error::ExtractionError;
use crate::types::{DocumentFormat, ExtractionResult};

/// One strategy for pulling text out of an uploaded buffer.
///
/// Implementations are stateless apart from their configuration, so a single
/// instance can serve concurrent requests.
pub trait Extractor: Send + Sync {
    /// Extract text from the raw bytes.
    ///
    /// Recoverable failures (`ContainerOpenFailed`, `ContainerEmpty`,
    /// `ExtractionEmpty`) let the caller try the next strategy in the chain.
    fn extract(&self, bytes: &[u8]) -> Result<ExtractionResult, ExtractionError>;

    /// Extractor name for debugging/logging
    fn name(&self) -> &str;

    fn supports_format(&self, format: DocumentFormat) -> bool;
}
