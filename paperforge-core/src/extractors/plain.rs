use super::Extractor;
use crate::error::ExtractionError;
use crate::types::{DocumentFormat, ExtractionResult};

pub const PLAIN_TEXT_ENGINE: &str = "plain text";

/// `text/plain` uploads: lossy UTF-8, nothing else
pub struct PlainTextExtractor;

impl Extractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractionResult, ExtractionError> {
        let text = String::from_utf8_lossy(bytes).into_owned();
        Ok(ExtractionResult::new(text, PLAIN_TEXT_ENGINE))
    }

    fn name(&self) -> &str {
        "plain-text"
    }

    fn supports_format(&self, format: DocumentFormat) -> bool {
        format == DocumentFormat::PlainText
    }
}
