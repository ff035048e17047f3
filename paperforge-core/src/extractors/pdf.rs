use super::Extractor;
use crate::error::ExtractionError;
use crate::types::{DocumentFormat, ExtractionResult};
use tracing::debug;

pub const PDF_ENGINE: &str = "pdf-extract";

/// Text layer of a PDF via `pdf-extract`.
///
/// The crate can panic on malformed input, so the call is fenced with
/// `catch_unwind` and a panic is reported as an ordinary extraction error.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    }));

    match outcome {
        Ok(Ok(text)) => {
            debug!("PDF extracted with pdf-extract: {} chars", text.len());
            Ok(text)
        }
        Ok(Err(e)) => Err(ExtractionError::Pdf {
            reason: e.to_string(),
        }),
        Err(_) => Err(ExtractionError::Pdf {
            reason: "the PDF appears to be malformed".to_string(),
        }),
    }
}

pub struct PdfExtractor;

impl Extractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractionResult, ExtractionError> {
        let text = extract_pdf_text(bytes)?;
        Ok(ExtractionResult::new(text, PDF_ENGINE))
    }

    fn name(&self) -> &str {
        "pdf"
    }

    fn supports_format(&self, format: DocumentFormat) -> bool {
        format == DocumentFormat::Pdf
    }
}
