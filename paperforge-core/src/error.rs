//! Error taxonomy for the extraction pipeline.
//!
//! Every variant renders as a user-facing message that names a corrective
//! action, because the upload boundary returns `to_string()` verbatim.

use crate::types::DocumentFormat;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Declared MIME type and file extension both unrecognised
    #[error("unsupported file format ({mime}, {file_name}); upload a DOCX, DOC, PPTX, PPT or PDF file")]
    UnsupportedFormat { mime: String, file_name: String },

    #[error("file is {size} bytes, which exceeds the {limit} byte upload limit")]
    FileTooLarge { size: u64, limit: u64 },

    /// The upload stream was cut off at the body limit, so its size is unknown
    #[error("file exceeds the {limit} byte upload limit")]
    UploadTooLarge { limit: u64 },

    /// The buffer is not a readable ZIP container
    #[error("could not open the document container: {reason}")]
    ContainerOpenFailed { reason: String },

    /// The container opened but holds none of the expected parts
    #[error("the document container has no {expected} parts")]
    ContainerEmpty { expected: &'static str },

    /// A strategy ran but found nothing worth keeping
    #[error("no readable text could be recovered from the {format} file; {hint}")]
    ExtractionEmpty {
        format: DocumentFormat,
        hint: &'static str,
    },

    #[error("the document content looks garbled; the file may be corrupted or in an unsupported encoding, please check that it opens normally")]
    GarbledContent,

    #[error("not enough readable text was extracted ({length} characters); make sure the document contains text and is not a scanned image")]
    InsufficientContent { length: usize },

    #[error("PDF text extraction failed: {reason}")]
    Pdf { reason: String },
}

impl ExtractionError {
    /// Whether the orchestrator may move on to the next strategy in a chain.
    pub fn allows_fallback(&self) -> bool {
        matches!(
            self,
            ExtractionError::ContainerOpenFailed { .. }
                | ExtractionError::ContainerEmpty { .. }
                | ExtractionError::ExtractionEmpty { .. }
        )
    }

    /// Rejections decided from the request alone, before any parsing.
    pub fn is_request_rejection(&self) -> bool {
        matches!(
            self,
            ExtractionError::UnsupportedFormat { .. }
                | ExtractionError::FileTooLarge { .. }
                | ExtractionError::UploadTooLarge { .. }
        )
    }

    pub(crate) fn empty(format: DocumentFormat) -> Self {
        ExtractionError::ExtractionEmpty {
            format,
            hint: format.conversion_hint(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_only_on_strategy_failures() {
        assert!(ExtractionError::ContainerOpenFailed {
            reason: "invalid Zip archive".into()
        }
        .allows_fallback());
        assert!(ExtractionError::empty(DocumentFormat::Doc).allows_fallback());
        assert!(!ExtractionError::GarbledContent.allows_fallback());
        assert!(!ExtractionError::Pdf {
            reason: "bad xref".into()
        }
        .allows_fallback());
    }

    #[test]
    fn empty_doc_message_suggests_conversion() {
        let message = ExtractionError::empty(DocumentFormat::Doc).to_string();
        assert!(message.contains("DOCX"), "{message}");
    }

    #[test]
    fn size_rejection_is_request_level() {
        let err = ExtractionError::FileTooLarge {
            size: 5_000_000,
            limit: 4_194_304,
        };
        assert!(err.is_request_rejection());
        assert!(err.to_string().contains("4194304"));

        let cut_off = ExtractionError::UploadTooLarge { limit: 4_194_304 };
        assert!(cut_off.is_request_rejection());
        assert!(cut_off.to_string().contains("exceeds the 4194304 byte upload limit"));
    }
}
