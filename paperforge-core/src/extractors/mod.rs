//! Document text extractors
//!
//! Each extractor is one strategy for turning an uploaded buffer into text.
//! Formats map to an ordered chain of strategies; the processor walks the
//! chain and only moves on when a strategy reports a recoverable failure.
//!
//! ```text
//! DOCX  → [docx]
//! DOC   → [docx, doc scanner]
//! PPTX  → [pptx]
//! PPT   → [ppt-as-zip, ppt scanner]
//! PDF   → [pdf]
//! TXT   → [plain]
//! ```

pub mod binary;
pub mod docx;
pub mod extractor;
pub mod pdf;
pub mod plain;
pub mod pptx;
mod zip_parts;

pub use binary::{DocBinaryExtractor, PptBinaryExtractor};
pub use docx::DocxExtractor;
pub use extractor::Extractor;
pub use pdf::PdfExtractor;
pub use plain::PlainTextExtractor;
pub use pptx::{PptContainerExtractor, PptxExtractor};

use crate::config::PipelineConfig;
use crate::types::DocumentFormat;

/// Ordered strategy chain for a resolved format
pub fn strategy_chain(format: DocumentFormat, config: &PipelineConfig) -> Vec<Box<dyn Extractor>> {
    match format {
        DocumentFormat::Docx => vec![Box::new(DocxExtractor::new(DocumentFormat::Docx))],
        DocumentFormat::Doc => vec![
            Box::new(DocxExtractor::new(DocumentFormat::Doc)),
            Box::new(DocBinaryExtractor::new(config.scanner.clone())),
        ],
        DocumentFormat::Pptx => vec![Box::new(PptxExtractor::new(config.include_speaker_notes))],
        DocumentFormat::Ppt => vec![
            Box::new(PptContainerExtractor::new(config.include_speaker_notes)),
            Box::new(PptBinaryExtractor::new(config.scanner.clone())),
        ],
        DocumentFormat::Pdf => vec![Box::new(PdfExtractor)],
        DocumentFormat::PlainText => vec![Box::new(PlainTextExtractor)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_strategy_supports_its_format() {
        let config = PipelineConfig::default();
        for format in [
            DocumentFormat::Docx,
            DocumentFormat::Doc,
            DocumentFormat::Pptx,
            DocumentFormat::Ppt,
            DocumentFormat::Pdf,
            DocumentFormat::PlainText,
        ] {
            let chain = strategy_chain(format, &config);
            assert!(!chain.is_empty());
            for strategy in &chain {
                assert!(
                    strategy.supports_format(format),
                    "{} does not support {format}",
                    strategy.name()
                );
            }
        }
    }

    #[test]
    fn legacy_formats_end_with_the_scanner() {
        let config = PipelineConfig::default();
        let doc = strategy_chain(DocumentFormat::Doc, &config);
        assert_eq!(doc.last().map(|s| s.name()), Some("doc-binary-scanner"));
        let ppt = strategy_chain(DocumentFormat::Ppt, &config);
        assert_eq!(ppt.first().map(|s| s.name()), Some("ppt-as-zip"));
        assert_eq!(ppt.last().map(|s| s.name()), Some("ppt-binary-scanner"));
    }
}
