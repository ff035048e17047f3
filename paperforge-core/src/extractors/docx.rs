use super::zip_parts::{open_archive, read_part, run_text};
use super::Extractor;
use crate::error::ExtractionError;
use crate::types::{DocumentFormat, ExtractionResult};
use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;
use tracing::debug;

pub const DOCX_ENGINE: &str = "docx (zip + quick-xml)";

const DOCUMENT_PART: &str = "word/document.xml";
const MIN_DOCX_TEXT_CHARS: usize = 10;

/// Raw paragraph text of a WordprocessingML body, one blank line between paragraphs
pub fn document_text(xml: &str) -> Result<String, quick_xml::Error> {
    let mut reader = XmlReader::from_str(xml);
    reader.trim_text(false);
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"p" => current.clear(),
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" | b"cr" => current.push('\n'),
                _ => {}
            },
            Event::Text(ref t) if in_text => current.push_str(&run_text(t)),
            Event::End(ref e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let paragraph = current.trim_end();
                    if !paragraph.trim().is_empty() {
                        paragraphs.push(paragraph.to_string());
                    }
                    current.clear();
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs.join("\n\n"))
}

/// First strategy for Word uploads, DOCX and legacy DOC alike.
///
/// A legacy DOC is not a ZIP container, so it normally fails to open here and
/// the chain moves on to the binary scanner.
pub struct DocxExtractor {
    format: DocumentFormat,
}

impl DocxExtractor {
    pub fn new(format: DocumentFormat) -> Self {
        Self { format }
    }
}

impl Extractor for DocxExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractionResult, ExtractionError> {
        let mut archive = open_archive(bytes)?;
        let xml = read_part(&mut archive, DOCUMENT_PART).map_err(|e| {
            debug!("No {DOCUMENT_PART} in container: {e}");
            ExtractionError::ContainerEmpty {
                expected: DOCUMENT_PART,
            }
        })?;

        let text = document_text(&xml).map_err(|e| {
            debug!("Malformed {DOCUMENT_PART}: {e}");
            ExtractionError::empty(self.format)
        })?;

        if text.trim().chars().count() < MIN_DOCX_TEXT_CHARS {
            return Err(ExtractionError::empty(self.format));
        }
        Ok(ExtractionResult::new(text, DOCX_ENGINE))
    }

    fn name(&self) -> &str {
        "docx"
    }

    fn supports_format(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Docx | DocumentFormat::Doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

    fn docx_bytes(body: &str) -> Vec<u8> {
        let xml = format!("<w:document xmlns:w=\"{W_NS}\"><w:body>{body}</w:body></w:document>");
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file(DOCUMENT_PART, FileOptions::default()).unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn paragraphs_separated_by_blank_line() {
        let bytes = docx_bytes(
            "<w:p><w:r><w:t>Unit 5</w:t></w:r><w:r><w:t xml:space=\"preserve\"> Food</w:t></w:r></w:p>\
             <w:p/>\
             <w:p><w:r><w:t>apple</w:t><w:tab/><w:t>banana</w:t><w:br/><w:t>milk &amp; bread</w:t></w:r></w:p>",
        );
        let result = DocxExtractor::new(DocumentFormat::Docx).extract(&bytes).unwrap();
        assert_eq!(result.content, "Unit 5 Food\n\napple\tbanana\nmilk & bread");
        assert_eq!(result.metadata.paragraph_count, 2);
        assert_eq!(result.metadata.parse_engine, DOCX_ENGINE);
    }

    #[test]
    fn unknown_entity_keeps_the_paragraph() {
        let bytes = docx_bytes(
            "<w:p><w:r><w:t>Weather&nbsp;words</w:t></w:r></w:p>\
             <w:p><w:r><w:t>sunny &bogus; rainy</w:t></w:r></w:p>",
        );
        let result = DocxExtractor::new(DocumentFormat::Docx).extract(&bytes).unwrap();
        assert_eq!(result.content, "Weather\u{a0}words\n\nsunny &bogus; rainy");
    }

    #[test]
    fn short_body_is_empty_extraction() {
        let bytes = docx_bytes("<w:p><w:r><w:t>Hi</w:t></w:r></w:p>");
        let err = DocxExtractor::new(DocumentFormat::Doc).extract(&bytes).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::ExtractionEmpty {
                format: DocumentFormat::Doc,
                ..
            }
        ));
    }

    #[test]
    fn legacy_doc_is_not_a_container() {
        let ole_header = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0, 0, 0, 0];
        let err = DocxExtractor::new(DocumentFormat::Doc)
            .extract(&ole_header)
            .unwrap_err();
        assert!(err.allows_fallback());
    }
}
