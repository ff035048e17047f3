use super::zip_parts::{entry_names, numbered_parts, open_archive, read_part, run_text, Archive};
use super::Extractor;
use crate::error::ExtractionError;
use crate::types::{DocumentFormat, ExtractionResult};
use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;
use tracing::{debug, warn};

pub const PPTX_ENGINE: &str = "zip + quick-xml";
pub const PPT_AS_ZIP_ENGINE: &str = "zip (PPT as ZIP)";

const SLIDE_PREFIX: &str = "ppt/slides/slide";
const NOTES_PREFIX: &str = "ppt/notesSlides/notesSlide";
const PART_SUFFIX: &str = ".xml";

/// Collect the text runs (`<a:t>`) of one slide or notes part.
///
/// Each run is trimmed, empty runs are dropped, and the rest are joined with
/// newlines. Unknown entities leave their run undecoded but keep the part.
pub fn slide_text(xml: &str) -> Result<String, quick_xml::Error> {
    let mut reader = XmlReader::from_str(xml);
    reader.trim_text(false);
    let mut buf = Vec::new();
    let mut runs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) if e.local_name().as_ref() == b"t" => {
                in_text = true;
                current.clear();
            }
            Event::End(ref e) if e.local_name().as_ref() == b"t" => {
                in_text = false;
                let run = current.trim();
                if !run.is_empty() {
                    runs.push(run.to_string());
                }
            }
            Event::Text(ref t) if in_text => current.push_str(&run_text(t)),
            Event::CData(ref c) if in_text => current.push_str(&String::from_utf8_lossy(c)),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(runs.join("\n"))
}

fn read_part_text(archive: &mut Archive<'_>, name: &str) -> Option<String> {
    let xml = match read_part(archive, name) {
        Ok(xml) => xml,
        Err(e) => {
            warn!("⚠️  Skipping unreadable part {name}: {e}");
            return None;
        }
    };
    match slide_text(&xml) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!("⚠️  Skipping malformed part {name}: {e}");
            None
        }
    }
}

/// Parse a PresentationML container into labelled slide blocks.
///
/// Slides are numbered by the order they yield text, so an empty slide takes
/// no number. Speaker notes keep the index from their part name.
pub fn extract_pptx(bytes: &[u8], include_notes: bool) -> Result<ExtractionResult, ExtractionError> {
    let mut archive = open_archive(bytes)?;
    let names = entry_names(&archive);

    let slides = numbered_parts(&names, SLIDE_PREFIX, PART_SUFFIX);
    if slides.is_empty() {
        return Err(ExtractionError::ContainerEmpty { expected: "slide" });
    }
    debug!("Found {} slide parts", slides.len());

    let mut blocks = Vec::new();
    let mut slide_count = 0;

    for (_, name) in &slides {
        let Some(text) = read_part_text(&mut archive, name) else {
            continue;
        };
        if text.trim().is_empty() {
            continue;
        }
        slide_count += 1;
        blocks.push(format!("=== Slide {slide_count} ===\n{text}\n"));
    }

    if include_notes {
        for (index, name) in numbered_parts(&names, NOTES_PREFIX, PART_SUFFIX) {
            let Some(text) = read_part_text(&mut archive, &name) else {
                continue;
            };
            if !text.trim().is_empty() {
                blocks.push(format!("=== Slide {index} Notes ===\n{text}\n"));
            }
        }
    }

    let mut result = ExtractionResult::new(blocks.join("\n"), PPTX_ENGINE);
    result.metadata.paragraph_count = slide_count;
    Ok(result)
}

pub struct PptxExtractor {
    include_notes: bool,
}

impl PptxExtractor {
    pub fn new(include_notes: bool) -> Self {
        Self { include_notes }
    }
}

impl Extractor for PptxExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractionResult, ExtractionError> {
        extract_pptx(bytes, self.include_notes)
    }

    fn name(&self) -> &str {
        "pptx"
    }

    fn supports_format(&self, format: DocumentFormat) -> bool {
        format == DocumentFormat::Pptx
    }
}

/// Some `.ppt` uploads are really PresentationML containers with the wrong
/// extension. Those get the PPTX parser; everything else falls through.
pub struct PptContainerExtractor {
    include_notes: bool,
}

impl PptContainerExtractor {
    pub fn new(include_notes: bool) -> Self {
        Self { include_notes }
    }
}

impl Extractor for PptContainerExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractionResult, ExtractionError> {
        let archive = open_archive(bytes)?;
        let looks_like_presentation = entry_names(&archive)
            .iter()
            .any(|name| name.contains("ppt") || name.contains("slide"));
        if !looks_like_presentation {
            return Err(ExtractionError::ContainerEmpty {
                expected: "PowerPoint",
            });
        }

        let mut result = extract_pptx(bytes, self.include_notes)?;
        result.metadata.parse_engine = PPT_AS_ZIP_ENGINE.to_string();
        Ok(result.with_warning("PPT file appears to be a compressed container; parsed as PPTX"))
    }

    fn name(&self) -> &str {
        "ppt-as-zip"
    }

    fn supports_format(&self, format: DocumentFormat) -> bool {
        format == DocumentFormat::Ppt
    }
}
