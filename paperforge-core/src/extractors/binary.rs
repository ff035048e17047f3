//! Heuristic text recovery from legacy binary DOC and PPT files.
//!
//! Neither format is parsed structurally. The scanner walks the bytes looking
//! for runs that decode to something readable and keeps the runs that pass a
//! few plausibility filters. Extended bytes (128-255) are decoded as Latin-1,
//! so non-ASCII text in legacy code pages comes out garbled. That loss is
//! accepted.

use super::Extractor;
use crate::config::ScannerConfig;
use crate::error::ExtractionError;
use crate::types::{DocumentFormat, ExtractionResult, TextSegment};
use tracing::debug;

/// Joined scanner output shorter than this is treated as nothing found
pub const MIN_SCANNED_TEXT_CHARS: usize = 10;

/// Segments longer than this get a `=== Content Segment N ===` label
const LABEL_MIN_CHARS: usize = 10;

pub const DOC_SCANNER_ENGINE: &str = "fallback parser";
pub const PPT_SCANNER_ENGINE: &str = "binary parser with heuristics";

fn decode_byte(byte: u8) -> Option<char> {
    match byte {
        32..=126 => Some(byte as char),
        128..=255 => Some(char::from(byte)),
        9 => Some(' '),
        10 | 13 => Some('\n'),
        _ => None,
    }
}

fn is_readable(byte: u8) -> bool {
    decode_byte(byte).is_some()
}

fn is_printable_ascii(byte: u8) -> bool {
    (32..=126).contains(&byte)
}

fn is_cjk_ideograph(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

fn has_letter_or_ideograph(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_alphabetic() || is_cjk_ideograph(c))
}

/// Anything besides whitespace and punctuation, in the ASCII word-character sense
fn has_word_char(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Anything besides whitespace, punctuation and digits
fn has_non_digit_word_char(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_alphabetic() || c == '_')
}

fn is_bare_letter_pair(text: &str) -> bool {
    let len = text.chars().count();
    (1..=2).contains(&len) && text.chars().all(|c| c.is_ascii_alphabetic())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(*c as u32, 0x00..=0x1f | 0x7f..=0x9f))
        .collect()
}

fn decode_run(bytes: &[u8]) -> String {
    bytes.iter().filter_map(|&b| decode_byte(b)).collect()
}

/// Find readable runs in a legacy Word binary.
///
/// NUL bytes are treated as padding: they neither extend nor break a run.
pub fn scan_doc(bytes: &[u8], config: &ScannerConfig) -> Vec<TextSegment> {
    let len = bytes.len();
    let skip = config.skip_bytes.max(1);
    let mut segments = Vec::new();
    let mut i = 0;

    while i + config.detection_window < len {
        let window_end = (i + config.lookahead_bytes).min(len);
        let mut run_start: Option<usize> = None;
        let mut readable = 0;

        for (j, &byte) in bytes.iter().enumerate().take(window_end).skip(i) {
            if is_readable(byte) {
                run_start.get_or_insert(j);
                readable += 1;
            } else if byte == 0 {
                continue;
            } else {
                if readable >= config.detection_window {
                    break;
                }
                run_start = None;
                readable = 0;
            }
        }

        let start = match run_start {
            Some(start) if readable >= config.detection_window && readable > 0 => start,
            _ => {
                i += skip;
                continue;
            }
        };

        // Extend until enough consecutive non-readable bytes
        let mut end = start + readable;
        let mut non_readable = 0;
        while end < len && non_readable < config.termination_run {
            let byte = bytes[end];
            if is_readable(byte) {
                non_readable = 0;
            } else if byte != 0 {
                non_readable += 1;
            }
            end += 1;
        }

        let segment_end = end - non_readable;
        let text = collapse_whitespace(&decode_run(&bytes[start..segment_end]));
        if text.chars().count() >= config.doc_min_segment_chars
            && has_letter_or_ideograph(&text)
            && has_word_char(&text)
        {
            segments.push(TextSegment {
                start,
                end: segment_end,
                text,
            });
        }

        i = end;
    }

    segments
}

/// Second-pass filter and cleanup over accepted DOC runs
fn post_filter(segments: Vec<TextSegment>, min_chars: usize) -> Vec<String> {
    segments
        .into_iter()
        .filter(|segment| {
            let text = &segment.text;
            text.chars().count() >= min_chars
                && has_letter_or_ideograph(text)
                && has_non_digit_word_char(text)
                && !is_bare_letter_pair(text)
        })
        .map(|segment| collapse_whitespace(&strip_control_chars(&segment.text)))
        .filter(|text| text.chars().count() >= min_chars)
        .collect()
}

/// Scan a legacy Word binary and join the surviving runs.
pub fn extract_doc_text(bytes: &[u8], config: &ScannerConfig) -> Result<String, ExtractionError> {
    let segments = scan_doc(bytes, config);
    debug!("DOC scanner found {} candidate runs", segments.len());

    let text = post_filter(segments, config.post_min_segment_chars).join("\n\n");
    if text.chars().count() < MIN_SCANNED_TEXT_CHARS {
        return Err(ExtractionError::empty(DocumentFormat::Doc));
    }
    Ok(text)
}

/// Find readable runs in a legacy PowerPoint binary.
///
/// A NUL directly followed by printable ASCII is taken as the start of a new
/// text record and closes the current run.
pub fn scan_ppt(bytes: &[u8], config: &ScannerConfig) -> Vec<TextSegment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut run_start = 0;
    let mut non_readable = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        if byte == 0 {
            let next_printable = bytes.get(i + 1).is_some_and(|&next| is_printable_ascii(next));
            if next_printable && !current.is_empty() {
                flush_ppt_run(&mut segments, &mut current, run_start, i);
                non_readable = 0;
            }
            continue;
        }

        match decode_byte(byte) {
            Some(c) => {
                if current.is_empty() {
                    run_start = i;
                }
                current.push(c);
                non_readable = 0;
            }
            None => {
                non_readable += 1;
                if non_readable >= config.termination_run && !current.is_empty() {
                    flush_ppt_run(&mut segments, &mut current, run_start, i);
                }
            }
        }
    }

    if !current.is_empty() {
        flush_ppt_run(&mut segments, &mut current, run_start, bytes.len());
    }

    segments
}

fn flush_ppt_run(segments: &mut Vec<TextSegment>, current: &mut String, start: usize, end: usize) {
    let trimmed = current.trim();
    if trimmed.chars().count() > 2 {
        segments.push(TextSegment {
            start,
            end,
            text: trimmed.to_string(),
        });
    }
    current.clear();
}

/// Scan a legacy PowerPoint binary and join the surviving runs.
pub fn extract_ppt_text(bytes: &[u8], config: &ScannerConfig) -> Result<String, ExtractionError> {
    let segments = scan_ppt(bytes, config);
    debug!("PPT scanner found {} candidate runs", segments.len());

    let text = segments
        .into_iter()
        .map(|segment| segment.text)
        .filter(|text| {
            text.chars().count() >= config.post_min_segment_chars && has_letter_or_ideograph(text)
        })
        .enumerate()
        .map(|(index, text)| {
            if config.label_segments && text.chars().count() > LABEL_MIN_CHARS {
                format!("=== Content Segment {} ===\n{}", index + 1, text)
            } else {
                text
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    if text.chars().count() < MIN_SCANNED_TEXT_CHARS {
        return Err(ExtractionError::empty(DocumentFormat::Ppt));
    }
    Ok(text)
}

pub struct DocBinaryExtractor {
    config: ScannerConfig,
}

impl DocBinaryExtractor {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }
}

impl Extractor for DocBinaryExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractionResult, ExtractionError> {
        let text = extract_doc_text(bytes, &self.config)?;
        Ok(ExtractionResult::new(text, DOC_SCANNER_ENGINE)
            .with_warning("DOC parsing may be incomplete; convert the file to DOCX for best results"))
    }

    fn name(&self) -> &str {
        "doc-binary-scanner"
    }

    fn supports_format(&self, format: DocumentFormat) -> bool {
        format == DocumentFormat::Doc
    }
}

pub struct PptBinaryExtractor {
    config: ScannerConfig,
}

impl PptBinaryExtractor {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }
}

impl Extractor for PptBinaryExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractionResult, ExtractionError> {
        let text = extract_ppt_text(bytes, &self.config)?;
        Ok(ExtractionResult::new(text, PPT_SCANNER_ENGINE)
            .with_warning("PPT parsing may be incomplete; convert the file to PPTX for best results"))
    }

    fn name(&self) -> &str {
        "ppt-binary-scanner"
    }

    fn supports_format(&self, format: DocumentFormat) -> bool {
        format == DocumentFormat::Ppt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ScannerConfig {
        ScannerConfig::default()
    }

    /// Binary noise with a readable run embedded at `offset`
    fn doc_with_text(text: &str, offset: usize) -> Vec<u8> {
        let mut bytes = vec![0x01u8; offset];
        bytes.extend_from_slice(text.as_bytes());
        bytes.extend_from_slice(&[0x02; 40]);
        bytes
    }

    #[test]
    fn control_bytes_only_yields_nothing() {
        let bytes: Vec<u8> = (0u8..=31).cycle().take(2048).collect();
        let err = extract_doc_text(&bytes, &config()).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::ExtractionEmpty {
                format: DocumentFormat::Doc,
                ..
            }
        ));

        let err = extract_ppt_text(&bytes, &config()).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::ExtractionEmpty {
                format: DocumentFormat::Ppt,
                ..
            }
        ));
    }

    #[test]
    fn doc_run_is_recovered_with_offsets() {
        let bytes = doc_with_text("The quick brown fox jumps", 30);
        let segments = scan_doc(&bytes, &config());
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start, 30);
        assert_eq!(segments[0].end, 55);
        assert_eq!(segments[0].text, "The quick brown fox jumps");
    }

    #[test]
    fn doc_nul_padding_does_not_break_run() {
        let mut bytes = vec![0x03u8; 8];
        for b in b"Lesson plan for grade five" {
            bytes.push(*b);
            bytes.push(0);
        }
        bytes.extend_from_slice(&[0x04; 20]);

        let text = extract_doc_text(&bytes, &config()).unwrap();
        assert!(text.contains("Lesson plan"), "{text}");
    }

    #[test]
    fn doc_short_runs_are_skipped() {
        // Nine readable bytes never satisfy the detection window
        let mut bytes = Vec::new();
        for _ in 0..20 {
            bytes.extend_from_slice(b"abcdefghi");
            bytes.push(0x05);
        }
        assert!(scan_doc(&bytes, &config()).is_empty());
    }

    #[test]
    fn doc_rejects_digit_only_runs() {
        let bytes = doc_with_text("1234567890 12345", 20);
        assert!(extract_doc_text(&bytes, &config()).is_err());
    }

    #[test]
    fn doc_segments_joined_with_blank_line() {
        let mut bytes = doc_with_text("First readable paragraph", 12);
        bytes.extend_from_slice(b"Second readable paragraph");
        bytes.extend_from_slice(&[0x06; 30]);

        let text = extract_doc_text(&bytes, &config()).unwrap();
        assert_eq!(text, "First readable paragraph\n\nSecond readable paragraph");
    }

    #[test]
    fn doc_strips_c1_controls_from_latin1_bytes() {
        let mut bytes = vec![0x01u8; 16];
        bytes.extend_from_slice(b"Grammar ");
        bytes.push(0x85);
        bytes.extend_from_slice(b"review unit");
        bytes.extend_from_slice(&[0x01; 16]);

        let text = extract_doc_text(&bytes, &config()).unwrap();
        assert_eq!(text, "Grammar review unit");
    }

    #[test]
    fn ppt_nul_before_text_splits_segments() {
        let mut bytes = b"Unit 3 Animals".to_vec();
        bytes.push(0);
        bytes.extend_from_slice(b"Vocabulary list");

        let segments = scan_ppt(&bytes, &config());
        let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Unit 3 Animals", "Vocabulary list"]);
        assert_eq!(segments[1].start, 15);
    }

    #[test]
    fn ppt_labels_long_segments_only() {
        let mut bytes = b"Colours and shapes".to_vec();
        bytes.push(0);
        bytes.extend_from_slice(b"Red");
        bytes.extend_from_slice(&[0x07; 6]);

        let text = extract_ppt_text(&bytes, &config()).unwrap();
        assert_eq!(text, "=== Content Segment 1 ===\nColours and shapes\n\nRed");
    }

    #[test]
    fn ppt_labels_can_be_disabled() {
        let config = ScannerConfig {
            label_segments: false,
            ..ScannerConfig::default()
        };
        let text = extract_ppt_text(b"Colours and shapes", &config).unwrap();
        assert_eq!(text, "Colours and shapes");
    }

    #[test]
    fn ppt_long_noise_terminates_run() {
        let mut bytes = b"Weather words".to_vec();
        bytes.extend_from_slice(&[0x08; 5]);
        bytes.extend_from_slice(b"Sunny days");

        let segments = scan_ppt(&bytes, &config());
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "Weather words");
        assert_eq!(segments[1].text, "Sunny days");
    }

    #[test]
    fn extractors_attach_conversion_warnings() {
        let bytes = doc_with_text("Reading comprehension passage", 20);
        let result = DocBinaryExtractor::new(config()).extract(&bytes).unwrap();
        assert_eq!(result.metadata.parse_engine, DOC_SCANNER_ENGINE);
        assert!(result.warning.as_deref().unwrap_or_default().contains("DOCX"));

        let result = PptBinaryExtractor::new(config())
            .extract(b"Reading comprehension passage")
            .unwrap();
        assert!(result.warning.as_deref().unwrap_or_default().contains("PPTX"));
    }
}
