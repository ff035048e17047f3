use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

// ===== DECLARED UPLOAD TYPES =====

pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_PPTX: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const MIME_PPT: &str = "application/vnd.ms-powerpoint";
pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";

/// MIME types accepted at the upload boundary
pub const ALLOWED_MIME_TYPES: &[&str] = &[MIME_DOCX, MIME_DOC, MIME_PPTX, MIME_PPT, MIME_PDF, MIME_TEXT];

static BLANK_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Docx,
    Doc,
    Pptx,
    Ppt,
    Pdf,
    PlainText,
}

impl DocumentFormat {
    /// Resolve the format from the declared MIME type, then the file name.
    ///
    /// Precedence follows the upload route: PDF, PPTX, PPT, DOCX, DOC. A MIME
    /// type outside the allow-list is only tolerated when it is empty or the
    /// generic `application/octet-stream`, in which case the extension decides.
    pub fn detect(mime: &str, file_name: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        let name = file_name.to_ascii_lowercase();

        let declared = ALLOWED_MIME_TYPES.contains(&mime.as_str());
        let generic = mime.is_empty() || mime == "application/octet-stream";
        if !declared && !generic {
            return None;
        }

        if mime == MIME_PDF || name.ends_with(".pdf") {
            Some(DocumentFormat::Pdf)
        } else if mime.contains("presentationml") || name.ends_with(".pptx") {
            Some(DocumentFormat::Pptx)
        } else if mime.contains("ms-powerpoint") || name.ends_with(".ppt") {
            Some(DocumentFormat::Ppt)
        } else if mime.contains("wordprocessingml") || name.ends_with(".docx") {
            Some(DocumentFormat::Docx)
        } else if mime.contains("msword") || name.ends_with(".doc") {
            Some(DocumentFormat::Doc)
        } else if mime == MIME_TEXT || name.ends_with(".txt") {
            Some(DocumentFormat::PlainText)
        } else {
            None
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::from_extension(&extension)
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "docx" => Some(DocumentFormat::Docx),
            "doc" => Some(DocumentFormat::Doc),
            "pptx" => Some(DocumentFormat::Pptx),
            "ppt" => Some(DocumentFormat::Ppt),
            "pdf" => Some(DocumentFormat::Pdf),
            "txt" | "text" => Some(DocumentFormat::PlainText),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentFormat::Docx => MIME_DOCX,
            DocumentFormat::Doc => MIME_DOC,
            DocumentFormat::Pptx => MIME_PPTX,
            DocumentFormat::Ppt => MIME_PPT,
            DocumentFormat::Pdf => MIME_PDF,
            DocumentFormat::PlainText => MIME_TEXT,
        }
    }

    /// Corrective action shown when nothing usable came out of this format
    pub fn conversion_hint(&self) -> &'static str {
        match self {
            DocumentFormat::Doc => "convert it to DOCX for best results",
            DocumentFormat::Ppt => "convert it to PPTX for best results",
            DocumentFormat::Pdf => "make sure the PDF has a text layer rather than scanned images",
            _ => "re-export the file and check that it opens normally",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DocumentFormat::Docx => "DOCX",
            DocumentFormat::Doc => "DOC",
            DocumentFormat::Pptx => "PPTX",
            DocumentFormat::Ppt => "PPT",
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::PlainText => "plain text",
        };
        f.write_str(label)
    }
}

/// An uploaded file, consumed once by the extraction pipeline
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

impl RawDocument {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            file_name: file_name.into(),
        }
    }

    /// Read a file from disk, inferring the MIME type from its extension
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let mime_type = DocumentFormat::from_path(path)
            .map(|format| format.mime_type())
            .unwrap_or("application/octet-stream");
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self::new(bytes, mime_type, file_name))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Contiguous run of plausibly-readable bytes found by the binary scanner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextSegment {
    /// Byte offset of the first byte in the run
    pub start: usize,
    /// Byte offset one past the last byte in the run
    pub end: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionMetadata {
    pub word_count: usize,
    pub paragraph_count: usize,
    pub parse_engine: String,
    pub extracted_images: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_sha256: Option<String>,
}

impl ExtractionMetadata {
    /// Counts words on whitespace and paragraphs on blank lines
    pub fn from_content(content: &str, parse_engine: &str) -> Self {
        Self {
            word_count: count_words(content),
            paragraph_count: count_paragraphs(content),
            parse_engine: parse_engine.to_string(),
            extracted_images: 0,
            source_sha256: None,
        }
    }
}

/// Output of exactly one extraction strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub content: String,
    pub metadata: ExtractionMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ExtractionResult {
    pub fn new(content: String, parse_engine: &str) -> Self {
        let metadata = ExtractionMetadata::from_content(&content, parse_engine);
        Self {
            content,
            metadata,
            warning: None,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }
}

/// Normalized, length-capped text ready for the prompt builder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanedDocument {
    pub format: DocumentFormat,
    pub text: String,
    pub metadata: ExtractionMetadata,
    pub warning: Option<String>,
    /// True when the length cap cut the normalized text
    pub truncated: bool,
}

/// JSON shape returned across the upload boundary
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UploadResponse {
    Success {
        text: String,
        metadata: ExtractionMetadata,
        #[serde(skip_serializing_if = "Option::is_none")]
        warning: Option<String>,
    },
    Failure {
        error: String,
    },
}

impl From<CleanedDocument> for UploadResponse {
    fn from(document: CleanedDocument) -> Self {
        UploadResponse::Success {
            text: document.text,
            metadata: document.metadata,
            warning: document.warning,
        }
    }
}

impl UploadResponse {
    pub fn failure(error: impl fmt::Display) -> Self {
        UploadResponse::Failure {
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadResponse::Success { .. })
    }
}

pub fn count_words(content: &str) -> usize {
    content.split_whitespace().count()
}

/// Number of blank-line separated blocks; an empty string still counts as one
pub fn count_paragraphs(content: &str) -> usize {
    BLANK_LINE_REGEX.split(content).count()
}
