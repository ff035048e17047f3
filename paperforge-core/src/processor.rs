use crate::classifier::{Classification, GarbledTextClassifier};
use crate::config::PipelineConfig;
use crate::error::ExtractionError;
use crate::extractors::strategy_chain;
use crate::fingerprint::calculate_source_hash;
use crate::normalizer::{normalize, truncate_chars};
use crate::types::*;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Captured intermediate outputs from each pipeline stage
/// Used for testing and diagnostics, to inspect each boundary separately
#[derive(Debug, Clone, serde::Serialize)]
pub struct PipelineStages {
    pub format: DocumentFormat,
    pub extraction: ExtractionResult,
    pub classification: Classification,
    pub normalized: String,
    pub capped: String,
    /// Wall time of each captured step, in capture order
    pub timings: Vec<StepTiming>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StepTiming {
    pub step: String,
    pub micros: u64,
}

/// Collects step timings; when disabled, steps run untimed
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<StepTiming>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let micros = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);

        debug!("⏱️  {step_name}: {micros}µs");
        self.timings.push(StepTiming {
            step: step_name.to_string(),
            micros,
        });
        result
    }

    pub fn timings(&self) -> &[StepTiming] {
        &self.timings
    }

    pub fn into_timings(self) -> Vec<StepTiming> {
        self.timings
    }

    pub fn total_micros(&self) -> u64 {
        self.timings
            .iter()
            .fold(0u64, |total, timing| total.saturating_add(timing.micros))
    }

    pub fn print_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        info!("📊 Performance Summary:");
        let total = self.total_micros();
        for timing in &self.timings {
            let percentage = if total == 0 {
                0.0
            } else {
                timing.micros as f64 / total as f64 * 100.0
            };
            info!("   {:.<35} {}µs ({:.1}%)", timing.step, timing.micros, percentage);
        }
        info!("   {:.<35} {}µs", "Total", total);
    }
}

/// Upload pipeline: format detection → strategy chain → classifier →
/// normalizer → length cap.
///
/// Holds only configuration, so one processor can be shared across requests.
pub struct DocumentProcessor {
    config: PipelineConfig,
    classifier: GarbledTextClassifier,
    profiling: bool,
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl DocumentProcessor {
    pub fn new(config: PipelineConfig) -> Self {
        let classifier = GarbledTextClassifier::new(config.garbled.clone());
        Self {
            config,
            classifier,
            profiling: false,
        }
    }

    pub fn with_profiling(mut self, enabled: bool) -> Self {
        self.profiling = enabled;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Request-level checks: declared type first, then size
    pub fn resolve_format(&self, document: &RawDocument) -> Result<DocumentFormat, ExtractionError> {
        let format = DocumentFormat::detect(&document.mime_type, &document.file_name).ok_or_else(|| {
            ExtractionError::UnsupportedFormat {
                mime: document.mime_type.clone(),
                file_name: document.file_name.clone(),
            }
        })?;

        let limit = self.config.limits.max_file_size_bytes;
        if document.size() > limit {
            return Err(ExtractionError::FileTooLarge {
                size: document.size(),
                limit,
            });
        }

        Ok(format)
    }

    /// Walk the strategy chain for `format`, moving on only on recoverable failures
    fn run_strategies(&self, format: DocumentFormat, document: &RawDocument) -> Result<ExtractionResult, ExtractionError> {
        let mut last_error = None;

        for strategy in strategy_chain(format, &self.config) {
            debug!("Trying {} for {format}", strategy.name());
            match strategy.extract(&document.bytes) {
                Ok(result) => {
                    info!(
                        "📄 {} extracted {} chars via {}",
                        format,
                        result.content.chars().count(),
                        result.metadata.parse_engine
                    );
                    return Ok(result);
                }
                Err(e) if e.allows_fallback() => {
                    warn!("⚠️  {} could not handle {}: {e}", strategy.name(), document.file_name);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        // PPTX has no fallback, so a broken container means the upload is not really PPTX
        match last_error.unwrap_or_else(|| ExtractionError::empty(format)) {
            ExtractionError::ContainerOpenFailed { .. } | ExtractionError::ContainerEmpty { .. }
                if format == DocumentFormat::Pptx =>
            {
                Err(ExtractionError::UnsupportedFormat {
                    mime: document.mime_type.clone(),
                    file_name: document.file_name.clone(),
                })
            }
            error => Err(error),
        }
    }

    /// Detect, check size and extract, with the source fingerprint attached
    pub fn extract(&self, document: &RawDocument) -> Result<(DocumentFormat, ExtractionResult), ExtractionError> {
        let format = self.resolve_format(document)?;
        let mut result = self.run_strategies(format, document)?;
        result.metadata.source_sha256 = Some(calculate_source_hash(&document.bytes));
        Ok((format, result))
    }

    /// Full pipeline for one upload
    pub fn process(&self, document: &RawDocument) -> Result<CleanedDocument, ExtractionError> {
        let start_time = Instant::now();
        let mut profiler = StepProfiler::new(self.profiling);
        info!("📄 Processing upload: {} ({} bytes)", document.file_name, document.size());

        let (format, extraction) = profiler.time_step("1. Extraction", || self.extract(document))?;

        // Plain text uploads skip the noise check
        if format != DocumentFormat::PlainText {
            let classification = profiler.time_step("2. Classification", || {
                self.classifier.classify(&extraction.content)
            });
            if classification.garbled {
                warn!("🚫 Rejected {} as garbled", document.file_name);
                return Err(ExtractionError::GarbledContent);
            }
        }

        let normalized = profiler.time_step("3. Normalization", || normalize(&extraction.content));
        let capped = truncate_chars(&normalized, self.config.limits.max_text_length);
        let truncated = capped.len() < normalized.len();

        let length = capped.chars().count();
        if capped.trim().is_empty() || length < self.config.limits.min_content_length {
            return Err(ExtractionError::InsufficientContent { length });
        }

        profiler.print_summary();
        info!(
            "✅ {} ready: {} chars{} in {:.3}s",
            document.file_name,
            length,
            if truncated { " (truncated)" } else { "" },
            start_time.elapsed().as_secs_f64()
        );

        Ok(CleanedDocument {
            format,
            text: capped.to_string(),
            metadata: extraction.metadata,
            warning: extraction.warning,
            truncated,
        })
    }

    /// Upload boundary: never fails, errors become `{ error }` payloads
    pub fn process_upload(&self, document: &RawDocument) -> UploadResponse {
        match self.process(document) {
            Ok(cleaned) => cleaned.into(),
            Err(e) => {
                warn!("Upload {} failed: {e}", document.file_name);
                UploadResponse::failure(e)
            }
        }
    }

    /// Process document and capture all intermediate stage outputs
    /// Used for pipeline diagnostics; classifier rejection does not stop the capture
    pub fn capture_stages(&self, document: &RawDocument) -> Result<PipelineStages, ExtractionError> {
        let mut profiler = StepProfiler::new(true);

        let (format, extraction) = profiler.time_step("1. Extraction", || self.extract(document))?;
        info!("📋 Stage 1: {} chars extracted", extraction.content.chars().count());

        let classification =
            profiler.time_step("2. Classification", || self.classifier.classify(&extraction.content));
        info!("📋 Stage 2: garbled={}", classification.garbled);

        let normalized = profiler.time_step("3. Normalization", || normalize(&extraction.content));
        let capped = profiler.time_step("4. Length cap", || {
            truncate_chars(&normalized, self.config.limits.max_text_length).to_string()
        });
        info!("📋 Stage 3: {} chars after cleanup", capped.chars().count());
        profiler.print_summary();

        Ok(PipelineStages {
            format,
            extraction,
            classification,
            normalized,
            capped,
            timings: profiler.into_timings(),
        })
    }
}
