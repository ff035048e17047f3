// PaperForge Core Library
//
// Text extraction and cleanup for uploaded teaching material, plus recovery
// and assembly of LLM-generated test papers.

pub mod types;
pub mod error;
pub mod config;
pub mod extractors;
pub mod classifier;
pub mod normalizer;
pub mod json_recovery;
pub mod fingerprint;
pub mod processor;
pub mod paper;

// Re-export main types and functions for easy use
pub use types::*;
pub use error::ExtractionError;
pub use config::{DeploymentProfile, PipelineConfig};
pub use extractors::Extractor;
pub use classifier::{is_garbled, GarbledTextClassifier};
pub use normalizer::{clean_and_cap, normalize};
pub use json_recovery::{recover_as, recover_json, JsonRecoveryError};
pub use processor::{DocumentProcessor, PipelineStages, StepProfiler, StepTiming};
pub use paper::{assemble_paper, build_sample_paper, PaperOutcome, PaperRequest, PaperSource, TestPaper};
