use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ===== DEFAULTS =====

/// Readable bytes required before the DOC scanner commits to a run
pub const DEFAULT_DETECTION_WINDOW: usize = 10;
/// Consecutive non-readable bytes that end a run
pub const DEFAULT_TERMINATION_RUN: usize = 5;
pub const DEFAULT_DOC_MIN_SEGMENT_CHARS: usize = 5;
pub const DEFAULT_POST_MIN_SEGMENT_CHARS: usize = 3;
pub const DEFAULT_SKIP_BYTES: usize = 50;
pub const DEFAULT_LOOKAHEAD_BYTES: usize = 100;

pub const DEFAULT_GARBLED_MIN_LENGTH: usize = 5;
pub const DEFAULT_GARBLED_MIN_VALID_RATIO: f64 = 0.2;
pub const DEFAULT_GARBLED_MIN_READABLE_CHARS: usize = 20;

pub const DEFAULT_MAX_TEXT_LENGTH: usize = 30_000;
/// Cap used by the knowledge-point deployment
pub const KNOWLEDGE_POINTS_MAX_TEXT_LENGTH: usize = 10_000;
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 4 * 1024 * 1024;
pub const MIN_CONTENT_LENGTH: usize = 10;

fn default_true() -> bool {
    true
}

/// Tunables for the legacy DOC/PPT byte scanner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub detection_window: usize,
    pub termination_run: usize,
    /// Minimum decoded length for a DOC run to be kept
    pub doc_min_segment_chars: usize,
    /// Minimum length applied by the post-filter and the PPT walk
    pub post_min_segment_chars: usize,
    pub skip_bytes: usize,
    pub lookahead_bytes: usize,
    /// Prefix PPT segments longer than 10 characters with `=== Content Segment N ===`
    pub label_segments: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            detection_window: DEFAULT_DETECTION_WINDOW,
            termination_run: DEFAULT_TERMINATION_RUN,
            doc_min_segment_chars: DEFAULT_DOC_MIN_SEGMENT_CHARS,
            post_min_segment_chars: DEFAULT_POST_MIN_SEGMENT_CHARS,
            skip_bytes: DEFAULT_SKIP_BYTES,
            lookahead_bytes: DEFAULT_LOOKAHEAD_BYTES,
            label_segments: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GarbledThresholds {
    /// Texts shorter than this (in characters) are always garbled
    pub min_length: usize,
    pub min_valid_ratio: f64,
    pub min_readable_chars: usize,
}

impl Default for GarbledThresholds {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_GARBLED_MIN_LENGTH,
            min_valid_ratio: DEFAULT_GARBLED_MIN_VALID_RATIO,
            min_readable_chars: DEFAULT_GARBLED_MIN_READABLE_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Character cap applied after normalization
    pub max_text_length: usize,
    pub max_file_size_bytes: u64,
    pub min_content_length: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            min_content_length: MIN_CONTENT_LENGTH,
        }
    }
}

/// Which caller the pipeline is serving; only the text cap differs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentProfile {
    #[default]
    Standard,
    KnowledgePoints,
}

impl DeploymentProfile {
    pub fn max_text_length(&self) -> usize {
        match self {
            DeploymentProfile::Standard => DEFAULT_MAX_TEXT_LENGTH,
            DeploymentProfile::KnowledgePoints => KNOWLEDGE_POINTS_MAX_TEXT_LENGTH,
        }
    }
}

impl std::str::FromStr for DeploymentProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(DeploymentProfile::Standard),
            "knowledge-points" | "knowledge_points" | "kp" => Ok(DeploymentProfile::KnowledgePoints),
            other => Err(format!("unknown profile '{other}' (expected standard or knowledge-points)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub profile: DeploymentProfile,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub garbled: GarbledThresholds,
    /// Append speaker notes after the slide blocks of a PPTX
    #[serde(default = "default_true")]
    pub include_speaker_notes: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::for_profile(DeploymentProfile::Standard)
    }
}

impl PipelineConfig {
    pub fn for_profile(profile: DeploymentProfile) -> Self {
        Self {
            profile,
            limits: LimitsConfig {
                max_text_length: profile.max_text_length(),
                ..LimitsConfig::default()
            },
            scanner: ScannerConfig::default(),
            garbled: GarbledThresholds::default(),
            include_speaker_notes: true,
        }
    }

    /// Load config from a YAML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: PipelineConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&Path>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                tracing::warn!("⚠️  Failed to load config from {}, using defaults: {e:#}", p.display());
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
