use anyhow::Result;
use paperforge_core::fingerprint::calculate_config_hash;
use paperforge_core::{PipelineConfig, PipelineStages};
use std::fs;
use std::path::{Path, PathBuf};

/// Write every captured stage plus a `summary.json` into `output_dir`
pub fn save_stages(
    stages: &PipelineStages,
    config: &PipelineConfig,
    input_name: &str,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)?;
    let mut written = Vec::new();

    // Stage 1: raw extraction
    let extraction_path = output_dir.join("stage1_extraction.json");
    fs::write(&extraction_path, serde_json::to_string_pretty(&stages.extraction)?)?;
    written.push(extraction_path);

    // Stage 2: classifier verdict
    let classification_path = output_dir.join("stage2_classification.json");
    fs::write(
        &classification_path,
        serde_json::to_string_pretty(&stages.classification)?,
    )?;
    written.push(classification_path);

    // Stage 3: normalized and capped text
    let normalized_path = output_dir.join("stage3_normalized.txt");
    fs::write(&normalized_path, &stages.normalized)?;
    written.push(normalized_path);

    let capped_path = output_dir.join("stage4_capped.txt");
    fs::write(&capped_path, &stages.capped)?;
    written.push(capped_path);

    // Summary file: quick reference for validation scripts
    let summary = serde_json::json!({
        "input": input_name,
        "format": stages.format.to_string(),
        "captured_at": chrono::Utc::now().to_rfc3339(),
        "config_hash": calculate_config_hash(config)?,
        "garbled": stages.classification.garbled,
        "stage_counts": {
            "extracted_chars": stages.extraction.content.chars().count(),
            "normalized_chars": stages.normalized.chars().count(),
            "capped_chars": stages.capped.chars().count(),
        },
        "timings_us": stages.timings,
        "total_us": stages.timings.iter().fold(0u64, |total, t| total.saturating_add(t.micros)),
    });
    let summary_path = output_dir.join("summary.json");
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;
    written.push(summary_path);

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperforge_core::{DocumentProcessor, RawDocument, MIME_TEXT};

    #[test]
    fn writes_all_stage_files_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let document = RawDocument::new(
            b"Unit 3 vocabulary: apple, banana, orange.".to_vec(),
            MIME_TEXT,
            "unit3.txt",
        );
        let processor = DocumentProcessor::default();
        let stages = processor.capture_stages(&document).unwrap();

        let written = save_stages(&stages, processor.config(), "unit3.txt", dir.path()).unwrap();
        assert_eq!(written.len(), 5);
        assert!(written.iter().all(|path| path.exists()));

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("summary.json")).unwrap()).unwrap();
        assert_eq!(summary["input"], "unit3.txt");
        assert_eq!(summary["format"], "plain text");
        assert_eq!(summary["garbled"], false);

        let timings = summary["timings_us"].as_array().unwrap();
        assert_eq!(timings.len(), stages.timings.len());
        assert_eq!(timings[0]["step"], "1. Extraction");
        assert!(summary["total_us"].is_u64());
    }
}
