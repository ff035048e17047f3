//! Test-paper domain: schema, request, prompts, and assembly of a paper
//! from a model completion with the sample paper as fallback.

pub mod prompt;
pub mod request;
pub mod sample;
pub mod schema;

pub use prompt::{build_generation_prompt, build_knowledge_point_prompt, GARBLED_REPLY};
pub use request::{
    PaperRequest, QuestionAllocation, QuestionTypes, MAX_POINTS_PER_QUESTION, MAX_QUESTIONS_PER_TYPE,
};
pub use sample::build_sample_paper;
pub use schema::{AnswerKeyEntry, Question, Section, SectionKind, TestPaper};

use crate::json_recovery::recover_as;
use serde::Serialize;
use tracing::{info, warn};

/// Where the returned paper came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PaperSource {
    Generated,
    Sample { reason: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperOutcome {
    pub paper: TestPaper,
    pub source: PaperSource,
}

impl PaperOutcome {
    fn sample(request: &PaperRequest, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!("📝 Using sample paper: {reason}");
        Self {
            paper: build_sample_paper(request),
            source: PaperSource::Sample { reason },
        }
    }

    pub fn is_generated(&self) -> bool {
        self.source == PaperSource::Generated
    }
}

/// Turn a model completion into a paper.
///
/// `None` stands for "no completion available" (no API key configured, or
/// the call was never made). Blank or unrecoverable completions fall back to
/// the sample paper built from `request`; this function never fails.
pub fn assemble_paper(completion: Option<&str>, request: &PaperRequest) -> PaperOutcome {
    let Some(completion) = completion else {
        return PaperOutcome::sample(request, "no completion available");
    };
    if completion.trim().is_empty() {
        return PaperOutcome::sample(request, "completion was empty");
    }

    match recover_as::<TestPaper>(completion) {
        Ok(paper) => {
            for issue in paper.issues() {
                warn!("⚠️  Generated paper: {issue}");
            }
            info!(
                "✅ Generated paper '{}' with {} questions",
                paper.title,
                paper.question_count()
            );
            PaperOutcome {
                paper,
                source: PaperSource::Generated,
            }
        }
        Err(e) => PaperOutcome::sample(request, format!("{e} ({})", e.detail())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_completion_uses_sample() {
        let request = PaperRequest::default();
        assert!(!assemble_paper(None, &request).is_generated());

        let outcome = assemble_paper(Some("  \n "), &request);
        assert_eq!(
            outcome.source,
            PaperSource::Sample {
                reason: "completion was empty".into()
            }
        );
        assert_eq!(outcome.paper, build_sample_paper(&request));
    }

    #[test]
    fn fenced_completion_is_parsed() {
        let completion = "```json\n{\"title\": \"Unit 2 Quiz\", \"totalScore\": 2, \"sections\": [\
            {\"type\": \"fillInBlank\", \"title\": \"I. Blanks\", \"questions\": [\
            {\"id\": 1, \"question\": \"She ___ a teacher.\", \"answer\": \"is\", \"points\": 2}]}]}\n```";
        let outcome = assemble_paper(Some(completion), &PaperRequest::default());
        assert!(outcome.is_generated());
        assert_eq!(outcome.paper.title, "Unit 2 Quiz");
        assert_eq!(outcome.paper.sections[0].kind(), SectionKind::FillInBlank);
    }

    #[test]
    fn malformed_or_off_schema_completion_uses_sample() {
        let request = PaperRequest::default();
        let broken = assemble_paper(Some("{\"title\": \"Unit"), &request);
        assert!(!broken.is_generated());

        let off_schema = assemble_paper(Some("{\"a\": 1}"), &request);
        match off_schema.source {
            PaperSource::Sample { reason } => {
                assert!(reason.starts_with("Failed to parse JSON from API response."), "{reason}")
            }
            other => panic!("expected sample, got {other:?}"),
        }
    }

    #[test]
    fn outcome_serializes_source_kind() {
        let outcome = assemble_paper(None, &PaperRequest::default());
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["source"]["kind"], "sample");
        assert_eq!(value["paper"]["sections"][0]["type"], "listening");
    }
}
