use serde::{Deserialize, Serialize};

/// Most questions of one type a request may ask for
pub const MAX_QUESTIONS_PER_TYPE: u32 = 100;
/// Most points a single question may be worth
pub const MAX_POINTS_PER_QUESTION: u32 = 100;

/// Number of questions of one type and the points each is worth.
///
/// Deserialization rejects counts above [`MAX_QUESTIONS_PER_TYPE`] and scores
/// above [`MAX_POINTS_PER_QUESTION`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "AllocationFields")]
pub struct QuestionAllocation {
    pub count: u32,
    pub score: u32,
}

#[derive(Deserialize)]
struct AllocationFields {
    count: u32,
    score: u32,
}

impl TryFrom<AllocationFields> for QuestionAllocation {
    type Error = String;

    fn try_from(fields: AllocationFields) -> Result<Self, Self::Error> {
        if fields.count > MAX_QUESTIONS_PER_TYPE {
            return Err(format!(
                "question count {} exceeds the limit of {MAX_QUESTIONS_PER_TYPE}",
                fields.count
            ));
        }
        if fields.score > MAX_POINTS_PER_QUESTION {
            return Err(format!(
                "question score {} exceeds the limit of {MAX_POINTS_PER_QUESTION}",
                fields.score
            ));
        }
        Ok(Self::new(fields.count, fields.score))
    }
}

impl QuestionAllocation {
    pub const fn new(count: u32, score: u32) -> Self {
        Self { count, score }
    }

    /// Count capped at [`MAX_QUESTIONS_PER_TYPE`], for allocations built in code
    pub fn bounded_count(&self) -> u32 {
        self.count.min(MAX_QUESTIONS_PER_TYPE)
    }

    pub fn points(&self) -> u32 {
        self.count.saturating_mul(self.score)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionTypes {
    pub listening: QuestionAllocation,
    pub multiple_choice: QuestionAllocation,
    pub fill_in_blank: QuestionAllocation,
    pub reading: QuestionAllocation,
    pub writing: QuestionAllocation,
}

impl Default for QuestionTypes {
    fn default() -> Self {
        Self {
            listening: QuestionAllocation::new(5, 4),
            multiple_choice: QuestionAllocation::new(10, 3),
            fill_in_blank: QuestionAllocation::new(5, 2),
            reading: QuestionAllocation::new(5, 4),
            writing: QuestionAllocation::new(1, 20),
        }
    }
}

impl QuestionTypes {
    pub fn points(&self) -> u32 {
        [
            self.listening,
            self.multiple_choice,
            self.fill_in_blank,
            self.reading,
            self.writing,
        ]
        .iter()
        .fold(0u32, |total, allocation| total.saturating_add(allocation.points()))
    }
}

/// Everything a teacher chooses before a paper is generated.
///
/// Passed explicitly to the prompt builder and the sample-paper builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaperRequest {
    /// School year, "1" to "6"
    pub grade: String,
    /// `low`, `medium` or `high`
    pub difficulty: String,
    pub theme: String,
    pub knowledge_points: String,
    pub total_score: u32,
    pub question_types: QuestionTypes,
}

impl Default for PaperRequest {
    fn default() -> Self {
        Self {
            grade: "3".to_string(),
            difficulty: "medium".to_string(),
            theme: String::new(),
            knowledge_points: String::new(),
            total_score: 100,
            question_types: QuestionTypes::default(),
        }
    }
}

impl PaperRequest {
    pub fn grade_label(&self) -> String {
        match self.grade.trim() {
            g @ ("1" | "2" | "3" | "4" | "5" | "6") => format!("Grade {g}"),
            _ => "Primary School".to_string(),
        }
    }

    pub fn difficulty_label(&self) -> &'static str {
        match self.difficulty.trim().to_ascii_lowercase().as_str() {
            "low" => "Basic",
            "medium" => "Intermediate",
            "high" => "Advanced",
            _ => "Standard",
        }
    }

    pub fn theme_or_default(&self) -> &str {
        match self.theme.trim() {
            "" => "General Practice",
            theme => theme,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allocation_fills_total() {
        let request = PaperRequest::default();
        assert_eq!(request.question_types.points(), request.total_score);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let request: PaperRequest = serde_json::from_str(
            r#"{"grade": "5", "theme": "Animals", "questionTypes": {
                "listening": {"count": 0, "score": 0},
                "multipleChoice": {"count": 2, "score": 5},
                "fillInBlank": {"count": 0, "score": 0},
                "reading": {"count": 0, "score": 0},
                "writing": {"count": 0, "score": 0}
            }}"#,
        )
        .unwrap();
        assert_eq!(request.grade_label(), "Grade 5");
        assert_eq!(request.difficulty_label(), "Intermediate");
        assert_eq!(request.total_score, 100);
        assert_eq!(request.question_types.points(), 10);
    }

    #[test]
    fn unknown_labels_fall_back() {
        let request = PaperRequest {
            grade: "9".into(),
            difficulty: "extreme".into(),
            theme: "   ".into(),
            ..PaperRequest::default()
        };
        assert_eq!(request.grade_label(), "Primary School");
        assert_eq!(request.difficulty_label(), "Standard");
        assert_eq!(request.theme_or_default(), "General Practice");
    }

    #[test]
    fn oversized_allocations_are_rejected() {
        let huge_count = serde_json::from_str::<PaperRequest>(
            r#"{"questionTypes": {
                "listening": {"count": 4294967295, "score": 1},
                "multipleChoice": {"count": 1, "score": 1},
                "fillInBlank": {"count": 1, "score": 1},
                "reading": {"count": 1, "score": 1},
                "writing": {"count": 1, "score": 1}
            }}"#,
        )
        .unwrap_err();
        assert!(huge_count.to_string().contains("exceeds the limit"), "{huge_count}");

        let huge_score = serde_json::from_str::<QuestionAllocation>(r#"{"count": 2, "score": 1000}"#);
        assert!(huge_score.is_err());

        let at_limit: QuestionAllocation = serde_json::from_str(r#"{"count": 100, "score": 100}"#).unwrap();
        assert_eq!(at_limit.points(), 10_000);
    }

    #[test]
    fn points_saturate_for_allocations_built_in_code() {
        let allocation = QuestionAllocation::new(u32::MAX, u32::MAX);
        assert_eq!(allocation.points(), u32::MAX);
        assert_eq!(allocation.bounded_count(), MAX_QUESTIONS_PER_TYPE);

        let types = QuestionTypes {
            listening: allocation,
            ..QuestionTypes::default()
        };
        assert_eq!(types.points(), u32::MAX);
    }
}
