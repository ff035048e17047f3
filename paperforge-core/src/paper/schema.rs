//! Typed test-paper schema.
//!
//! Completions are parsed into these types after JSON recovery. Models are
//! inconsistent about scalar types (`"points": "5"`, `"answer": 3`), so the
//! numeric and answer fields accept any scalar.

use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPaper {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub total_score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listening_material: Option<String>,
    pub sections: Vec<Section>,
    #[serde(default)]
    pub answer_key: Vec<AnswerKeyEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKind {
    Listening,
    MultipleChoice,
    FillInBlank,
    Reading,
    Writing,
    TrueFalse,
}

/// One part of the paper, discriminated by its `type` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Section {
    Listening {
        #[serde(default)]
        title: String,
        questions: Vec<Question>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        material: Option<String>,
    },
    MultipleChoice {
        #[serde(default)]
        title: String,
        questions: Vec<Question>,
    },
    FillInBlank {
        #[serde(default)]
        title: String,
        questions: Vec<Question>,
    },
    Reading {
        #[serde(default)]
        title: String,
        questions: Vec<Question>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        passage: Option<String>,
    },
    Writing {
        #[serde(default)]
        title: String,
        questions: Vec<Question>,
    },
    TrueFalse {
        #[serde(default)]
        title: String,
        questions: Vec<Question>,
    },
}

impl Section {
    pub fn kind(&self) -> SectionKind {
        match self {
            Section::Listening { .. } => SectionKind::Listening,
            Section::MultipleChoice { .. } => SectionKind::MultipleChoice,
            Section::FillInBlank { .. } => SectionKind::FillInBlank,
            Section::Reading { .. } => SectionKind::Reading,
            Section::Writing { .. } => SectionKind::Writing,
            Section::TrueFalse { .. } => SectionKind::TrueFalse,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Section::Listening { title, .. }
            | Section::MultipleChoice { title, .. }
            | Section::FillInBlank { title, .. }
            | Section::Reading { title, .. }
            | Section::Writing { title, .. }
            | Section::TrueFalse { title, .. } => title,
        }
    }

    pub fn questions(&self) -> &[Question] {
        match self {
            Section::Listening { questions, .. }
            | Section::MultipleChoice { questions, .. }
            | Section::FillInBlank { questions, .. }
            | Section::Reading { questions, .. }
            | Section::Writing { questions, .. }
            | Section::TrueFalse { questions, .. } => questions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(deserialize_with = "lenient_u32")]
    pub id: u32,
    pub question: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub points: u32,
    #[serde(default, deserialize_with = "lenient_answer")]
    pub answer: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerKeyEntry {
    #[serde(deserialize_with = "lenient_u32")]
    pub id: u32,
    #[serde(default, deserialize_with = "lenient_answer")]
    pub answer: String,
    #[serde(default)]
    pub explanation: String,
}

impl From<&Question> for AnswerKeyEntry {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id,
            answer: question.answer.clone(),
            explanation: question.explanation.clone(),
        }
    }
}

impl TestPaper {
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.sections.iter().flat_map(|section| section.questions())
    }

    pub fn question_count(&self) -> usize {
        self.questions().count()
    }

    /// Sum of the per-question points, which may disagree with `total_score`.
    /// Saturates at `u32::MAX`, since points come from model output.
    pub fn points_total(&self) -> u32 {
        self.questions()
            .fold(0u32, |total, question| total.saturating_add(question.points))
    }

    /// Structural problems worth logging; none of them make the paper unusable
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.sections.is_empty() {
            issues.push("paper has no sections".to_string());
        }

        for section in &self.sections {
            if section.kind() == SectionKind::MultipleChoice {
                for question in section.questions() {
                    let option_count = question.options.as_ref().map_or(0, Vec::len);
                    if option_count != 4 {
                        issues.push(format!(
                            "multiple-choice question {} has {option_count} options",
                            question.id
                        ));
                    }
                }
            }
        }

        let has_listening = self.sections.iter().any(|s| s.kind() == SectionKind::Listening);
        if has_listening && self.listening_material.is_none() {
            issues.push("listening section without listening material".to_string());
        }

        for question in self.questions() {
            if !self.answer_key.iter().any(|entry| entry.id == question.id) {
                issues.push(format!("question {} missing from the answer key", question.id));
            }
        }

        if self.points_total() != self.total_score {
            issues.push(format!(
                "question points add up to {} but total score is {}",
                self.points_total(),
                self.total_score
            ));
        }

        issues
    }
}

/// Accepts 5, 5.0, "5" or " 5 " for an unsigned count
fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    struct NumberVisitor;

    impl<'de> Visitor<'de> for NumberVisitor {
        type Value = u32;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a non-negative number or numeric string")
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u32::try_from(value).map_err(|_| E::custom(format!("{value} is out of range")))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u32::try_from(value).map_err(|_| E::custom(format!("{value} is out of range")))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if value.is_finite() && value >= 0.0 && value <= u32::MAX as f64 {
                Ok(value.round() as u32)
            } else {
                Err(E::custom(format!("{value} is out of range")))
            }
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let trimmed = value.trim();
            if let Ok(n) = trimmed.parse::<u32>() {
                return Ok(n);
            }
            match trimmed.parse::<f64>() {
                Ok(f) => self.visit_f64(f),
                Err(_) => Err(E::custom(format!("'{value}' is not a number"))),
            }
        }
    }

    deserializer.deserialize_any(NumberVisitor)
}

/// Answers come back as strings, numbers, booleans or lists; all become text
fn lenient_answer<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct AnswerVisitor;

    impl<'de> Visitor<'de> for AnswerVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, number, boolean or list of answers")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(if value { "True" } else { "False" }.to_string())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(String::new())
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut parts = Vec::new();
            while let Some(part) = seq.next_element::<serde_json::Value>()? {
                match part {
                    serde_json::Value::String(s) => parts.push(s),
                    other => parts.push(other.to_string()),
                }
            }
            Ok(parts.join(", "))
        }
    }

    deserializer.deserialize_any(AnswerVisitor)
}
