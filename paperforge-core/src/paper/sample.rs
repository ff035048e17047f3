//! Deterministic local paper used when no model output is available.

use super::request::{PaperRequest, QuestionAllocation};
use super::schema::{AnswerKeyEntry, Question, Section, TestPaper};

const LISTENING_MATERIAL: &str = "Hello everyone! My name is Lucy. I am eight years old. \
I live in Beijing with my family. I have a mother, a father, and a little brother. \
My brother is five years old. I like to play with my toys and read books. \
My favorite subject is English. I also like to draw pictures and sing songs. \
On weekends, I often go to the park with my family. We have a lot of fun together!";

struct ChoiceTemplate {
    question: &'static str,
    options: [&'static str; 4],
    answer: &'static str,
    explanation: &'static str,
}

const CHOICE_TEMPLATES: [ChoiceTemplate; 4] = [
    ChoiceTemplate {
        question: "What color is the sky?",
        options: ["Blue", "Red", "Green", "Yellow"],
        answer: "A",
        explanation: "The sky is blue, so the answer is A. Blue.",
    },
    ChoiceTemplate {
        question: "How many days are there in a week?",
        options: ["Five", "Six", "Seven", "Eight"],
        answer: "C",
        explanation: "A week has seven days, so the answer is C. Seven.",
    },
    ChoiceTemplate {
        question: "What do you say when you meet someone for the first time?",
        options: ["Goodbye", "Nice to meet you", "See you later", "Good night"],
        answer: "B",
        explanation: "When meeting someone for the first time we say 'Nice to meet you', so the answer is B.",
    },
    ChoiceTemplate {
        question: "What is the opposite of 'big'?",
        options: ["Small", "Tall", "Fast", "Happy"],
        answer: "A",
        explanation: "The opposite of 'big' is 'small', so the answer is A.",
    },
];

/// Hands out sequential question ids and records each answer
struct PaperBuilder {
    next_id: u32,
    sections: Vec<Section>,
    answer_key: Vec<AnswerKeyEntry>,
}

impl PaperBuilder {
    fn new() -> Self {
        Self {
            next_id: 1,
            sections: Vec::new(),
            answer_key: Vec::new(),
        }
    }

    fn questions<F>(&mut self, allocation: QuestionAllocation, mut make: F) -> Vec<Question>
    where
        F: FnMut(u32) -> (String, String, String, Option<Vec<String>>),
    {
        let points = allocation.score;
        (1..=allocation.bounded_count())
            .map(|n| {
                let (question, answer, explanation, options) = make(n);
                let question = Question {
                    id: self.next_id,
                    question,
                    points,
                    answer,
                    explanation,
                    options,
                };
                self.answer_key.push(AnswerKeyEntry::from(&question));
                self.next_id = self.next_id.saturating_add(1);
                question
            })
            .collect()
    }
}

/// Build the fallback paper for `request`.
///
/// Sections keep the fixed order listening, multiple choice, fill in the
/// blank, reading, writing; a type with a zero count is left out.
pub fn build_sample_paper(request: &PaperRequest) -> TestPaper {
    let types = &request.question_types;
    let mut builder = PaperBuilder::new();

    if types.listening.count > 0 {
        let questions = builder.questions(types.listening, |n| {
            (
                format!("Answer from the listening material: What is the girl's name? (Listening {n})"),
                "Lucy".to_string(),
                "The speaker begins with 'My name is Lucy', so the answer is Lucy.".to_string(),
                None,
            )
        });
        builder.sections.push(Section::Listening {
            title: "I. Listening".to_string(),
            questions,
            material: None,
        });
    }

    if types.multiple_choice.count > 0 {
        let questions = builder.questions(types.multiple_choice, |n| {
            let template = &CHOICE_TEMPLATES[(n as usize - 1) % CHOICE_TEMPLATES.len()];
            (
                format!("{} (Sample choice {n})", template.question),
                template.answer.to_string(),
                template.explanation.to_string(),
                Some(template.options.iter().map(|o| o.to_string()).collect()),
            )
        });
        builder.sections.push(Section::MultipleChoice {
            title: "II. Multiple Choice".to_string(),
            questions,
        });
    }

    if types.fill_in_blank.count > 0 {
        let questions = builder.questions(types.fill_in_blank, |n| {
            (
                format!("I _______ a student. (Sample blank {n})"),
                "am".to_string(),
                "The subject is 'I', so the verb 'be' takes the form 'am': 'I am a student'.".to_string(),
                None,
            )
        });
        builder.sections.push(Section::FillInBlank {
            title: "III. Fill in the Blanks".to_string(),
            questions,
        });
    }

    if types.reading.count > 0 {
        let questions = builder.questions(types.reading, |n| {
            (
                format!("What color is Tom's cat? (Sample reading {n})"),
                "White".to_string(),
                "The passage says 'The cat is white', so Tom's cat is white.".to_string(),
                None,
            )
        });
        builder.sections.push(Section::Reading {
            title: "IV. Reading Comprehension".to_string(),
            questions,
            passage: Some("Tom has a cat. The cat is white.".to_string()),
        });
    }

    if types.writing.count > 0 {
        let questions = builder.questions(types.writing, |n| {
            (
                format!("Write a short passage of at least 50 words about your family. (Sample writing {n})"),
                "Model answer: My family has three people. They are my father, my mother and me. \
                 My father is a teacher. My mother is a doctor. I am a student. We love each other very much."
                    .to_string(),
                "Marking points: complete content introducing family members; correct grammar and \
                 consistent tense; suitable vocabulary; required length; neat handwriting."
                    .to_string(),
                None,
            )
        });
        builder.sections.push(Section::Writing {
            title: "V. Writing".to_string(),
            questions,
        });
    }

    let section_count = builder.sections.len();
    TestPaper {
        title: format!(
            "{} English {} Test",
            request.grade_label(),
            request.difficulty_label()
        ),
        subtitle: format!("Theme: {}", request.theme_or_default()),
        instructions: format!(
            "This paper has {section_count} parts worth {} points in total. Read every question \
             carefully before answering. Listen closely to the recording for the listening part. \
             Time allowed: 60 minutes.",
            request.total_score
        ),
        total_score: request.total_score,
        listening_material: (types.listening.count > 0).then(|| LISTENING_MATERIAL.to_string()),
        sections: builder.sections,
        answer_key: builder.answer_key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::request::MAX_QUESTIONS_PER_TYPE;
    use crate::paper::schema::SectionKind;

    #[test]
    fn default_request_builds_all_five_sections() {
        let paper = build_sample_paper(&PaperRequest::default());
        let kinds: Vec<SectionKind> = paper.sections.iter().map(Section::kind).collect();
        assert_eq!(
            kinds,
            vec![
                SectionKind::Listening,
                SectionKind::MultipleChoice,
                SectionKind::FillInBlank,
                SectionKind::Reading,
                SectionKind::Writing,
            ]
        );
        assert_eq!(paper.question_count(), 26);
        assert_eq!(paper.answer_key.len(), 26);
        assert_eq!(paper.title, "Grade 3 English Intermediate Test");
        assert!(paper.issues().is_empty(), "{:?}", paper.issues());
    }

    #[test]
    fn ids_are_sequential_across_sections() {
        let paper = build_sample_paper(&PaperRequest::default());
        let ids: Vec<u32> = paper.questions().map(|q| q.id).collect();
        let expected: Vec<u32> = (1..=26).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn choice_templates_cycle() {
        let mut request = PaperRequest::default();
        request.question_types.listening = QuestionAllocation::new(0, 0);
        request.question_types.multiple_choice = QuestionAllocation::new(6, 5);

        let paper = build_sample_paper(&request);
        let choices = paper.sections[0].questions();
        assert_eq!(choices.len(), 6);
        assert!(choices[4].question.starts_with("What color is the sky?"));
        assert!(choices[4].question.ends_with("(Sample choice 5)"));
        assert_eq!(choices[1].answer, "C");
        assert!(choices.iter().all(|q| q.options.as_ref().map(Vec::len) == Some(4)));
    }

    #[test]
    fn zero_counts_drop_sections_and_material() {
        let request = PaperRequest {
            theme: "Food".into(),
            question_types: crate::paper::request::QuestionTypes {
                listening: QuestionAllocation::new(0, 5),
                multiple_choice: QuestionAllocation::new(0, 5),
                fill_in_blank: QuestionAllocation::new(2, 5),
                reading: QuestionAllocation::new(0, 5),
                writing: QuestionAllocation::new(0, 5),
            },
            ..PaperRequest::default()
        };
        let paper = build_sample_paper(&request);
        assert_eq!(paper.sections.len(), 1);
        assert!(paper.listening_material.is_none());
        assert_eq!(paper.subtitle, "Theme: Food");
        assert!(paper.instructions.starts_with("This paper has 1 parts"));
    }

    #[test]
    fn huge_counts_are_capped_per_section() {
        let mut request = PaperRequest::default();
        request.question_types.reading = QuestionAllocation::new(u32::MAX, 2);

        let paper = build_sample_paper(&request);
        let reading = paper
            .sections
            .iter()
            .find(|s| s.kind() == SectionKind::Reading)
            .unwrap();
        assert_eq!(reading.questions().len(), MAX_QUESTIONS_PER_TYPE as usize);
        assert_eq!(paper.answer_key.len(), paper.question_count());
        assert_eq!(paper.questions().last().map(|q| q.id), Some(paper.question_count() as u32));
    }
}
