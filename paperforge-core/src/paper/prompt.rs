use super::request::{PaperRequest, QuestionAllocation};
use crate::normalizer::truncate_chars;

/// Reply the model is told to give when uploaded text is unusable
pub const GARBLED_REPLY: &str = "The document content appears garbled and could not be analysed.";

const KNOWLEDGE_POINT_WORD_LIMIT: usize = 300;

fn allocation_line(label: &str, allocation: &QuestionAllocation) -> Option<String> {
    (allocation.count > 0).then(|| {
        format!(
            "- {label}: {} questions, {} points each",
            allocation.count, allocation.score
        )
    })
}

/// Prompt asking the model for a complete paper as JSON
pub fn build_generation_prompt(request: &PaperRequest) -> String {
    let types = &request.question_types;
    let allocations: Vec<String> = [
        ("Listening (type \"listening\")", &types.listening),
        ("Multiple choice (type \"multipleChoice\", exactly 4 options)", &types.multiple_choice),
        ("Fill in the blank (type \"fillInBlank\")", &types.fill_in_blank),
        ("Reading comprehension (type \"reading\")", &types.reading),
        ("Writing (type \"writing\")", &types.writing),
    ]
    .iter()
    .filter_map(|(label, allocation)| allocation_line(label, allocation))
    .collect();

    let mut prompt = format!(
        "Create a {} primary school English test paper at {} difficulty.\n\
         Theme: {}\n\
         Total score: {}\n\
         Sections:\n{}\n",
        request.grade_label(),
        request.difficulty_label(),
        request.theme_or_default(),
        request.total_score,
        allocations.join("\n")
    );

    let knowledge_points = request.knowledge_points.trim();
    if !knowledge_points.is_empty() {
        prompt.push_str(&format!("Knowledge points to cover:\n{knowledge_points}\n"));
    }

    if types.listening.count > 0 {
        prompt.push_str("Include the full listening script in \"listeningMaterial\".\n");
    }

    prompt.push_str(
        "Reply with JSON only, with the fields title, subtitle, instructions, totalScore, \
         listeningMaterial, sections and answerKey. Every question needs id, question, points, \
         answer and explanation. Question ids run sequentially across all sections.",
    );
    prompt
}

/// Prompt asking the model to summarise uploaded text into knowledge points.
///
/// `max_chars` caps the document text embedded in the prompt.
pub fn build_knowledge_point_prompt(text: &str, max_chars: usize) -> String {
    format!(
        "Summarise the English teaching knowledge points in the document below \
         (vocabulary, grammar, sentence patterns) in at most {KNOWLEDGE_POINT_WORD_LIMIT} words. \
         If the content is garbled or unreadable, reply exactly: \"{GARBLED_REPLY}\"\n\n\
         Document:\n{}",
        truncate_chars(text, max_chars)
    )
}
