//! Cleanup for extracted document text.
//!
//! The pass order matters: whitespace is collapsed before tags are stripped,
//! and noise runs are replaced before long tokens are dropped. A removal can
//! leave two spaces side by side or expose a new token, so `normalize` repeats
//! the pass until the output stops changing.

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static CONTROL_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\x00-\x1F\x7F]").unwrap());

// Word boundaries here are ASCII-only, so a token glued to CJK text still matches
static IMAGE_FILE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?-u:\b)[A-Za-z0-9_]+\.(?:jpg|jpeg|png|gif|bmp|svg|tiff|webp)(?-u:\b)").unwrap()
});

static RELATIONSHIP_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?-u:\b)(?:rId[0-9]+|rel[0-9]+|image[0-9]+|picture[0-9]+)(?-u:\b)").unwrap()
});

static MARKUP_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

static DISALLOWED_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[^\x{4e00}-\x{9fa5}a-zA-Z0-9\s.,!?;:'"()\[\]{}]{8,}"#).unwrap()
});

/// Whole ASCII word holding 25+ alphanumerics in a row
static LONG_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u:\b)[A-Za-z0-9_]*[A-Za-z0-9]{25,}[A-Za-z0-9_]*(?-u:\b)").unwrap()
});

const REPEATABLE_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':'];

/// `"!!!"` → `"!"`, `"?!"` stays
fn collapse_repeated_punctuation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous: Option<char> = None;
    for c in text.chars() {
        if previous == Some(c) && REPEATABLE_PUNCTUATION.contains(&c) {
            continue;
        }
        out.push(c);
        previous = Some(c);
    }
    out
}

fn normalize_once(text: &str) -> String {
    let text = WHITESPACE_RUN.replace_all(text, " ");
    let text = CONTROL_CHARS.replace_all(&text, "");
    let text = collapse_repeated_punctuation(&text);
    let text = IMAGE_FILE_TOKEN.replace_all(&text, "");
    let text = RELATIONSHIP_ID.replace_all(&text, "");
    let text = MARKUP_TAG.replace_all(&text, "");
    let text = DISALLOWED_RUN.replace_all(&text, " ");
    let text = LONG_TOKEN.replace_all(&text, "");
    text.trim().to_string()
}

/// Normalize extracted text; `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    let mut current = normalize_once(text);
    loop {
        let next = normalize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Cut to at most `max_chars` characters, with no attempt at word boundaries
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

pub fn clean_and_cap(text: &str, max_chars: usize) -> String {
    truncate_chars(&normalize(text), max_chars).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_punctuation() {
        assert_eq!(normalize("  Hello,,,   world!!!\n\n\tHow are you??  "), "Hello, world! How are you?");
        assert_eq!(normalize("Wait?! Really..."), "Wait?! Really.");
    }

    #[test]
    fn removes_office_artifacts() {
        let input = "See photo1.PNG and rId12 here <a:t>tag</a:t> image3 done";
        assert_eq!(normalize(input), "See and here tag done");
    }

    #[test]
    fn drops_long_identifiers() {
        let input = "hash 3f9a8b7c6d5e4f3a2b1c0d9e8f7a6b5c end";
        assert_eq!(normalize(input), "hash end");
        // 24 characters is kept
        assert_eq!(normalize("id abcdefghijklmnopqrstuvwx"), "id abcdefghijklmnopqrstuvwx");
    }

    #[test]
    fn artifacts_glued_to_chinese_text_are_removed() {
        assert_eq!(normalize("图片3f9a8b7c6d5e4f3a2b1c0d9e8f7a6b5c结束"), "图片结束");
        assert_eq!(normalize("幻灯片rId12内容"), "幻灯片内容");
        assert_eq!(normalize("请看图片photo.png说明"), "请看图片说明");
    }

    #[test]
    fn long_run_inside_underscored_word_is_dropped() {
        assert_eq!(normalize("key _abcdefghijklmnopqrstuvwxyz end"), "key end");
        assert_eq!(normalize("snake_case_name stays"), "snake_case_name stays");
    }

    #[test]
    fn replaces_noise_runs_with_space() {
        assert_eq!(normalize("before~~~~~~~~after"), "before after");
        // Seven is below the run threshold
        assert_eq!(normalize("a~~~~~~~b"), "a~~~~~~~b");
    }

    #[test]
    fn noisy_latin1_run_between_sentences() {
        let mut text = String::from("The cat is white. ");
        let mut seed: u32 = 7;
        for _ in 0..50 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            text.push(char::from(200 + (seed >> 16) as u8 % 56));
        }
        text.push_str("so the color is white");

        assert_eq!(normalize(&text), "The cat is white. so the color is white");
    }

    #[test]
    fn normalize_is_idempotent() {
        let samples = [
            "",
            "   ",
            "plain text",
            "a.. ..b",
            "x <y> z",
            "photo.png.png",
            "rId1rId2 rel5",
            "~~~~~~~~ ~~~~~~~~",
            "A <b>VeryLongTokenThatKeepsGoingForever123</b> end",
            "Tab\there\u{0}and\u{7f}there!!!,,,;;",
            "中文内容测试。。。，，，",
            "\u{0007}\u{0008}\u{001b}[31mred",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "input: {sample:?}");
        }
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
        assert_eq!(truncate_chars("short", 30_000), "short");
        assert_eq!(truncate_chars("学习英语", 2), "学习");
    }

    #[test]
    fn clean_and_cap_respects_limit() {
        let long = "word ".repeat(10_000);
        let capped = clean_and_cap(&long, 30_000);
        assert!(capped.chars().count() <= 30_000);
        assert_eq!(clean_and_cap(&long, 9), "word word");
    }
}
