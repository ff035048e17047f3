use crate::config::GarbledThresholds;
use serde::Serialize;
use tracing::debug;

/// Character counts behind a garbled/readable decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextStats {
    pub total_chars: usize,
    pub valid_chars: usize,
    pub readable_chars: usize,
    pub valid_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub garbled: bool,
    pub stats: TextStats,
}

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

fn is_valid_char(c: char) -> bool {
    is_cjk(c)
        || c.is_ascii_alphanumeric()
        || c.is_whitespace()
        || matches!(c, '.' | ',' | '!' | '?' | ';' | ':' | '\'' | '"' | '(' | ')' | '[' | ']' | '{' | '}')
}

impl TextStats {
    pub fn measure(text: &str) -> Self {
        let mut total_chars = 0;
        let mut valid_chars = 0;
        let mut readable_chars = 0;

        for c in text.chars() {
            total_chars += 1;
            if is_valid_char(c) {
                valid_chars += 1;
            }
            if is_cjk(c) || c.is_ascii_alphabetic() {
                readable_chars += 1;
            }
        }

        let valid_ratio = if total_chars == 0 {
            0.0
        } else {
            valid_chars as f64 / total_chars as f64
        };

        Self {
            total_chars,
            valid_chars,
            readable_chars,
            valid_ratio,
        }
    }
}

/// Rejects extraction output that is mostly noise.
///
/// Both conditions must hold for a text to count as garbled: a low share of
/// valid characters and few readable letters/ideographs. Noisy text with
/// enough real words gets through.
#[derive(Debug, Clone, Default)]
pub struct GarbledTextClassifier {
    thresholds: GarbledThresholds,
}

impl GarbledTextClassifier {
    pub fn new(thresholds: GarbledThresholds) -> Self {
        Self { thresholds }
    }

    pub fn classify(&self, text: &str) -> Classification {
        let stats = TextStats::measure(text);
        let garbled = if stats.total_chars < self.thresholds.min_length {
            true
        } else {
            stats.valid_ratio < self.thresholds.min_valid_ratio
                && stats.readable_chars < self.thresholds.min_readable_chars
        };

        debug!(
            "🔍 Classified {} chars: valid ratio {:.2}, readable {} → garbled={}",
            stats.total_chars, stats.valid_ratio, stats.readable_chars, garbled
        );

        Classification { garbled, stats }
    }

    pub fn is_garbled(&self, text: &str) -> bool {
        self.classify(text).garbled
    }
}

pub fn is_garbled(text: &str, thresholds: &GarbledThresholds) -> bool {
    GarbledTextClassifier::new(thresholds.clone()).is_garbled(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> GarbledTextClassifier {
        GarbledTextClassifier::default()
    }

    #[test]
    fn short_text_is_always_garbled() {
        assert!(classifier().is_garbled(""));
        assert!(classifier().is_garbled("abcd"));
        assert!(!classifier().is_garbled("abcde"));
    }

    #[test]
    fn cjk_run_survives_any_amount_of_noise() {
        let cjk: String = std::iter::repeat('学').take(25).collect();
        for noise_len in [0, 10, 1_000, 50_000] {
            let noise: String = std::iter::repeat('\u{fffd}').take(noise_len).collect();
            let text = format!("{noise}{cjk}{noise}");
            assert!(!classifier().is_garbled(&text), "noise length {noise_len}");
        }
    }

    #[test]
    fn garbled_needs_both_conditions() {
        // Low ratio but 20 readable letters: accepted
        let letters = "abcdefghijklmnopqrst";
        let noise: String = std::iter::repeat('§').take(200).collect();
        assert!(!classifier().is_garbled(&format!("{noise}{letters}")));

        // Low ratio and 19 readable letters: garbled
        let text = format!("{noise}{}", &letters[..19]);
        let result = classifier().classify(&text);
        assert!(result.garbled);
        assert_eq!(result.stats.readable_chars, 19);
        assert!(result.stats.valid_ratio < 0.2);
    }

    #[test]
    fn mostly_punctuation_is_still_valid() {
        let result = classifier().classify("(1) [2] {3}; ok?");
        assert!(!result.garbled);
        assert_eq!(result.stats.valid_chars, result.stats.total_chars);
    }

    #[test]
    fn thresholds_are_tunable() {
        let strict = GarbledThresholds {
            min_valid_ratio: 0.9,
            min_readable_chars: 1_000,
            ..GarbledThresholds::default()
        };
        assert!(is_garbled("plain words ~~~~ §§§§", &strict));
        assert!(!is_garbled("plain words ~~~~ §§§§", &GarbledThresholds::default()));
    }
}
