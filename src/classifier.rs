use crate::models::{Candidate, Mode};

const FOCUS_KEYWORDS: [&str; 3] = ["focus", "study", "work"];
const BREAK_KEYWORDS: [&str; 3] = ["break", "rest", "pause"];

/// Maps recognized text to a candidate mode by keyword substring match.
///
/// Focus keywords are tested before break keywords, so text containing both
/// classifies as focus. Empty text is evidence of idleness and maps to IDLE;
/// non-empty text matching neither set is [`Candidate::Unclassifiable`].
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    focus: Vec<String>,
    rest: Vec<String>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(FOCUS_KEYWORDS, BREAK_KEYWORDS)
    }
}

impl KeywordClassifier {
    pub fn new<F, B>(focus: F, rest: B) -> Self
    where
        F: IntoIterator,
        F::Item: AsRef<str>,
        B: IntoIterator,
        B::Item: AsRef<str>,
    {
        Self {
            focus: normalize_keywords(focus),
            rest: normalize_keywords(rest),
        }
    }

    pub fn classify(&self, raw_text: &str) -> Candidate {
        let text = raw_text.trim().to_lowercase();
        if text.is_empty() {
            return Candidate::Mode(Mode::Idle);
        }

        if contains_any(&text, &self.focus) {
            Candidate::Mode(Mode::Focus)
        } else if contains_any(&text, &self.rest) {
            Candidate::Mode(Mode::Break)
        } else {
            Candidate::Unclassifiable
        }
    }
}

/// Classifies with the default keyword sets.
pub fn classify(raw_text: &str) -> Candidate {
    KeywordClassifier::default().classify(raw_text)
}

fn normalize_keywords<I>(keywords: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    keywords
        .into_iter()
        .map(|keyword| keyword.as_ref().trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .collect()
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|keyword| text.contains(keyword.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_cases() {
        assert_eq!(classify(""), Candidate::Mode(Mode::Idle));
        assert_eq!(classify("let's study"), Candidate::Mode(Mode::Focus));
        assert_eq!(classify("time for a break"), Candidate::Mode(Mode::Break));
        assert_eq!(classify("abcxyz"), Candidate::Unclassifiable);
        assert_eq!(classify("focus and break"), Candidate::Mode(Mode::Focus));
    }

    #[test]
    fn whitespace_only_is_idle() {
        assert_eq!(classify("  \n\t "), Candidate::Mode(Mode::Idle));
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        assert_eq!(classify("  HOMEWORK\n"), Candidate::Mode(Mode::Focus));
        assert_eq!(classify("Restroom"), Candidate::Mode(Mode::Break));
        assert_eq!(classify("PAUSED"), Candidate::Mode(Mode::Break));
    }

    #[test]
    fn focus_wins_regardless_of_position() {
        assert_eq!(classify("break, then work"), Candidate::Mode(Mode::Focus));
    }

    #[test]
    fn custom_keyword_sets() {
        let classifier = KeywordClassifier::new(["Deep Work"], ["lunch", " "]);
        assert_eq!(classifier.classify("deep work block"), Candidate::Mode(Mode::Focus));
        assert_eq!(classifier.classify("work"), Candidate::Unclassifiable);
        assert_eq!(classifier.classify("LUNCH"), Candidate::Mode(Mode::Break));
        // blank keywords are dropped instead of matching everything
        assert_eq!(classifier.classify("a b"), Candidate::Unclassifiable);
    }

    #[test]
    fn deterministic_for_identical_input() {
        let classifier = KeywordClassifier::default();
        let first = classifier.classify("Rest and study");
        for _ in 0..10 {
            assert_eq!(classifier.classify("Rest and study"), first);
        }
    }
}
