use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;

use crate::error::KeywordExtractionError;

/// Pluggable keyword source so the tagger can be swapped or stubbed in tests.
pub trait KeywordTagger {
    fn extract_keywords(&self, text: &str) -> Result<Vec<String>, KeywordExtractionError>;
}

/// Closed-class words that carry no clustering signal.
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "the", "of", "to", "in", "on", "at", "by", "for", "with", "from", "into",
        "over", "under", "about", "after", "before", "between", "during", "through", "up", "down",
        "out", "off", "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us",
        "them", "my", "your", "his", "its", "our", "their", "this", "that", "these", "those",
        "and", "or", "but", "nor", "so", "yet", "if", "then", "than", "as", "is", "am", "are",
        "was", "were", "be", "been", "being", "do", "does", "did", "have", "has", "had", "will",
        "would", "can", "could", "shall", "should", "may", "might", "must", "not", "no",
    ]
    .into_iter()
    .collect()
});

/// Keeps content words (nouns, adjectives, verbs) by dropping closed-class
/// stopwords and purely numeric tokens.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicTagger;

impl KeywordTagger for HeuristicTagger {
    fn extract_keywords(&self, text: &str) -> Result<Vec<String>, KeywordExtractionError> {
        let mut keywords = Vec::new();
        for token in text.split(|ch: char| !ch.is_alphanumeric()) {
            if token.len() < 2 {
                continue;
            }
            if token.chars().all(|ch| ch.is_ascii_digit()) {
                continue;
            }
            let token = token.to_lowercase();
            if STOPWORDS.contains(token.as_str()) {
                continue;
            }
            keywords.push(token);
        }
        Ok(keywords)
    }
}

/// Best-effort first keyword of a filename stem. Tagger failures degrade to
/// `None` with a warning; they never abort the surrounding pipeline.
pub fn first_keyword(
    tagger: &dyn KeywordTagger,
    filename: &str,
    warnings: &mut Vec<String>,
) -> Option<String> {
    let stem = Path::new(filename).file_stem()?.to_string_lossy();
    let normalized = stem.replace('-', " ").to_lowercase();
    match tagger.extract_keywords(&normalized) {
        Ok(keywords) => keywords.into_iter().next(),
        Err(err) => {
            warnings.push(format!("keyword extraction skipped for {filename}: {err}"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{first_keyword, HeuristicTagger, KeywordTagger};
    use crate::error::KeywordExtractionError;

    struct FailingTagger;

    impl KeywordTagger for FailingTagger {
        fn extract_keywords(&self, text: &str) -> Result<Vec<String>, KeywordExtractionError> {
            Err(KeywordExtractionError::new(text, "tagger offline"))
        }
    }

    #[test]
    fn extracts_content_words_in_order() {
        let tagger = HeuristicTagger;
        let keywords = tagger
            .extract_keywords("report for the quarterly budget")
            .expect("keywords");
        assert_eq!(keywords, vec!["report", "quarterly", "budget"]);
    }

    #[test]
    fn drops_numbers_and_short_tokens() {
        let tagger = HeuristicTagger;
        let keywords = tagger.extract_keywords("2024 q3 1 report").expect("keywords");
        assert_eq!(keywords, vec!["q3", "report"]);
    }

    #[test]
    fn first_keyword_splits_hyphenated_stems() {
        let mut warnings = Vec::new();
        let keyword = first_keyword(&HeuristicTagger, "report-final.pdf", &mut warnings);
        assert_eq!(keyword.as_deref(), Some("report"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn first_keyword_is_case_insensitive() {
        let mut warnings = Vec::new();
        let keyword = first_keyword(&HeuristicTagger, "Report.pdf", &mut warnings);
        assert_eq!(keyword.as_deref(), Some("report"));
    }

    #[test]
    fn stopword_only_stem_yields_nothing() {
        let mut warnings = Vec::new();
        let keyword = first_keyword(&HeuristicTagger, "the-and-of.txt", &mut warnings);
        assert_eq!(keyword, None);
    }

    #[test]
    fn tagger_failure_degrades_to_none_with_warning() {
        let mut warnings = Vec::new();
        let keyword = first_keyword(&FailingTagger, "report.pdf", &mut warnings);
        assert_eq!(keyword, None);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("report.pdf"));
    }
}
