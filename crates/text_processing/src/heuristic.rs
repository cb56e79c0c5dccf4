//! Heuristic candidate extraction
//!
//! Used when the tutor model proposes no vocabulary at all, so a turn still
//! yields something to validate.

use std::collections::HashSet;

use lingua_config::{HeuristicChunk, PedagogyConfig};

use crate::normalize::{comparison_key, comparison_tokens, contains_run, grapheme_len, normalize, tokenize};

#[derive(Debug, Clone)]
pub struct HeuristicExtractor {
    chunks: Vec<(String, Vec<Vec<String>>)>,
    stopwords: HashSet<String>,
    max_tokens: usize,
}

impl HeuristicExtractor {
    pub fn new(chunks: &[HeuristicChunk], stopwords: &[String], max_tokens: usize) -> Self {
        let chunks = chunks
            .iter()
            .map(|chunk| {
                let variants = chunk
                    .variants
                    .iter()
                    .chain(std::iter::once(&chunk.canonical))
                    .map(|v| comparison_tokens(v))
                    .filter(|tokens| !tokens.is_empty())
                    .collect();
                (normalize(&chunk.canonical), variants)
            })
            .collect();

        Self {
            chunks,
            stopwords: stopwords.iter().map(|s| comparison_key(s)).collect(),
            max_tokens,
        }
    }

    pub fn from_config(config: &PedagogyConfig) -> Self {
        Self::new(
            &config.heuristic_chunks,
            &config.stopwords,
            config.heuristic_max_tokens,
        )
    }

    /// Candidate phrases for an utterance
    ///
    /// Known chunks win; otherwise the first `max_tokens` content words,
    /// repeats dropped; otherwise the whole utterance. An empty utterance
    /// yields nothing.
    pub fn extract(&self, utterance: &str) -> Vec<String> {
        let normalized = normalize(utterance);
        if normalized.is_empty() {
            return Vec::new();
        }

        let utterance_tokens = comparison_tokens(&normalized);
        let chunks: Vec<String> = self
            .chunks
            .iter()
            .filter(|(_, variants)| {
                variants
                    .iter()
                    .any(|variant| contains_run(&utterance_tokens, variant))
            })
            .map(|(canonical, _)| canonical.clone())
            .collect();
        if !chunks.is_empty() {
            return chunks;
        }

        let mut seen = HashSet::new();
        let words: Vec<String> = tokenize(&normalized)
            .into_iter()
            .filter(|token| grapheme_len(token) > 1)
            .filter(|token| !self.stopwords.contains(&comparison_key(token)))
            .take(self.max_tokens)
            .filter(|token| seen.insert(token.clone()))
            .collect();
        if !words.is_empty() {
            return words;
        }

        vec![normalized]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> HeuristicExtractor {
        HeuristicExtractor::from_config(&PedagogyConfig::default())
    }

    #[test]
    fn test_single_word() {
        assert_eq!(extractor().extract("Bonjour"), vec!["bonjour"]);
    }

    #[test]
    fn test_known_chunks_win() {
        let found = extractor().extract("Salut, ca va ? J'habite à Lyon.");
        assert_eq!(found, vec!["ça va", "j'habite"]);
    }

    #[test]
    fn test_content_words_capped() {
        let found = extractor().extract("le chat mange une souris grise");
        assert_eq!(found, vec!["chat", "mange", "souris"]);
    }

    #[test]
    fn test_repeats_count_toward_the_cap() {
        let found = extractor().extract("chat chat chien souris");
        assert_eq!(found, vec!["chat", "chien"]);
    }

    #[test]
    fn test_only_stopwords_falls_back_to_utterance() {
        assert_eq!(extractor().extract("Je   et"), vec!["je et"]);
    }

    #[test]
    fn test_empty_utterance() {
        assert!(extractor().extract("   ").is_empty());
    }
}
