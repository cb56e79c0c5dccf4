//! Unit canonicalization
//!
//! Turns the tutor model's loosely-typed candidate list, the corrected
//! sentence and the raw utterance into a deduplicated list of typed units.
//!
//! Output is ordered by kind precedence (pattern, sentence, chunk, word) and
//! stable with respect to discovery order inside each kind. The validation
//! gate relies on that order for its coverage checks.

use std::collections::{HashMap, HashSet};

use lingua_config::PedagogyConfig;
use lingua_core::{CanonicalUnit, UnitKind, UnitSource};
use serde_json::Value;

use crate::heuristic::HeuristicExtractor;
use crate::normalize::{comparison_key, comparison_tokens, contains_run, normalize, tokenize, unit_tokens};
use crate::patterns::PatternSet;

/// Object keys searched, in order, when a candidate arrives as an object
const CANDIDATE_TEXT_KEYS: [&str; 3] = ["text", "word", "phrase"];

/// Coerce raw candidate values into strings
///
/// Strings pass through, numbers are stringified, objects contribute their
/// `text`/`word`/`phrase` field. Anything else is skipped.
pub fn coerce_candidates(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(|value| match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Object(map) => CANDIDATE_TEXT_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .map(str::to_string),
            other => {
                tracing::debug!(candidate = %other, "Skipping non-text vocabulary candidate");
                None
            }
        })
        .collect()
}

/// Classify a normalized candidate by its shape
pub fn classify_kind(normalized: &str) -> UnitKind {
    if !normalized.contains(' ') {
        return UnitKind::Word;
    }
    if tokenize(normalized).len() >= 3 {
        UnitKind::Sentence
    } else {
        UnitKind::Chunk
    }
}

#[derive(Debug, Clone)]
pub struct Canonicalizer {
    patterns: PatternSet,
    heuristic: HeuristicExtractor,
    stopwords: HashSet<String>,
}

impl Canonicalizer {
    pub fn new(patterns: PatternSet, heuristic: HeuristicExtractor, stopwords: &[String]) -> Self {
        Self {
            patterns,
            heuristic,
            stopwords: stopwords.iter().map(|s| comparison_key(s)).collect(),
        }
    }

    pub fn from_config(config: &PedagogyConfig) -> Self {
        Self::new(
            PatternSet::from_rules(&config.pattern_rules),
            HeuristicExtractor::from_config(config),
            &config.stopwords,
        )
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Canonical units for one turn
    ///
    /// An empty `corrected` means no correction was needed; pattern mining
    /// and the bare-word fallback then read the raw utterance.
    pub fn canonicalize(&self, candidates: &[Value], corrected: &str, raw: &str) -> Vec<CanonicalUnit> {
        let raw_norm = normalize(raw);
        let corrected_norm = normalize(corrected);
        let mining_text = if corrected_norm.is_empty() {
            raw_norm.as_str()
        } else {
            corrected_norm.as_str()
        };
        let raw_tokens = comparison_tokens(&raw_norm);
        let source_of = |text: &str| {
            if contains_run(&raw_tokens, &unit_tokens(text)) {
                UnitSource::AsSaid
            } else {
                UnitSource::Corrected
            }
        };

        let mut candidates = coerce_candidates(candidates);
        if candidates.is_empty() {
            candidates = self.heuristic.extract(raw);
        }

        let mut discovered: Vec<CanonicalUnit> = Vec::new();

        // Constructions mined from the corrected sentence
        for pattern in self.patterns.detect(mining_text) {
            let source = if pattern.found_in(&raw_norm) {
                UnitSource::AsSaid
            } else {
                UnitSource::Corrected
            };
            discovered.push(pattern.unit(source));
        }

        let mut seen: HashSet<String> = HashSet::new();
        for candidate in &candidates {
            let text = normalize(candidate);
            if text.is_empty() || tokenize(&text).is_empty() || !seen.insert(text.clone()) {
                continue;
            }

            let kind = classify_kind(&text);
            if kind != UnitKind::Word {
                if let Some(pattern) = self.patterns.classify(&text) {
                    discovered.push(pattern.unit(source_of(&text)));
                    continue;
                }
            }

            let source = source_of(&text);
            discovered.push(CanonicalUnit::lexical(text, kind, source));
        }

        // Only bare words so far: fall back to the content words of the sentence
        if discovered.iter().all(|u| u.kind == UnitKind::Word) {
            for token in tokenize(mining_text) {
                if self.stopwords.contains(&comparison_key(&token)) || !seen.insert(token.clone()) {
                    continue;
                }
                let source = source_of(&token);
                discovered.push(CanonicalUnit::lexical(token, UnitKind::Word, source));
            }
        }

        let units = resolve_precedence(discovered);
        tracing::debug!(
            candidates = candidates.len(),
            units = units.len(),
            "Canonicalized turn candidates"
        );
        units
    }
}

/// Keep one unit per canonical key, the highest-precedence one, then order
/// by precedence
fn resolve_precedence(discovered: Vec<CanonicalUnit>) -> Vec<CanonicalUnit> {
    let mut slots: Vec<CanonicalUnit> = Vec::with_capacity(discovered.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for unit in discovered {
        match index.get(&unit.canonical_key) {
            Some(&i) => {
                if unit.kind.precedence() > slots[i].kind.precedence() {
                    slots[i] = unit;
                }
            }
            None => {
                index.insert(unit.canonical_key.clone(), slots.len());
                slots.push(unit);
            }
        }
    }

    // sort_by is stable
    slots.sort_by(|a, b| b.kind.precedence().cmp(&a.kind.precedence()));
    slots
}
