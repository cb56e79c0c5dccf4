//! Validation gate
//!
//! Every canonical unit runs through an ordered list of checks that
//! short-circuits on the first rejection. Coverage checks look at units
//! accepted earlier in the same pass, so the pass is a fold over an
//! [`AcceptanceState`] that each decision consumes and hands on.

use std::collections::HashSet;

use lingua_config::{GateThresholds, PedagogyConfig};
use lingua_core::{CanonicalUnit, RejectReason, UnitKind, ValidatedUnit};
use lingua_text_processing::{
    comparison_key, comparison_tokens, contains_run, grapheme_len, tokenize, unit_tokens,
};

/// Token sets of the units accepted so far in one pass
#[derive(Debug, Clone, Default)]
pub struct AcceptanceState {
    structural: Vec<HashSet<String>>,
    all: Vec<HashSet<String>>,
}

impl AcceptanceState {
    /// State after accepting one more unit
    pub fn accept(mut self, tokens: HashSet<String>, kind: UnitKind) -> Self {
        if kind.is_structural() {
            self.structural.push(tokens.clone());
        }
        self.all.push(tokens);
        self
    }

    pub fn accepted_count(&self) -> usize {
        self.all.len()
    }

    fn covered_by_structure(&self, tokens: &HashSet<String>) -> bool {
        !tokens.is_empty() && self.structural.iter().any(|set| tokens.is_subset(set))
    }

    fn covered_by_any(&self, tokens: &HashSet<String>) -> bool {
        !tokens.is_empty() && self.all.iter().any(|set| tokens.is_subset(set))
    }
}

/// Per-turn texts the gate checks units against
#[derive(Debug, Clone)]
pub struct TurnEvidence {
    raw_tokens: Vec<String>,
    /// `None` when no correction was needed
    corrected_tokens: Option<Vec<String>>,
    mission_keywords: HashSet<String>,
    correction_changed: bool,
}

/// Result of gating one turn
#[derive(Debug, Clone, PartialEq)]
pub struct GateOutcome {
    /// Decisions in evaluation order
    pub units: Vec<ValidatedUnit>,
    pub quality_score: f32,
}

impl GateOutcome {
    pub fn accepted(&self) -> Vec<ValidatedUnit> {
        self.units.iter().filter(|u| u.is_accepted).cloned().collect()
    }

    pub fn rejected(&self) -> Vec<ValidatedUnit> {
        self.units.iter().filter(|u| !u.is_accepted).cloned().collect()
    }

    pub fn accepted_count(&self) -> usize {
        self.units.iter().filter(|u| u.is_accepted).count()
    }
}

#[derive(Debug, Clone)]
pub struct ValidationGate {
    stubs: HashSet<String>,
    stopwords: HashSet<String>,
    thresholds: GateThresholds,
}

impl ValidationGate {
    pub fn new(stubs: &[String], stopwords: &[String], thresholds: GateThresholds) -> Self {
        Self {
            stubs: stubs.iter().map(|s| comparison_key(s)).collect(),
            stopwords: stopwords.iter().map(|s| comparison_key(s)).collect(),
            thresholds,
        }
    }

    pub fn from_config(config: &PedagogyConfig) -> Self {
        Self::new(&config.incomplete_stubs, &config.stopwords, config.gate.clone())
    }

    pub fn thresholds(&self) -> &GateThresholds {
        &self.thresholds
    }

    /// Gather the evidence for one turn
    ///
    /// Mission keywords are the hint's content words of at least
    /// `mission_keyword_min_len` characters.
    pub fn evidence(&self, raw: &str, corrected: &str, mission_hint: &str) -> TurnEvidence {
        let raw_tokens = comparison_tokens(raw);
        let corrected_tokens = comparison_tokens(corrected);
        let corrected_tokens = if corrected_tokens.is_empty() {
            None
        } else {
            Some(corrected_tokens)
        };
        // Accents and apostrophes count as corrections; case and punctuation do not
        let correction_changed = corrected_tokens.is_some() && tokenize(corrected) != tokenize(raw);

        let mission_keywords = comparison_tokens(mission_hint)
            .into_iter()
            .filter(|t| grapheme_len(t) >= self.thresholds.mission_keyword_min_len)
            .filter(|t| !self.stopwords.contains(t))
            .collect();

        TurnEvidence {
            raw_tokens,
            corrected_tokens,
            mission_keywords,
            correction_changed,
        }
    }

    /// Share of the unit's tokens that are mission keywords
    pub fn mission_relevance(&self, unit: &CanonicalUnit, evidence: &TurnEvidence) -> f32 {
        let tokens: HashSet<String> = unit_tokens(&unit.text).into_iter().collect();
        let overlap = tokens
            .iter()
            .filter(|t| evidence.mission_keywords.contains(*t))
            .count();
        let relevance = overlap as f32 / tokens.len().max(1) as f32;
        if unit.kind.is_structural() {
            relevance.max(self.thresholds.structural_relevance_floor)
        } else {
            relevance
        }
    }

    /// Attestation-based confidence with structural floors
    pub fn confidence(&self, unit: &CanonicalUnit, evidence: &TurnEvidence) -> f32 {
        let tokens = unit_tokens(&unit.text);
        let in_raw = contains_run(&evidence.raw_tokens, &tokens);
        let in_corrected = evidence
            .corrected_tokens
            .as_ref()
            .map(|corrected| contains_run(corrected, &tokens))
            .unwrap_or(false);

        let t = &self.thresholds;
        let base = match (in_raw, in_corrected) {
            (true, true) => t.confidence_both,
            (true, false) | (false, true) => t.confidence_one,
            (false, false) => t.confidence_none,
        };
        match unit.kind {
            UnitKind::Pattern => base.max(t.pattern_confidence_floor),
            UnitKind::Sentence => base.max(t.sentence_confidence_floor),
            _ => base,
        }
    }

    /// Decide one unit against the units accepted so far
    pub fn evaluate(
        &self,
        unit: &CanonicalUnit,
        evidence: &TurnEvidence,
        state: AcceptanceState,
    ) -> (ValidatedUnit, AcceptanceState) {
        let t = &self.thresholds;
        let key = comparison_key(&unit.text);
        let reject = |reason, confidence, relevance| ValidatedUnit::rejected(unit, reason, confidence, relevance);

        if unit.kind.is_lexical() && self.stubs.contains(&key) {
            return (reject(RejectReason::IncompletePattern, 0.0, 0.0), state);
        }

        if unit.kind == UnitKind::Chunk && tokenize(&unit.text).len() >= t.breadth_threshold {
            return (reject(RejectReason::TooBroad, 0.0, 0.0), state);
        }

        if grapheme_len(&unit.text) <= 1 {
            return (reject(RejectReason::TooShort, 0.0, 0.0), state);
        }

        if self.stopwords.contains(&key) {
            return (reject(RejectReason::StopWord, 0.0, 0.0), state);
        }

        let relevance = self.mission_relevance(unit, evidence);
        let tokens = unit_tokens(&unit.text);

        if unit.kind.is_lexical() {
            if let Some(corrected) = &evidence.corrected_tokens {
                if !contains_run(corrected, &tokens) {
                    return (reject(RejectReason::GrammarInvalid, 0.0, relevance), state);
                }
            }
        }

        let confidence = self.confidence(unit, evidence);

        if confidence < t.min_confidence {
            return (reject(RejectReason::LowConfidence, confidence, relevance), state);
        }

        if confidence < t.off_mission_confidence && relevance < t.off_mission_relevance {
            return (reject(RejectReason::OffMission, confidence, relevance), state);
        }

        let token_set: HashSet<String> = tokens.into_iter().collect();

        if unit.kind.is_lexical() && state.covered_by_structure(&token_set) {
            return (reject(RejectReason::CoveredByPattern, confidence, relevance), state);
        }

        if unit.kind == UnitKind::Word
            && state.covered_by_any(&token_set)
            && relevance < t.chunk_coverage_relevance
        {
            return (reject(RejectReason::CoveredByChunk, confidence, relevance), state);
        }

        (
            ValidatedUnit::accepted(unit, confidence, relevance),
            state.accept(token_set, unit.kind),
        )
    }

    /// Gate every unit in order and score the turn
    pub fn run(&self, units: &[CanonicalUnit], evidence: &TurnEvidence) -> GateOutcome {
        let (decisions, _) = units.iter().fold(
            (Vec::with_capacity(units.len()), AcceptanceState::default()),
            |(mut decisions, state), unit| {
                let (decision, state) = self.evaluate(unit, evidence, state);
                if let Some(reason) = decision.reject_reason {
                    tracing::debug!(unit = %decision.text, kind = %decision.kind, reason = %reason, "Unit rejected");
                }
                decisions.push(decision);
                (decisions, state)
            },
        );

        let accepted = decisions.iter().filter(|u| u.is_accepted).count();
        let quality_score = self.quality_score(accepted, decisions.len(), evidence.correction_changed);

        GateOutcome {
            units: decisions,
            quality_score,
        }
    }

    /// Turn quality from the accepted ratio and the correction penalty
    pub fn quality_score(&self, accepted: usize, total: usize, correction_changed: bool) -> f32 {
        let t = &self.thresholds;
        let ratio = accepted as f32 / total.max(1) as f32;
        let bonus = if accepted > 0 { t.any_accepted_bonus } else { 0.0 };
        let penalty = if correction_changed { t.correction_penalty } else { 0.0 };
        (ratio * t.accepted_weight + bonus - penalty).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingua_core::UnitSource;

    const HINT: &str = "Introduce yourself in two short sentences.";

    fn gate() -> ValidationGate {
        ValidationGate::from_config(&PedagogyConfig::default())
    }

    fn word(text: &str) -> CanonicalUnit {
        CanonicalUnit::lexical(text, UnitKind::Word, UnitSource::AsSaid)
    }

    fn chunk(text: &str) -> CanonicalUnit {
        CanonicalUnit::lexical(text, UnitKind::Chunk, UnitSource::AsSaid)
    }

    fn pattern(id: &str, template: &str) -> CanonicalUnit {
        CanonicalUnit::new(template, UnitKind::Pattern, UnitSource::AsSaid, CanonicalUnit::pattern_key(id))
    }

    fn decide(unit: &CanonicalUnit, raw: &str, corrected: &str) -> ValidatedUnit {
        let gate = gate();
        let evidence = gate.evidence(raw, corrected, HINT);
        gate.evaluate(unit, &evidence, AcceptanceState::default()).0
    }

    #[test]
    fn test_accepts_attested_word() {
        let unit = decide(&word("bonjour"), "Bonjour", "");
        assert!(unit.is_accepted);
        assert_eq!(unit.confidence, 0.75);
        assert_eq!(unit.mission_relevance, 0.0);
    }

    #[test]
    fn test_incomplete_stub() {
        let unit = decide(&chunk("je suis"), "je suis", "");
        assert_eq!(unit.reject_reason, Some(RejectReason::IncompletePattern));
        let unit = decide(&word("j'aime"), "j'aime", "");
        assert_eq!(unit.reject_reason, Some(RejectReason::IncompletePattern));
    }

    #[test]
    fn test_too_broad_chunk() {
        let unit = decide(&chunk("il fait très beau"), "il fait très beau", "");
        assert_eq!(unit.reject_reason, Some(RejectReason::TooBroad));
    }

    #[test]
    fn test_too_short_and_stop_word() {
        assert_eq!(decide(&word("a"), "a", "").reject_reason, Some(RejectReason::TooShort));
        assert_eq!(decide(&word("ç"), "ç", "").reject_reason, Some(RejectReason::TooShort));
        assert_eq!(decide(&word("les"), "les", "").reject_reason, Some(RejectReason::StopWord));
    }

    #[test]
    fn test_grammar_invalid_when_missing_from_correction() {
        let unit = decide(&word("dors"), "le chat dors", "Le chat dort.");
        assert_eq!(unit.reject_reason, Some(RejectReason::GrammarInvalid));

        let unit = decide(&word("dort"), "le chat dors", "Le chat dort.");
        assert!(unit.is_accepted);
        assert_eq!(unit.confidence, 0.75);
    }

    #[test]
    fn test_confidence_both_sources() {
        let unit = decide(&word("chat"), "le chat dors", "Le chat dort.");
        assert!(unit.is_accepted);
        assert_eq!(unit.confidence, 0.9);
    }

    #[test]
    fn test_low_confidence_when_unattested() {
        let unit = decide(&word("fromage"), "Bonjour", "");
        assert_eq!(unit.reject_reason, Some(RejectReason::LowConfidence));
        assert_eq!(unit.confidence, 0.55);
    }

    #[test]
    fn test_off_mission_with_custom_thresholds() {
        let mut config = PedagogyConfig::default();
        config.gate.confidence_one = 0.65;
        let gate = ValidationGate::from_config(&config);
        let evidence = gate.evidence("Bonjour", "", HINT);
        let (unit, _) = gate.evaluate(&word("bonjour"), &evidence, AcceptanceState::default());
        assert_eq!(unit.reject_reason, Some(RejectReason::OffMission));
    }

    #[test]
    fn test_pattern_floors() {
        let unit = decide(&pattern("preference_jaime_object", "j'aime + [object]"), "moi aime", "");
        assert!(unit.is_accepted);
        assert_eq!(unit.confidence, 0.82);
        assert_eq!(unit.mission_relevance, 0.7);
    }

    #[test]
    fn test_mission_relevance_overlap() {
        let gate = gate();
        let evidence = gate.evidence("", "", "Talk about your favorite sport");
        let relevance = gate.mission_relevance(&chunk("favorite sport"), &evidence);
        assert_eq!(relevance, 1.0);
        let relevance = gate.mission_relevance(&chunk("mon sport"), &evidence);
        assert_eq!(relevance, 0.5);
    }

    #[test]
    fn test_coverage_checks_follow_order() {
        let gate = gate();
        let raw = "j'aime le football";
        let evidence = gate.evidence(raw, "", HINT);
        let units = vec![
            pattern("preference_jaime_object", "j'aime + [object]"),
            chunk("j'aime le"),
            chunk("le football"),
            word("football"),
        ];
        let outcome = gate.run(&units, &evidence);
        let reasons: Vec<Option<RejectReason>> = outcome.units.iter().map(|u| u.reject_reason).collect();
        assert_eq!(
            reasons,
            vec![
                None,
                None,
                None,
                Some(RejectReason::CoveredByChunk),
            ]
        );
    }

    #[test]
    fn test_word_covered_by_pattern() {
        let gate = gate();
        let evidence = gate.evidence("j'aime le football", "", HINT);
        let units = vec![
            pattern("preference_jaime_object", "j'aime + [object]"),
            word("aime"),
        ];
        let outcome = gate.run(&units, &evidence);
        assert_eq!(outcome.units[1].reject_reason, Some(RejectReason::CoveredByPattern));
    }

    #[test]
    fn test_relevant_word_survives_chunk_coverage() {
        let gate = gate();
        let evidence = gate.evidence("mon sport favori", "", "Describe your sport");
        let units = vec![chunk("mon sport"), word("sport")];
        let outcome = gate.run(&units, &evidence);
        assert!(outcome.units[1].is_accepted);
    }

    #[test]
    fn test_quality_score() {
        let gate = gate();
        assert!((gate.quality_score(1, 1, false) - 1.0).abs() < 1e-6);
        assert!((gate.quality_score(1, 2, false) - 0.65).abs() < 1e-6);
        assert!((gate.quality_score(1, 2, true) - 0.45).abs() < 1e-6);
        assert_eq!(gate.quality_score(0, 3, true), 0.0);
        assert_eq!(gate.quality_score(0, 0, false), 0.0);
    }

    #[test]
    fn test_punctuation_only_correction_is_not_penalized() {
        let gate = gate();
        let evidence = gate.evidence("je suis étudiant", "Je suis étudiant.", HINT);
        let outcome = gate.run(&[word("étudiant")], &evidence);
        assert!((outcome.quality_score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_accent_correction_is_penalized() {
        let gate = gate();
        let evidence = gate.evidence("ca va", "Ça va", HINT);
        assert!(evidence.correction_changed);
        let outcome = gate.run(&[chunk("ça va")], &evidence);
        assert_eq!(outcome.accepted_count(), 1);
        assert_eq!(outcome.units[0].confidence, 0.9);
        assert!((outcome.quality_score - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_apostrophe_correction_is_penalized() {
        let gate = gate();
        let evidence = gate.evidence("j aime le cafe", "J'aime le café.", HINT);
        assert!(evidence.correction_changed);
        let evidence = gate.evidence("J'aime le café", "j’aime le café !", HINT);
        assert!(!evidence.correction_changed);
    }
}
