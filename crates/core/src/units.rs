//! Linguistic units extracted from a learner utterance
//!
//! A [`CanonicalUnit`] is what the canonicalizer produces for a turn; a
//! [`ValidatedUnit`] is the same unit after the validation gate has decided
//! whether it enters the knowledge graph.

use serde::{Deserialize, Serialize};

/// Kind of a linguistic unit
///
/// Precedence when two candidates collapse onto the same canonical key:
/// pattern > sentence > chunk > word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Single token ("bonjour")
    Word,
    /// Short multi-token phrase ("ça va")
    Chunk,
    /// Three or more tokens ("j'habite à paris")
    Sentence,
    /// Grammar construction with an open slot ("j'aime + [object]")
    Pattern,
}

impl UnitKind {
    /// Precedence rank used to resolve duplicates
    pub fn precedence(&self) -> u8 {
        match self {
            UnitKind::Pattern => 4,
            UnitKind::Sentence => 3,
            UnitKind::Chunk => 2,
            UnitKind::Word => 1,
        }
    }

    /// Patterns and sentences carry structure on their own and get
    /// confidence/relevance floors in the gate.
    pub fn is_structural(&self) -> bool {
        matches!(self, UnitKind::Pattern | UnitKind::Sentence)
    }

    /// Chunks and words are lexical and subject to coverage checks.
    pub fn is_lexical(&self) -> bool {
        matches!(self, UnitKind::Chunk | UnitKind::Word)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Word => "word",
            UnitKind::Chunk => "chunk",
            UnitKind::Sentence => "sentence",
            UnitKind::Pattern => "pattern",
        }
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the unit's text was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSource {
    /// Verbatim in what the learner said
    AsSaid,
    /// Only in the grammar-corrected rewrite
    Corrected,
}

/// A deduplicated, typed linguistic item for one turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalUnit {
    /// Normalized display text
    pub text: String,
    pub kind: UnitKind,
    pub source: UnitSource,
    /// Grouping key, `"{kind}:{text}"` or `"pattern:{rule_id}"`
    pub canonical_key: String,
}

impl CanonicalUnit {
    pub fn new(
        text: impl Into<String>,
        kind: UnitKind,
        source: UnitSource,
        canonical_key: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            kind,
            source,
            canonical_key: canonical_key.into(),
        }
    }

    /// Word, chunk or sentence unit keyed by its normalized text
    pub fn lexical(normalized_text: impl Into<String>, kind: UnitKind, source: UnitSource) -> Self {
        let text = normalized_text.into();
        let canonical_key = Self::key_for(kind, &text);
        Self::new(text, kind, source, canonical_key)
    }

    /// Key for a non-pattern unit whose text is already normalized
    pub fn key_for(kind: UnitKind, normalized_text: &str) -> String {
        format!("{}:{}", kind.as_str(), normalized_text)
    }

    /// Key for a pattern rule
    pub fn pattern_key(rule_id: &str) -> String {
        format!("pattern:{}", rule_id)
    }
}

/// Why the gate rejected a unit
///
/// These are classifications, not errors: rejected units are still stored
/// on the turn so the learner can see why something did not count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    IncompletePattern,
    TooBroad,
    TooShort,
    StopWord,
    GrammarInvalid,
    LowConfidence,
    OffMission,
    CoveredByPattern,
    CoveredByChunk,
}

impl RejectReason {
    pub const ALL: [RejectReason; 9] = [
        RejectReason::IncompletePattern,
        RejectReason::TooBroad,
        RejectReason::TooShort,
        RejectReason::StopWord,
        RejectReason::GrammarInvalid,
        RejectReason::LowConfidence,
        RejectReason::OffMission,
        RejectReason::CoveredByPattern,
        RejectReason::CoveredByChunk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::IncompletePattern => "incomplete_pattern",
            RejectReason::TooBroad => "too_broad",
            RejectReason::TooShort => "too_short",
            RejectReason::StopWord => "stop_word",
            RejectReason::GrammarInvalid => "grammar_invalid",
            RejectReason::LowConfidence => "low_confidence",
            RejectReason::OffMission => "off_mission",
            RejectReason::CoveredByPattern => "covered_by_pattern",
            RejectReason::CoveredByChunk => "covered_by_chunk",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A canonical unit with the gate's decision attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedUnit {
    pub text: String,
    pub kind: UnitKind,
    pub source: UnitSource,
    /// Validation confidence (0.0 - 1.0)
    pub confidence: f32,
    pub is_accepted: bool,
    #[serde(default)]
    pub reject_reason: Option<RejectReason>,
    #[serde(default)]
    pub canonical_key: String,
    /// Relevance to the current speaking mission (0.0 - 1.0)
    #[serde(default)]
    pub mission_relevance: f32,
}

impl ValidatedUnit {
    pub fn accepted(unit: &CanonicalUnit, confidence: f32, mission_relevance: f32) -> Self {
        Self {
            text: unit.text.clone(),
            kind: unit.kind,
            source: unit.source,
            confidence: confidence.clamp(0.0, 1.0),
            is_accepted: true,
            reject_reason: None,
            canonical_key: unit.canonical_key.clone(),
            mission_relevance: mission_relevance.clamp(0.0, 1.0),
        }
    }

    pub fn rejected(
        unit: &CanonicalUnit,
        reason: RejectReason,
        confidence: f32,
        mission_relevance: f32,
    ) -> Self {
        Self {
            text: unit.text.clone(),
            kind: unit.kind,
            source: unit.source,
            confidence: confidence.clamp(0.0, 1.0),
            is_accepted: false,
            reject_reason: Some(reason),
            canonical_key: unit.canonical_key.clone(),
            mission_relevance: mission_relevance.clamp(0.0, 1.0),
        }
    }
}
