//! Conversation types: the tutor's per-turn response and the stored turn

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::level::CefrLevel;
use crate::mission::MissionProgress;
use crate::units::ValidatedUnit;

/// A single vocabulary entry in a tutor response breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyItem {
    pub word: String,
    #[serde(default)]
    pub translation: String,
    #[serde(default)]
    pub part_of_speech: String,
}

impl VocabularyItem {
    pub fn bare(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            translation: String::new(),
            part_of_speech: String::new(),
        }
    }
}

/// An explicit relationship declared by the tutor model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseGraphLink {
    pub source: String,
    pub target: String,
    /// Free-form type from the model ("semantic", "conjugation", "correction", ...)
    #[serde(rename = "type", default)]
    pub link_type: String,
}

/// Correction severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Minor,
    Major,
}

/// A concise correction item for learner feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionItem {
    pub as_said: String,
    pub corrected: String,
    pub rule: String,
    #[serde(default)]
    pub severity: Severity,
}

/// Latency breakdown for one turn, in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyBreakdown {
    #[serde(default)]
    pub stt: u64,
    #[serde(default)]
    pub llm: u64,
    #[serde(default)]
    pub tts: u64,
    #[serde(default)]
    pub total: u64,
}

/// Full pedagogical response for a single turn
///
/// The model fills the conversational fields; validation fields
/// (`validated_user_units`, `quality_score`, mission fields) are computed
/// server-side before the turn is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorResponse {
    pub spoken_response: String,
    #[serde(default)]
    pub translation_hint: String,
    /// Corrected version of the learner's sentence (empty if no errors)
    #[serde(default)]
    pub corrected_form: String,
    #[serde(default)]
    pub vocabulary_breakdown: Vec<VocabularyItem>,
    /// New elements introduced this turn (i+1)
    #[serde(default)]
    pub new_elements: Vec<String>,
    /// Previously learned elements reactivated for retrieval practice
    #[serde(default)]
    pub reactivated_elements: Vec<String>,
    #[serde(default)]
    pub user_level_assessment: CefrLevel,
    #[serde(default)]
    pub border_update: String,
    /// Model-reported mastery (0.0 - 1.0), informational only
    #[serde(default)]
    pub mastery_scores: HashMap<String, f32>,
    #[serde(default)]
    pub graph_links: Vec<ResponseGraphLink>,
    /// Vocabulary the model extracted from the learner's input, kept as raw
    /// JSON so malformed entries can be coerced or skipped downstream
    #[serde(default)]
    pub user_vocabulary: Vec<serde_json::Value>,
    #[serde(default)]
    pub validated_user_units: Vec<ValidatedUnit>,
    #[serde(default)]
    pub corrections: Vec<CorrectionItem>,
    #[serde(default)]
    pub quality_score: f32,
    #[serde(default)]
    pub latency_ms: LatencyBreakdown,
    #[serde(default)]
    pub next_mission_hint: String,
    #[serde(default)]
    pub mission_progress: MissionProgress,
}

impl TutorResponse {
    /// Response with only the spoken line set
    pub fn spoken(text: impl Into<String>) -> Self {
        Self {
            spoken_response: text.into(),
            translation_hint: String::new(),
            corrected_form: String::new(),
            vocabulary_breakdown: Vec::new(),
            new_elements: Vec::new(),
            reactivated_elements: Vec::new(),
            user_level_assessment: CefrLevel::default(),
            border_update: String::new(),
            mastery_scores: HashMap::new(),
            graph_links: Vec::new(),
            user_vocabulary: Vec::new(),
            validated_user_units: Vec::new(),
            corrections: Vec::new(),
            quality_score: 0.0,
            latency_ms: LatencyBreakdown::default(),
            next_mission_hint: String::new(),
            mission_progress: MissionProgress::default(),
        }
    }

    pub fn accepted_units(&self) -> impl Iterator<Item = &ValidatedUnit> {
        self.validated_user_units.iter().filter(|u| u.is_accepted)
    }

    pub fn rejected_units(&self) -> impl Iterator<Item = &ValidatedUnit> {
        self.validated_user_units.iter().filter(|u| !u.is_accepted)
    }
}

/// One completed exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// 1-indexed turn number
    pub turn_number: u32,
    /// What the learner said (STT output or typed text)
    pub user_said: String,
    pub response: TutorResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{CanonicalUnit, RejectReason, UnitKind, UnitSource};

    #[test]
    fn test_response_defaults_from_minimal_json() {
        let json = r#"{"spoken_response": "Bonjour !"}"#;
        let response: TutorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.spoken_response, "Bonjour !");
        assert_eq!(response.user_level_assessment, CefrLevel::A1);
        assert!(response.validated_user_units.is_empty());
        assert_eq!(response.mission_progress.total, 3);
    }

    #[test]
    fn test_graph_link_type_field() {
        let json = r#"{"source": "bonjour", "target": "ça va", "type": "semantic"}"#;
        let link: ResponseGraphLink = serde_json::from_str(json).unwrap();
        assert_eq!(link.link_type, "semantic");
    }

    #[test]
    fn test_accepted_and_rejected_split() {
        let unit = CanonicalUnit::new("va", UnitKind::Word, UnitSource::AsSaid, "word:va");
        let mut response = TutorResponse::spoken("Oui");
        response.validated_user_units = vec![
            ValidatedUnit::accepted(&unit, 0.9, 0.0),
            ValidatedUnit::rejected(&unit, RejectReason::CoveredByChunk, 0.75, 0.0),
        ];
        assert_eq!(response.accepted_units().count(), 1);
        assert_eq!(response.rejected_units().count(), 1);
    }
}
