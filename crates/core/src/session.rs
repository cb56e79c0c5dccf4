//! Session state and per-turn pipeline contracts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::conversation::{ConversationTurn, LatencyBreakdown};
use crate::level::CefrLevel;
use crate::mission::{MissionProgress, MissionState};
use crate::units::ValidatedUnit;

/// Input to the validation pipeline for one turn
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnInput {
    pub raw_utterance: String,
    /// Candidate list as the model returned it; entries may be any JSON value
    #[serde(default)]
    pub ai_proposed_vocabulary: Vec<serde_json::Value>,
    /// Grammar-corrected form, empty when no correction was needed
    #[serde(default)]
    pub corrected_form: String,
    #[serde(default)]
    pub mission_hint: String,
    pub current_turn_number: u32,
    #[serde(default)]
    pub current_level: CefrLevel,
}

/// Output of the validation pipeline for one turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub accepted_units: Vec<ValidatedUnit>,
    pub rejected_units: Vec<ValidatedUnit>,
    pub quality_score: f32,
    pub next_mission_hint: String,
    pub mission_progress: MissionProgress,
    /// Full mission snapshot the progress was derived from
    pub mission_state: MissionState,
}

impl TurnOutcome {
    /// Accepted followed by rejected units, as stored on the turn
    pub fn all_units(&self) -> Vec<ValidatedUnit> {
        self.accepted_units
            .iter()
            .chain(self.rejected_units.iter())
            .cloned()
            .collect()
    }
}

/// Timing and quality record for one committed turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnDiagnostics {
    pub turn: u32,
    pub quality_score: f32,
    pub accepted: usize,
    pub rejected: usize,
    pub latency_ms: LatencyBreakdown,
    pub recorded_at: DateTime<Utc>,
}

/// Whole-session state
///
/// The conversation history is append-only; `turn` is the number the next
/// turn will receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub turn: u32,
    pub level: CefrLevel,
    /// Cumulative model-reported mastery, separate from graph mastery
    pub mastery_scores: HashMap<String, f32>,
    pub conversation_history: Vec<ConversationTurn>,
    pub mission_state: MissionState,
    #[serde(default)]
    pub diagnostics: Vec<TurnDiagnostics>,
}

impl SessionState {
    pub fn new(level: CefrLevel, mission_state: MissionState) -> Self {
        Self {
            turn: 1,
            level,
            mastery_scores: HashMap::new(),
            conversation_history: Vec::new(),
            mission_state,
            diagnostics: Vec::new(),
        }
    }

    /// Number of the last completed turn (0 before the first turn)
    pub fn last_completed_turn(&self) -> u32 {
        self.conversation_history
            .last()
            .map(|t| t.turn_number)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session() {
        let state = SessionState::new(CefrLevel::A1, MissionState::initial("Mission A1-A2: Say hello."));
        assert_eq!(state.turn, 1);
        assert_eq!(state.last_completed_turn(), 0);
        assert_eq!(state.mission_state.progress.total, 3);
    }

    #[test]
    fn test_turn_input_accepts_mixed_vocabulary() {
        let json = r#"{
            "raw_utterance": "Bonjour",
            "ai_proposed_vocabulary": ["bonjour", 42, null, {"word": "salut"}],
            "current_turn_number": 1
        }"#;
        let input: TurnInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.ai_proposed_vocabulary.len(), 4);
        assert!(input.corrected_form.is_empty());
    }
}
