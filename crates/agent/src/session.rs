//! Session store
//!
//! One learner session behind a lock. A turn is committed inside a single
//! write section so readers see either the whole turn or none of it.

use chrono::Utc;
use parking_lot::RwLock;

use lingua_core::{
    CefrLevel, ConversationTurn, KnowledgeGraph, MissionState, SessionState, TurnDiagnostics,
    TutorResponse,
};

use crate::graph::GraphBuilder;

pub struct SessionStore {
    state: RwLock<SessionState>,
    initial_level: CefrLevel,
    initial_mission: MissionState,
    max_diagnostics: usize,
}

impl SessionStore {
    pub fn new(initial_level: CefrLevel, initial_mission: MissionState, max_diagnostics: usize) -> Self {
        Self {
            state: RwLock::new(SessionState::new(initial_level, initial_mission.clone())),
            initial_level,
            initial_mission,
            max_diagnostics,
        }
    }

    /// Clone of the whole state
    pub fn snapshot(&self) -> SessionState {
        self.state.read().clone()
    }

    /// Number the next turn will receive
    pub fn turn(&self) -> u32 {
        self.state.read().turn
    }

    pub fn level(&self) -> CefrLevel {
        self.state.read().level
    }

    pub fn mission_hint(&self) -> String {
        self.state.read().mission_state.current_hint.clone()
    }

    /// Most recent `window` diagnostics, oldest first
    pub fn diagnostics(&self, window: usize) -> Vec<TurnDiagnostics> {
        let state = self.state.read();
        let skip = state.diagnostics.len().saturating_sub(window);
        state.diagnostics[skip..].to_vec()
    }

    /// Commit one finished turn and return its number
    ///
    /// `response` must already carry the validation results.
    pub fn commit(&self, user_said: impl Into<String>, response: TutorResponse, mission_state: MissionState) -> u32 {
        let mut state = self.state.write();
        let turn_number = state.turn;

        let diagnostics = TurnDiagnostics {
            turn: turn_number,
            quality_score: response.quality_score,
            accepted: response.accepted_units().count(),
            rejected: response.rejected_units().count(),
            latency_ms: response.latency_ms,
            recorded_at: Utc::now(),
        };

        state.level = response.user_level_assessment;
        for (unit, score) in &response.mastery_scores {
            state.mastery_scores.insert(unit.clone(), *score);
        }
        state.mission_state = mission_state;
        state.conversation_history.push(ConversationTurn {
            turn_number,
            user_said: user_said.into(),
            response,
        });

        state.diagnostics.push(diagnostics);
        let overflow = state.diagnostics.len().saturating_sub(self.max_diagnostics);
        if overflow > 0 {
            state.diagnostics.drain(..overflow);
        }

        state.turn += 1;
        tracing::debug!(turn = turn_number, level = %state.level, "Turn committed");
        turn_number
    }

    /// Replace the state with a fresh session and return the next turn number
    pub fn reset(&self) -> u32 {
        let mut state = self.state.write();
        *state = SessionState::new(self.initial_level, self.initial_mission.clone());
        tracing::info!("Session reset");
        state.turn
    }

    /// Knowledge graph derived from the committed history
    pub fn graph(&self, builder: &GraphBuilder) -> KnowledgeGraph {
        let state = self.state.read();
        builder.build(
            &state.conversation_history,
            &state.mastery_scores,
            state.last_completed_turn(),
        )
    }
}
