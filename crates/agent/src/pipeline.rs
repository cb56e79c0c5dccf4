//! Per-turn validation pipeline
//!
//! Canonicalizer, validation gate and mission tracker chained into one pure
//! call: [`TurnInput`] in, [`TurnOutcome`] out.

use lingua_config::PedagogyConfig;
use lingua_core::{TurnInput, TurnOutcome};
use lingua_text_processing::Canonicalizer;

use crate::gate::ValidationGate;
use crate::mission::MissionTracker;

#[derive(Debug, Clone)]
pub struct TurnValidator {
    canonicalizer: Canonicalizer,
    gate: ValidationGate,
    mission: MissionTracker,
}

impl TurnValidator {
    pub fn new(canonicalizer: Canonicalizer, gate: ValidationGate, mission: MissionTracker) -> Self {
        Self {
            canonicalizer,
            gate,
            mission,
        }
    }

    pub fn from_config(config: &PedagogyConfig) -> Self {
        Self::new(
            Canonicalizer::from_config(config),
            ValidationGate::from_config(config),
            MissionTracker::from_config(config),
        )
    }

    pub fn mission(&self) -> &MissionTracker {
        &self.mission
    }

    /// Validate one turn
    ///
    /// Never fails: empty or malformed input degrades to fewer units.
    pub fn validate(&self, input: &TurnInput) -> TurnOutcome {
        let units = self.canonicalizer.canonicalize(
            &input.ai_proposed_vocabulary,
            &input.corrected_form,
            &input.raw_utterance,
        );

        let evidence = self
            .gate
            .evidence(&input.raw_utterance, &input.corrected_form, &input.mission_hint);
        let gated = self.gate.run(&units, &evidence);

        let mission_state = self.mission.evaluate(
            gated.quality_score,
            gated.accepted_count(),
            input.current_turn_number,
            input.current_level,
        );

        tracing::info!(
            turn = input.current_turn_number,
            units = units.len(),
            accepted = gated.accepted_count(),
            quality = gated.quality_score,
            "Turn validated"
        );

        TurnOutcome {
            accepted_units: gated.accepted(),
            rejected_units: gated.rejected(),
            quality_score: gated.quality_score,
            next_mission_hint: mission_state.current_hint.clone(),
            mission_progress: mission_state.progress,
            mission_state,
        }
    }
}

/// Validate a turn with a one-off validator
pub fn validate_turn(input: &TurnInput, config: &PedagogyConfig) -> TurnOutcome {
    TurnValidator::from_config(config).validate(input)
}
