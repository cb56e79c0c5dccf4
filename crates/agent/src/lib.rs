//! Pedagogical agent
//!
//! Features:
//! - Validation gate over canonical units
//! - Speaking-mission tracking
//! - Knowledge graph derived from the turn history
//! - Tutor response sanitization and a rule-based tutor
//! - Session store and turn orchestration around STT/TTS collaborators

pub mod agent;
pub mod fallback;
pub mod gate;
pub mod graph;
pub mod mission;
pub mod pipeline;
pub mod sanitize;
pub mod session;

pub use agent::{AgentEvent, TurnResult, TurnStep, TutorAgent};
pub use fallback::RuleBasedTutor;
pub use gate::{AcceptanceState, GateOutcome, TurnEvidence, ValidationGate};
pub use graph::{node_id, relationship_for, GraphBuilder};
pub use mission::MissionTracker;
pub use pipeline::{validate_turn, TurnValidator};
pub use sanitize::{
    coerce_score, parse_tutor_payload, sanitize_tutor_response, strip_code_fences,
    FALLBACK_SPOKEN_RESPONSE,
};
pub use session::SessionStore;

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Could not understand the utterance, try again or type instead")]
    EmptyUtterance,

    #[error("Speech-to-text is not configured")]
    SttUnavailable,

    #[error("Transcription error: {0}")]
    Transcription(String),
}
