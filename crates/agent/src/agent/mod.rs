//! Tutor Agent
//!
//! Runs one learner turn end to end: optional transcription, tutor model,
//! sanitization, validation, optional speech synthesis, commit.
//!
//! The agent owns the session; collaborators are injected as trait objects
//! so any of them can be swapped or left out.
//!
//! - `processing`: turn execution and timing

mod processing;

use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

use lingua_config::{PedagogyConfig, TutorSettings};
use lingua_core::{
    CefrLevel, KnowledgeGraph, SpeechToText, SynthesizedSpeech, TextToSpeech, TutorModel,
    TutorResponse,
};
use serde::Serialize;

use crate::fallback::RuleBasedTutor;
use crate::graph::GraphBuilder;
use crate::pipeline::TurnValidator;
use crate::session::SessionStore;

/// Progress step of a running turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStep {
    Transcribing,
    Thinking,
    Speaking,
}

/// Events emitted while turns run
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// A turn moved to a new step
    Status(TurnStep),
    /// The tutor model failed and the rule-based tutor answered instead
    Fallback { reason: String },
    /// A turn was committed to the session
    TurnCommitted {
        turn: u32,
        quality_score: f32,
        accepted: usize,
        rejected: usize,
    },
    /// The session was reset
    Reset,
    Error(String),
}

/// Everything a caller needs to render a finished turn
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub turn_number: u32,
    pub user_said: String,
    pub response: TutorResponse,
    pub speech: Option<SynthesizedSpeech>,
    /// Number the next turn will receive
    pub next_turn: u32,
    pub level: CefrLevel,
}

pub struct TutorAgent {
    pub(crate) validator: TurnValidator,
    pub(crate) graph_builder: GraphBuilder,
    pub(crate) session: SessionStore,
    pub(crate) tutor: Arc<dyn TutorModel>,
    pub(crate) fallback: RuleBasedTutor,
    pub(crate) stt: Option<Arc<dyn SpeechToText>>,
    pub(crate) tts: Option<Arc<dyn TextToSpeech>>,
    pub(crate) event_tx: broadcast::Sender<AgentEvent>,
    /// Turns run one at a time
    pub(crate) turn_lock: Mutex<()>,
}

impl TutorAgent {
    /// Agent answering with the rule-based tutor and no speech collaborators
    pub fn new(pedagogy: &PedagogyConfig, tutor: &TutorSettings) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        let validator = TurnValidator::from_config(pedagogy);
        let initial_mission = validator.mission().initial_state(tutor.initial_level);
        let fallback = RuleBasedTutor::from_config(pedagogy);

        Self {
            graph_builder: GraphBuilder::from_config(pedagogy),
            session: SessionStore::new(tutor.initial_level, initial_mission, tutor.max_diagnostics),
            tutor: Arc::new(fallback.clone()),
            fallback,
            validator,
            stt: None,
            tts: None,
            event_tx,
            turn_lock: Mutex::new(()),
        }
    }

    pub fn with_tutor(mut self, tutor: Arc<dyn TutorModel>) -> Self {
        self.tutor = tutor;
        self
    }

    pub fn with_stt(mut self, stt: Arc<dyn SpeechToText>) -> Self {
        self.stt = Some(stt);
        self
    }

    pub fn with_tts(mut self, tts: Arc<dyn TextToSpeech>) -> Self {
        self.tts = Some(tts);
        self
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn tutor_name(&self) -> &str {
        self.tutor.model_name()
    }

    pub fn has_stt(&self) -> bool {
        self.stt.is_some()
    }

    /// Knowledge graph over the committed history
    pub fn graph(&self) -> KnowledgeGraph {
        self.session.graph(&self.graph_builder)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.event_tx.subscribe()
    }

    /// Start over: fresh session and fresh tutor context
    pub async fn reset(&self) -> u32 {
        let _guard = self.turn_lock.lock().await;
        self.tutor.reset().await;
        let turn = self.session.reset();
        self.emit(AgentEvent::Reset);
        turn
    }

    pub(crate) fn emit(&self, event: AgentEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }
}
