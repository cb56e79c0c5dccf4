//! Turn execution for TutorAgent

use std::time::Instant;

use lingua_core::{LatencyBreakdown, TurnInput, TutorRequest};
use serde_json::Value;

use super::{AgentEvent, TurnResult, TurnStep, TutorAgent};
use crate::sanitize::sanitize_tutor_response;
use crate::AgentError;

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

impl TutorAgent {
    /// Transcribe recorded audio and run it as a turn
    pub async fn process_audio(&self, audio: &[u8]) -> Result<TurnResult, AgentError> {
        let stt = self.stt.as_ref().ok_or(AgentError::SttUnavailable)?;
        let started = Instant::now();

        self.emit(AgentEvent::Status(TurnStep::Transcribing));
        let text = stt.transcribe(audio).await.map_err(|e| {
            tracing::warn!(error = %e, stt = stt.model_name(), "Transcription failed");
            AgentError::Transcription(e.to_string())
        })?;
        let stt_ms = elapsed_ms(started);

        tracing::debug!(chars = text.len(), stt_ms, "Audio transcribed");
        self.run_turn(&text, stt_ms, started).await
    }

    /// Run a typed turn
    pub async fn process_text(&self, text: &str) -> Result<TurnResult, AgentError> {
        self.run_turn(text, 0, Instant::now()).await
    }

    async fn run_turn(&self, text: &str, stt_ms: u64, started: Instant) -> Result<TurnResult, AgentError> {
        let user_text = text.trim();
        if user_text.is_empty() {
            return Err(AgentError::EmptyUtterance);
        }

        let _guard = self.turn_lock.lock().await;
        let turn_number = self.session.turn();
        let request = TutorRequest {
            user_text: user_text.to_string(),
            mission_hint: self.session.mission_hint(),
            turn_number,
            level: self.session.level(),
        };

        self.emit(AgentEvent::Status(TurnStep::Thinking));
        let llm_started = Instant::now();
        let payload = self.generate(&request).await;
        let llm_ms = elapsed_ms(llm_started);

        let mut response = sanitize_tutor_response(&payload);
        let outcome = self.validator.validate(&TurnInput {
            raw_utterance: user_text.to_string(),
            ai_proposed_vocabulary: response.user_vocabulary.clone(),
            corrected_form: response.corrected_form.clone(),
            mission_hint: request.mission_hint.clone(),
            current_turn_number: turn_number,
            current_level: response.user_level_assessment,
        });

        response.validated_user_units = outcome.all_units();
        response.quality_score = outcome.quality_score;
        response.next_mission_hint = outcome.next_mission_hint.clone();
        response.mission_progress = outcome.mission_progress;

        let tts_started = Instant::now();
        let speech = match &self.tts {
            Some(tts) => {
                self.emit(AgentEvent::Status(TurnStep::Speaking));
                match tts.synthesize(&response.spoken_response).await {
                    Ok(speech) => Some(speech),
                    Err(e) => {
                        // The turn still counts without audio
                        tracing::warn!(error = %e, tts = tts.model_name(), "Speech synthesis failed");
                        None
                    }
                }
            }
            None => None,
        };
        let tts_ms = if self.tts.is_some() { elapsed_ms(tts_started) } else { 0 };

        response.latency_ms = LatencyBreakdown {
            stt: stt_ms,
            llm: llm_ms,
            tts: tts_ms,
            total: elapsed_ms(started),
        };

        let accepted = outcome.accepted_units.len();
        let rejected = outcome.rejected_units.len();
        let committed = self
            .session
            .commit(user_text, response.clone(), outcome.mission_state);

        tracing::info!(
            turn = committed,
            accepted,
            rejected,
            quality = response.quality_score,
            total_ms = response.latency_ms.total,
            "Turn completed"
        );
        self.emit(AgentEvent::TurnCommitted {
            turn: committed,
            quality_score: response.quality_score,
            accepted,
            rejected,
        });

        Ok(TurnResult {
            turn_number: committed,
            user_said: user_text.to_string(),
            level: response.user_level_assessment,
            response,
            speech,
            next_turn: committed + 1,
        })
    }

    /// Model payload, or the rule-based answer when the model fails
    async fn generate(&self, request: &TutorRequest) -> Value {
        match self.tutor.generate(request).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    model = self.tutor.model_name(),
                    "Tutor model failed, using rule-based tutor"
                );
                self.emit(AgentEvent::Fallback {
                    reason: e.to_string(),
                });
                self.fallback.respond(request)
            }
        }
    }
}
