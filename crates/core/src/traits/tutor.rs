//! Tutor model trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::level::CefrLevel;
use crate::Result;

/// What the tutor model receives for one turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorRequest {
    /// Learner text (STT output or typed)
    pub user_text: String,
    /// Current mission hint, used to steer topics
    pub mission_hint: String,
    pub turn_number: u32,
    pub level: CefrLevel,
}

impl TutorRequest {
    /// Learner text prefixed with the mission context, as sent to chat models
    pub fn enriched_text(&self) -> String {
        if self.mission_hint.is_empty() {
            self.user_text.clone()
        } else {
            format!("{}\nUser said: {}", self.mission_hint, self.user_text)
        }
    }
}

/// Tutor model interface
///
/// Implementations return the model's JSON payload as-is; coercion into a
/// typed response happens downstream, so a model that drifts from the
/// schema degrades instead of failing the turn.
#[async_trait]
pub trait TutorModel: Send + Sync + 'static {
    async fn generate(&self, request: &TutorRequest) -> Result<serde_json::Value>;

    /// Start a fresh conversation context
    async fn reset(&self) {}

    /// Get model name for logging
    fn model_name(&self) -> &str;
}
