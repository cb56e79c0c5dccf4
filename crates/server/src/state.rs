//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use lingua_agent::TutorAgent;
use lingua_config::Settings;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    /// The single learner session and its collaborators
    pub agent: Arc<TutorAgent>,
}

impl AppState {
    /// State with the rule-based tutor and no speech collaborators
    pub fn new(config: Settings) -> Self {
        let agent = TutorAgent::new(&config.pedagogy, &config.tutor);
        Self::with_agent(config, agent)
    }

    pub fn with_agent(config: Settings, agent: TutorAgent) -> Self {
        Self {
            config: Arc::new(config),
            agent: Arc::new(agent),
        }
    }
}
