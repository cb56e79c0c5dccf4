//! Speaking-mission tracker
//!
//! Pure function of (quality, accepted units, turn number, level).

use lingua_config::{MissionSettings, PedagogyConfig};
use lingua_core::{CefrLevel, MissionState, MissionTask, MissionTaskId};

#[derive(Debug, Clone)]
pub struct MissionTracker {
    settings: MissionSettings,
}

impl MissionTracker {
    pub fn new(settings: MissionSettings) -> Self {
        Self { settings }
    }

    pub fn from_config(config: &PedagogyConfig) -> Self {
        Self::new(config.mission.clone())
    }

    /// Hint for the turn after `turn_number`, prefixed by level band
    pub fn hint_for(&self, turn_number: u32, level: CefrLevel) -> String {
        let hints = &self.settings.hints;
        let index = (turn_number as usize).min(hints.len().saturating_sub(1));
        let hint = hints.get(index).map(String::as_str).unwrap_or_default();
        let prefix = if level.tier() >= self.settings.advanced_min_tier {
            &self.settings.advanced_prefix
        } else {
            &self.settings.beginner_prefix
        };
        format!("{}{}", prefix, hint)
    }

    /// Mission shown before the first turn
    pub fn initial_state(&self, level: CefrLevel) -> MissionState {
        MissionState::from_tasks(self.hint_for(0, level), self.tasks(false, false, false))
    }

    /// Checklist after a turn
    pub fn evaluate(
        &self,
        quality_score: f32,
        accepted_count: usize,
        turn_number: u32,
        level: CefrLevel,
    ) -> MissionState {
        let s = &self.settings;
        let tasks = self.tasks(
            quality_score >= s.quality_target,
            accepted_count >= s.units_target,
            turn_number >= s.turns_target,
        );
        let state = MissionState::from_tasks(self.hint_for(turn_number, level), tasks);

        tracing::debug!(
            turn = turn_number,
            done = state.progress.done,
            percent = state.progress.percent,
            "Mission progress updated"
        );
        state
    }

    fn tasks(&self, quality: bool, units: bool, turns: bool) -> Vec<MissionTask> {
        let s = &self.settings;
        vec![
            MissionTask {
                id: MissionTaskId::Quality,
                label: format!("Reach at least {}% quality", (s.quality_target * 100.0).round()),
                done: quality,
            },
            MissionTask {
                id: MissionTaskId::Units,
                label: format!("Validate at least {} useful units", s.units_target),
                done: units,
            },
            MissionTask {
                id: MissionTaskId::Turns,
                label: format!("Complete {} turns in this session", s.turns_target),
                done: turns,
            },
        ]
    }
}
