//! Speaking-mission checklist types

use serde::{Deserialize, Serialize};

/// Number of checklist tasks tracked per session
pub const MISSION_TASK_COUNT: u32 = 3;

/// Mission progress counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionProgress {
    pub done: u32,
    pub total: u32,
    pub percent: u32,
}

impl MissionProgress {
    pub fn from_done(done: u32, total: u32) -> Self {
        let percent = if total == 0 {
            0
        } else {
            ((done as f64 / total as f64) * 100.0).round() as u32
        };
        Self {
            done,
            total,
            percent,
        }
    }
}

impl Default for MissionProgress {
    fn default() -> Self {
        Self::from_done(0, MISSION_TASK_COUNT)
    }
}

/// Stable identifiers of the checklist tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionTaskId {
    /// Turn quality reached the target
    Quality,
    /// Enough units were validated
    Units,
    /// Enough turns were completed
    Turns,
}

/// One checklist entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionTask {
    pub id: MissionTaskId,
    pub label: String,
    pub done: bool,
}

/// Snapshot of the current mission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionState {
    pub current_hint: String,
    pub tasks: Vec<MissionTask>,
    #[serde(flatten)]
    pub progress: MissionProgress,
}

impl MissionState {
    /// Snapshot with progress derived from the task flags
    pub fn from_tasks(hint: impl Into<String>, tasks: Vec<MissionTask>) -> Self {
        let done = tasks.iter().filter(|t| t.done).count() as u32;
        Self {
            current_hint: hint.into(),
            progress: MissionProgress::from_done(done, tasks.len() as u32),
            tasks,
        }
    }

    /// Fresh mission with the default checklist, every task open
    pub fn initial(hint: impl Into<String>) -> Self {
        let task = |id, label: &str| MissionTask {
            id,
            label: label.to_string(),
            done: false,
        };
        Self::from_tasks(
            hint,
            vec![
                task(MissionTaskId::Quality, "Reach at least 70% quality"),
                task(MissionTaskId::Units, "Validate at least 2 useful units"),
                task(MissionTaskId::Turns, "Complete 2 turns in this session"),
            ],
        )
    }
}
