//! Core traits and types for the language tutor
//!
//! This crate provides foundational types used across all other crates:
//! - Linguistic units and gate decisions
//! - Conversation turns and the tutor response contract
//! - Knowledge graph nodes and links
//! - Session state and mission checklist
//! - Collaborator traits (STT, tutor model, TTS)
//! - Error types

pub mod conversation;
pub mod error;
pub mod graph;
pub mod level;
pub mod mission;
pub mod session;
pub mod traits;
pub mod units;

pub use conversation::{
    ConversationTurn, CorrectionItem, LatencyBreakdown, ResponseGraphLink, Severity,
    TutorResponse, VocabularyItem,
};
pub use error::{Error, Result};
pub use graph::{GraphLink, GraphNode, KnowledgeGraph, NodeType, Relationship};
pub use level::CefrLevel;
pub use mission::{MissionProgress, MissionState, MissionTask, MissionTaskId, MISSION_TASK_COUNT};
pub use session::{SessionState, TurnDiagnostics, TurnInput, TurnOutcome};
pub use units::{CanonicalUnit, RejectReason, UnitKind, UnitSource, ValidatedUnit};

// Trait re-exports
pub use traits::{SpeechToText, SynthesizedSpeech, TextToSpeech, TutorModel, TutorRequest};
