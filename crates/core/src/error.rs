//! Error types for collaborator calls

use thiserror::Error;

/// Errors raised by the collaborators around the pedagogical core
///
/// The core itself is total; these only travel across the STT, tutor-model
/// and TTS seams and the session surface.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Speech-to-text error: {0}")]
    Stt(String),

    #[error("Tutor model error: {0}")]
    TutorModel(String),

    #[error("Text-to-speech error: {0}")]
    Tts(String),

    #[error("Collaborator not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
