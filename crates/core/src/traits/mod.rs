//! Collaborator traits
//!
//! The pedagogical core consumes speech transcription, the tutor model and
//! speech synthesis only through these seams, so implementations can be
//! swapped (or mocked in tests) without touching the pipeline.
//!
//! ```text
//! Speech Processing:
//!   - SpeechToText: Audio → Text transcription
//!   - TextToSpeech: Text → Audio synthesis
//!
//! Tutoring:
//!   - TutorModel: Learner text → loosely-typed tutor JSON
//! ```

mod speech;
mod tutor;

pub use speech::{SpeechToText, SynthesizedSpeech, TextToSpeech};
pub use tutor::{TutorModel, TutorRequest};
