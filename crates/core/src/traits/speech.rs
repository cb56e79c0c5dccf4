//! Speech processing traits

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Speech-to-Text interface
///
/// # Example
///
/// ```ignore
/// let stt: Arc<dyn SpeechToText> = Arc::new(MyStt::new(config));
/// let text = stt.transcribe(&webm_bytes).await?;
/// ```
#[async_trait]
pub trait SpeechToText: Send + Sync + 'static {
    /// Transcribe one recorded utterance
    ///
    /// Returns an empty string when nothing intelligible was heard.
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}

/// Synthesized audio for a spoken response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizedSpeech {
    /// Encoded audio bytes
    #[serde(skip)]
    pub audio: Vec<u8>,
    /// MIME type of `audio` ("audio/mpeg", "audio/wav", ...)
    pub mime_type: String,
    /// Voice used for synthesis
    pub voice: String,
}

/// Text-to-Speech interface
#[async_trait]
pub trait TextToSpeech: Send + Sync + 'static {
    /// Synthesize text to audio
    async fn synthesize(&self, text: &str) -> Result<SynthesizedSpeech>;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}
