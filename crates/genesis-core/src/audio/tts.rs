//! Text-to-speech through the generation API's audio output mode

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::providers::{GenerateRequest, LlmProvider, ResponseFormat};

/// Text-to-speech trait
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
    fn name(&self) -> &str;
}

/// Gemini speech synthesis with a prebuilt voice
pub struct GeminiTts {
    provider: Arc<dyn LlmProvider>,
    voice: String,
}

impl GeminiTts {
    pub fn new(provider: Arc<dyn LlmProvider>, voice: String) -> Self {
        Self { provider, voice }
    }
}

#[async_trait]
impl TextToSpeech for GeminiTts {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            bail!("Nothing to synthesize: empty script");
        }

        debug!(
            "Gemini TTS: synthesizing {} chars with voice '{}'",
            text.chars().count(),
            self.voice
        );

        let request = GenerateRequest::new(text).with_format(ResponseFormat::Audio {
            voice: self.voice.clone(),
        });
        let response = self.provider.generate(&request).await?;

        let audio = response
            .audio
            .ok_or_else(|| anyhow!("Gemini TTS response carried no inline audio"))?;
        if audio.data.is_empty() {
            bail!("Gemini TTS returned an empty audio payload");
        }

        info!(
            "Gemini TTS: synthesized {} bytes of audio ({})",
            audio.data.len(),
            audio.mime_type
        );
        Ok(audio.data)
    }

    fn name(&self) -> &str {
        "gemini_tts"
    }
}
