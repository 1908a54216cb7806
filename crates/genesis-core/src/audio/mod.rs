//! Speech output for the news agent
//!
//! Gemini speech replies carry raw 16-bit little-endian mono PCM. The web
//! client plays that PCM directly from base64; the CLI wraps it in a WAV
//! container so it can be opened by any player.

pub mod tts;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

pub use tts::{GeminiTts, TextToSpeech};

/// Speech configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Prebuilt voice name
    pub voice: String,
    /// Sample rate of the PCM stream returned by the speech model
    pub sample_rate: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            voice: "Kore".to_string(),
            sample_rate: 24000,
        }
    }
}

/// Base64 for JSON transport
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Wrap 16-bit mono PCM bytes in a WAV container
pub fn encode_wav(pcm: &[u8], sample_rate: u32) -> Vec<u8> {
    // An odd trailing byte cannot form a sample
    let data_size = pcm.len() - pcm.len() % 2;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(44 + data_size);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(file_size as u32).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    buf.extend_from_slice(&1u16.to_le_bytes()); // mono
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&(sample_rate * 2).to_le_bytes()); // byte rate
    buf.extend_from_slice(&2u16.to_le_bytes()); // block align
    buf.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&(data_size as u32).to_le_bytes());
    buf.extend_from_slice(&pcm[..data_size]);

    buf
}

/// Decode a base64 PCM payload and wrap it as WAV
pub fn wav_from_base64(audio_base64: &str, sample_rate: u32) -> Result<Vec<u8>> {
    let pcm = STANDARD
        .decode(audio_base64.as_bytes())
        .context("Audio payload is not valid base64")?;
    Ok(encode_wav(&pcm, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_config_default() {
        let config = SpeechConfig::default();
        assert_eq!(config.voice, "Kore");
        assert_eq!(config.sample_rate, 24000);
    }

    #[test]
    fn test_encode_base64() {
        assert_eq!(encode_base64(&[0, 1, 2]), "AAEC");
        assert_eq!(encode_base64(&[]), "");
    }

    #[test]
    fn test_encode_wav() {
        let pcm = vec![0u8; 200];
        let wav = encode_wav(&pcm, 24000);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(wav.len(), 44 + 200);
        assert_eq!(u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]), 24000);
    }

    #[test]
    fn test_encode_wav_drops_odd_byte() {
        let wav = encode_wav(&[1, 2, 3], 24000);
        assert_eq!(wav.len(), 44 + 2);
        assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 2);
    }

    #[test]
    fn test_wav_from_base64() {
        let wav = wav_from_base64("AAEC", 24000).unwrap();
        assert_eq!(wav.len(), 44 + 2);
        assert!(wav_from_base64("not base64!", 24000).is_err());
    }
}
