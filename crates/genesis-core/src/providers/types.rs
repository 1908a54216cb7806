//! Provider-agnostic generation request and response types

use anyhow::Result;
use async_trait::async_trait;

use crate::types::GroundingCitation;

/// Server-side augmentation the model may consult while answering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroundingTool {
    /// Public web search
    GoogleSearch,
    /// Retrieval over a managed document index
    VertexAiSearch { datastore: String },
}

/// Shape the reply must take
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    #[default]
    Text,
    /// Structured output constrained to `application/json`
    Json,
    /// Spoken audio in the given prebuilt voice
    Audio { voice: String },
}

/// A single-turn generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub contents: String,
    pub system_instruction: Option<String>,
    pub tools: Vec<GroundingTool>,
    pub temperature: Option<f32>,
    pub format: ResponseFormat,
}

impl GenerateRequest {
    pub fn new(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
            system_instruction: None,
            tools: Vec::new(),
            temperature: None,
            format: ResponseFormat::Text,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system_instruction = Some(system.into());
        self
    }

    pub fn with_tool(mut self, tool: GroundingTool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_format(mut self, format: ResponseFormat) -> Self {
        self.format = format;
        self
    }
}

/// Where a grounding chunk came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundingSource {
    Web,
    RetrievedContext,
}

/// A source reference attached to the reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundingChunk {
    pub source: GroundingSource,
    pub title: Option<String>,
    pub uri: Option<String>,
}

/// Binary payload returned in audio mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineAudio {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Provider-agnostic reply
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateResponse {
    /// Concatenated text parts, `None` when the reply had none
    pub text: Option<String>,
    pub audio: Option<InlineAudio>,
    pub grounding_chunks: Vec<GroundingChunk>,
}

impl GenerateResponse {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Citations from chunks of one source, in the order returned.
    ///
    /// Chunks without a URI are skipped; a missing title falls back to
    /// `default_title`.
    pub fn citations(&self, source: GroundingSource, default_title: &str) -> Vec<GroundingCitation> {
        self.grounding_chunks
            .iter()
            .filter(|chunk| chunk.source == source)
            .filter_map(|chunk| {
                let uri = chunk.uri.as_deref().filter(|u| !u.is_empty())?;
                let title = chunk
                    .title
                    .as_deref()
                    .filter(|t| !t.is_empty())
                    .unwrap_or(default_title);
                Some(GroundingCitation {
                    title: title.to_string(),
                    uri: uri.to_string(),
                })
            })
            .collect()
    }
}

/// Trait that all generation backends implement
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g. "google")
    fn provider_name(&self) -> &str;

    /// Model identifier (e.g. "gemini-2.0-flash-exp")
    fn model(&self) -> &str;

    /// Issue one generation request
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse>;
}
