//! Google Gemini provider

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::types::{
    GenerateRequest, GenerateResponse, GroundingChunk, GroundingSource, GroundingTool,
    InlineAudio, LlmProvider, ResponseFormat,
};

/// Which Gemini API surface to call, with its credentials
#[derive(Clone)]
pub enum GeminiEndpoint {
    /// Vertex AI, authenticated with an OAuth access token
    VertexAi {
        project: String,
        location: String,
        access_token: String,
    },
    /// Generative Language API, authenticated with an API key
    GenerativeLanguage { api_key: String },
}

impl std::fmt::Debug for GeminiEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VertexAi {
                project, location, ..
            } => f
                .debug_struct("VertexAi")
                .field("project", project)
                .field("location", location)
                .field("access_token", &"***")
                .finish(),
            Self::GenerativeLanguage { .. } => f
                .debug_struct("GenerativeLanguage")
                .field("api_key", &"***")
                .finish(),
        }
    }
}

impl GeminiEndpoint {
    fn default_base_url(&self) -> String {
        match self {
            Self::VertexAi { location, .. } if location == "global" => {
                "https://aiplatform.googleapis.com".to_string()
            }
            Self::VertexAi { location, .. } => format!("https://{}-aiplatform.googleapis.com", location),
            Self::GenerativeLanguage { .. } => "https://generativelanguage.googleapis.com".to_string(),
        }
    }

    fn path(&self, model: &str) -> String {
        match self {
            Self::VertexAi {
                project, location, ..
            } => format!(
                "/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
                project, location, model
            ),
            Self::GenerativeLanguage { .. } => format!("/v1beta/models/{}:generateContent", model),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::VertexAi { .. } => "vertex_ai",
            Self::GenerativeLanguage { .. } => "generative_language",
        }
    }
}

/// Google Gemini provider
pub struct GoogleProvider {
    client: Client,
    endpoint: GeminiEndpoint,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for GoogleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleProvider")
            .field("endpoint", &self.endpoint)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl GoogleProvider {
    pub fn new(endpoint: GeminiEndpoint, model: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: endpoint.default_base_url(),
            endpoint,
            model,
        }
    }

    /// Set a custom base URL (e.g. for proxies or a regional mirror)
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url, self.endpoint.path(&self.model))
    }

    /// Convert a provider-agnostic request to Gemini wire format
    fn to_gemini_request(request: &GenerateRequest) -> GeminiRequest {
        let contents = vec![GeminiContent {
            role: Some("user".to_string()),
            parts: vec![GeminiPart::text(&request.contents)],
        }];

        let system_instruction = request
            .system_instruction
            .as_ref()
            .map(|system| GeminiContent {
                role: None,
                parts: vec![GeminiPart::text(system)],
            });

        let tools = request
            .tools
            .iter()
            .map(|tool| match tool {
                GroundingTool::GoogleSearch => GeminiTool::GoogleSearch(GoogleSearch {}),
                GroundingTool::VertexAiSearch { datastore } => {
                    GeminiTool::Retrieval(GeminiRetrieval {
                        vertex_ai_search: VertexAiSearch {
                            datastore: datastore.clone(),
                        },
                    })
                }
            })
            .collect();

        let mut config = GenerationConfig {
            temperature: request.temperature,
            ..GenerationConfig::default()
        };
        match &request.format {
            ResponseFormat::Text => {}
            ResponseFormat::Json => {
                config.response_mime_type = Some("application/json".to_string());
            }
            ResponseFormat::Audio { voice } => {
                config.response_modalities = Some(vec!["AUDIO".to_string()]);
                config.speech_config = Some(GeminiSpeechConfig {
                    voice_config: GeminiVoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice.clone(),
                        },
                    },
                });
            }
        }

        GeminiRequest {
            contents,
            system_instruction,
            tools,
            generation_config: (!config.is_empty()).then_some(config),
        }
    }

    /// Convert a Gemini response to provider-agnostic format
    fn from_gemini_response(resp: GeminiApiResponse) -> Result<GenerateResponse> {
        let candidate = resp
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Gemini response had no candidates"))?;

        let mut text: Option<String> = None;
        let mut audio = None;

        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
        for part in parts {
            if part.thought == Some(true) {
                continue;
            }
            if let Some(t) = part.text {
                text.get_or_insert_with(String::new).push_str(&t);
            }
            if audio.is_none() {
                if let Some(blob) = part.inline_data {
                    let data = STANDARD
                        .decode(blob.data.as_bytes())
                        .context("Gemini inline data is not valid base64")?;
                    audio = Some(InlineAudio {
                        mime_type: blob.mime_type,
                        data,
                    });
                }
            }
        }

        let grounding_chunks = candidate
            .grounding_metadata
            .map(|m| m.grounding_chunks)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|chunk| {
                if let Some(web) = chunk.web {
                    Some(GroundingChunk {
                        source: GroundingSource::Web,
                        title: web.title,
                        uri: web.uri,
                    })
                } else {
                    chunk.retrieved_context.map(|ctx| GroundingChunk {
                        source: GroundingSource::RetrievedContext,
                        title: ctx.title,
                        uri: ctx.uri,
                    })
                }
            })
            .collect();

        Ok(GenerateResponse {
            text,
            audio,
            grounding_chunks,
        })
    }
}

#[async_trait]
impl LlmProvider for GoogleProvider {
    fn provider_name(&self) -> &str {
        "google"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let body = Self::to_gemini_request(request);

        debug!(
            "Gemini request: endpoint={}, model={}, tools={}, format={:?}",
            self.endpoint.label(),
            self.model,
            body.tools.len(),
            request.format
        );

        let builder = self.client.post(self.url()).json(&body);
        let builder = match &self.endpoint {
            GeminiEndpoint::VertexAi { access_token, .. } => builder.bearer_auth(access_token),
            GeminiEndpoint::GenerativeLanguage { api_key } => {
                builder.header("x-goog-api-key", api_key)
            }
        };

        let response = builder
            .send()
            .await
            .context("Failed to send request to Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!(
                "Gemini API request failed with status {}: {}",
                status,
                error_text
            ));
        }

        let api_response: GeminiApiResponse = response
            .json()
            .await
            .context("Failed to parse Gemini API response")?;

        if let Some(usage) = &api_response.usage_metadata {
            debug!(
                "Gemini usage: prompt_tokens={}, candidate_tokens={}",
                usage.prompt_token_count.unwrap_or(0),
                usage.candidates_token_count.unwrap_or(0)
            );
        }

        Self::from_gemini_response(api_response)
    }
}

// ── Gemini wire types ──

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<GeminiBlob>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
}

impl GeminiPart {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiBlob {
    #[serde(default)]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum GeminiTool {
    GoogleSearch(GoogleSearch),
    Retrieval(GeminiRetrieval),
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRetrieval {
    vertex_ai_search: VertexAiSearch,
}

#[derive(Debug, Serialize)]
struct VertexAiSearch {
    datastore: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<GeminiSpeechConfig>,
}

impl GenerationConfig {
    fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.response_mime_type.is_none()
            && self.response_modalities.is_none()
            && self.speech_config.is_none()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiSpeechConfig {
    voice_config: GeminiVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiVoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiApiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    grounding_metadata: Option<GeminiGroundingMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GeminiGroundingChunk>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGroundingChunk {
    #[serde(default)]
    web: Option<GeminiChunkRef>,
    #[serde(default)]
    retrieved_context: Option<GeminiChunkRef>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiChunkRef {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}
