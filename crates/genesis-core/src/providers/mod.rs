//! Generation backends
//!
//! Backends implement the [`LlmProvider`] trait. The only production backend
//! is Gemini ([`google::GoogleProvider`]), reachable through either the
//! Vertex AI or the Generative Language endpoint.

pub mod google;
pub mod types;

pub use google::{GeminiEndpoint, GoogleProvider};
pub use types::{
    GenerateRequest, GenerateResponse, GroundingChunk, GroundingSource, GroundingTool,
    InlineAudio, LlmProvider, ResponseFormat,
};
