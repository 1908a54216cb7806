//! genesis-core - Agent dispatch for the GENESIS banking assistant
//!
//! This crate provides:
//! - The dispatcher that routes a chat message to one of four agents
//! - A Gemini client with web search, datastore retrieval, JSON and audio modes
//! - A BigQuery transaction source with a built-in fallback dataset
//! - Profile context rendering and speech packaging helpers

pub mod agents;
pub mod audio;
pub mod context;
pub mod error;
pub mod providers;
pub mod types;
pub mod warehouse;

// Re-export main types for convenience
pub use agents::{Dispatcher, DispatcherConfig};
pub use audio::{GeminiTts, SpeechConfig, TextToSpeech};
pub use error::{AgentError, ErrorKind};
pub use providers::{GeminiEndpoint, GoogleProvider, LlmProvider};
pub use types::{
    AgentResult, AgentType, AnalystReply, ChartDatum, GroundedReply, GroundingCitation,
    NewsReply, Transaction, UserProfile,
};
pub use warehouse::{BigQueryClient, TransactionSource};
