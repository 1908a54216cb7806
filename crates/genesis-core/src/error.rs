//! Failure taxonomy for agent dispatch
//!
//! Clients and warehouses speak `anyhow`; the dispatcher wraps whatever they
//! return into an [`AgentError`] so each failure carries the kind of
//! collaborator that produced it. At the boundary only the [`ErrorKind`]
//! survives, and the HTTP layer never sees an error at all.

use serde::Serialize;
use thiserror::Error;

/// Coarse classification of a dispatch failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The generation API failed or returned nothing usable
    Generation,
    /// The transaction warehouse could not be queried
    Warehouse,
    /// The summary or speech step of the news narration failed
    Speech,
    /// The model ignored the structured output contract
    MalformedOutput,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generation => write!(f, "generation"),
            Self::Warehouse => write!(f, "warehouse"),
            Self::Speech => write!(f, "speech"),
            Self::MalformedOutput => write!(f, "malformed_output"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("generation request failed: {0:#}")]
    Generation(anyhow::Error),

    #[error("warehouse query failed: {0:#}")]
    Warehouse(anyhow::Error),

    #[error("speech synthesis failed: {0:#}")]
    Speech(anyhow::Error),

    #[error("model reply is not valid JSON: {0}")]
    MalformedOutput(#[from] serde_json::Error),
}

impl AgentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Generation(_) => ErrorKind::Generation,
            Self::Warehouse(_) => ErrorKind::Warehouse,
            Self::Speech(_) => ErrorKind::Speech,
            Self::MalformedOutput(_) => ErrorKind::MalformedOutput,
        }
    }
}
