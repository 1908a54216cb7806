//! In-memory collaborators for dispatcher tests

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::audio::TextToSpeech;
use crate::providers::{GenerateRequest, GenerateResponse, LlmProvider};
use crate::types::Transaction;
use crate::warehouse::TransactionSource;

/// Replays canned responses in order and records every request
pub(crate) struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<GenerateResponse, String>>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedProvider {
    pub(crate) fn new(replies: Vec<Result<GenerateResponse, &str>>) -> Self {
        Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map_err(str::to_string))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(GenerateResponse::from_text(*t))).collect())
    }

    pub(crate) fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        self.requests.lock().unwrap().push(request.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no scripted reply left")),
        }
    }
}

/// Warehouse that returns fixed rows or always fails
pub(crate) struct StaticWarehouse {
    rows: Option<Vec<Transaction>>,
}

impl StaticWarehouse {
    pub(crate) fn with_rows(rows: Vec<Transaction>) -> Self {
        Self { rows: Some(rows) }
    }

    pub(crate) fn failing() -> Self {
        Self { rows: None }
    }
}

#[async_trait]
impl TransactionSource for StaticWarehouse {
    fn name(&self) -> &str {
        "static"
    }

    async fn recent_transactions(&self, limit: usize) -> Result<Vec<Transaction>> {
        match &self.rows {
            Some(rows) => Ok(rows.iter().take(limit).cloned().collect()),
            None => Err(anyhow!("403 Access Denied: bigquery.jobs.create")),
        }
    }
}

/// Speech engine that returns fixed bytes or always fails
pub(crate) struct FakeTts {
    audio: Option<Vec<u8>>,
    scripts: Mutex<Vec<String>>,
}

impl FakeTts {
    pub(crate) fn with_audio(audio: Vec<u8>) -> Self {
        Self {
            audio: Some(audio),
            scripts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            audio: None,
            scripts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextToSpeech for FakeTts {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        self.scripts.lock().unwrap().push(text.to_string());
        self.audio
            .clone()
            .ok_or_else(|| anyhow!("speech model unavailable"))
    }

    fn name(&self) -> &str {
        "fake_tts"
    }
}
