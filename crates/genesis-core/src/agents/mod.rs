//! Agent dispatch: one prompt strategy per agent type
//!
//! [`Dispatcher::generate_response`] is the single entry point. It renders the
//! profile context, runs the branch selected by the agent tag, and folds every
//! failure into [`AgentResult::Failed`], so callers always get a result.

pub mod analyst;
pub mod general;
pub mod news;
pub mod support;

#[cfg(test)]
pub(crate) mod fakes;

use std::sync::Arc;
use tracing::{error, info};

use crate::audio::TextToSpeech;
use crate::context::format_profile_context;
use crate::error::AgentError;
use crate::providers::{GenerateResponse, LlmProvider};
use crate::types::{AgentResult, AgentType, UserProfile};
use crate::warehouse::TransactionSource;

/// Tunables for the four agent branches
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Fully qualified Vertex AI Search datastore used by the support agent
    pub support_datastore: String,
    pub support_temperature: f32,
    /// Maximum number of transactions the analyst reads
    pub analyst_limit: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            support_datastore: "projects/bank-moc/locations/global/collections/default_collection/dataStores/bank-moc-faq_1765851574533".to_string(),
            support_temperature: 0.1,
            analyst_limit: 50,
        }
    }
}

/// Routes chat requests to the agent branches
pub struct Dispatcher {
    provider: Arc<dyn LlmProvider>,
    warehouse: Arc<dyn TransactionSource>,
    tts: Arc<dyn TextToSpeech>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        warehouse: Arc<dyn TransactionSource>,
        tts: Arc<dyn TextToSpeech>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            provider,
            warehouse,
            tts,
            config,
        }
    }

    /// Answer one chat message. Never fails.
    pub async fn generate_response(
        &self,
        agent_type: &str,
        user_message: &str,
        profile: Option<&UserProfile>,
    ) -> AgentResult {
        let Some(agent) = AgentType::parse(agent_type) else {
            info!("Unknown agent type '{}'", agent_type);
            return AgentResult::UnknownAgent;
        };

        let profile_context = format_profile_context(profile);
        let provider = self.provider.as_ref();

        let outcome = match agent {
            AgentType::General => general::run(provider, user_message, &profile_context)
                .await
                .map(AgentResult::General),
            AgentType::Support => support::run(
                provider,
                &self.config.support_datastore,
                self.config.support_temperature,
                user_message,
                &profile_context,
            )
            .await
            .map(AgentResult::Support),
            AgentType::News => news::run(
                provider,
                self.tts.as_ref(),
                user_message,
                profile,
                &profile_context,
            )
            .await
            .map(AgentResult::News),
            AgentType::Analyst => analyst::run(
                provider,
                self.warehouse.as_ref(),
                self.config.analyst_limit,
                user_message,
                &profile_context,
            )
            .await
            .map(AgentResult::Analyst),
        };

        match outcome {
            Ok(result) => {
                info!("{} agent answered ({} chars)", agent, result.text().chars().count());
                result
            }
            Err(e) => {
                error!(kind = %e.kind(), "{} agent failed: {}", agent, e);
                AgentResult::Failed(e.kind())
            }
        }
    }
}

/// Reply text, treating a text-less reply as a generation failure
pub(crate) fn reply_text(response: &GenerateResponse) -> Result<String, AgentError> {
    response
        .text
        .clone()
        .ok_or_else(|| AgentError::Generation(anyhow::anyhow!("Model reply contained no text")))
}
