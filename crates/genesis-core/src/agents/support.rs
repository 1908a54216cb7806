//! SUPPORT: customer support restricted to the FAQ datastore

use tracing::debug;

use crate::error::AgentError;
use crate::providers::{GenerateRequest, GroundingSource, GroundingTool, LlmProvider};
use crate::types::GroundedReply;

use super::reply_text;

pub const DEFAULT_CITATION_TITLE: &str = "サポート文書";

/// Fixed answer the model must give when the documents do not cover a question
pub const REFUSAL_MESSAGE: &str =
    "申し訳ありませんが、その件に関する情報は持ち合わせておりません。";

fn system_prompt(profile_context: &str) -> String {
    format!(
        "あなたはGENESIS APPの厳格なカスタマーサポートエージェントです。\n\
         提供されたデータストアを検索し、その情報に基づいて質問に答えてください。\n\
         {}\n\
         ルール:\n\
         1. 検索結果に基づいて、丁寧な日本語で答えてください。\n\
         2. 検索結果に関連情報がない場合は、「{}」と答えてください。\n\
         3. 検索結果以外の一般知識や推測を含めないでください。",
        profile_context, REFUSAL_MESSAGE
    )
}

pub(crate) async fn run(
    provider: &dyn LlmProvider,
    datastore: &str,
    temperature: f32,
    user_message: &str,
    profile_context: &str,
) -> Result<GroundedReply, AgentError> {
    debug!("Support retrieval over {}", datastore);

    let request = GenerateRequest::new(user_message)
        .with_system(system_prompt(profile_context))
        .with_tool(GroundingTool::VertexAiSearch {
            datastore: datastore.to_string(),
        })
        .with_temperature(temperature);

    let response = provider
        .generate(&request)
        .await
        .map_err(AgentError::Generation)?;

    Ok(GroundedReply {
        text: reply_text(&response)?,
        citations: response.citations(GroundingSource::RetrievedContext, DEFAULT_CITATION_TITLE),
    })
}
