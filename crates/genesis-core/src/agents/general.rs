//! GENERAL: web-search-grounded concierge

use crate::error::AgentError;
use crate::providers::{GenerateRequest, GroundingSource, GroundingTool, LlmProvider};
use crate::types::GroundedReply;

use super::reply_text;

/// Title used for web sources the search tool returned untitled
pub const DEFAULT_CITATION_TITLE: &str = "参照元";

fn system_prompt(profile_context: &str) -> String {
    format!(
        "You are a helpful general concierge for a banking app. \
         You can answer any questions using Google Search. \
         Always answer in Japanese.\n{}",
        profile_context
    )
}

pub(crate) async fn run(
    provider: &dyn LlmProvider,
    user_message: &str,
    profile_context: &str,
) -> Result<GroundedReply, AgentError> {
    let request = GenerateRequest::new(user_message)
        .with_system(system_prompt(profile_context))
        .with_tool(GroundingTool::GoogleSearch);

    let response = provider
        .generate(&request)
        .await
        .map_err(AgentError::Generation)?;

    Ok(GroundedReply {
        text: reply_text(&response)?,
        citations: response.citations(GroundingSource::Web, DEFAULT_CITATION_TITLE),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::fakes::ScriptedProvider;
    use crate::providers::{GenerateResponse, GroundingChunk};

    #[tokio::test]
    async fn test_general_uses_search_and_collects_citations() {
        let provider = ScriptedProvider::new(vec![Ok(GenerateResponse {
            text: Some("本日の東京は晴れです。".to_string()),
            audio: None,
            grounding_chunks: vec![
                GroundingChunk {
                    source: GroundingSource::Web,
                    title: Some("weather.example".to_string()),
                    uri: Some("https://weather.example/tokyo".to_string()),
                },
                GroundingChunk {
                    source: GroundingSource::Web,
                    title: None,
                    uri: Some("https://news.example/1".to_string()),
                },
            ],
        })]);

        let reply = run(&provider, "今日の天気は？", "").await.unwrap();
        assert_eq!(reply.text, "本日の東京は晴れです。");
        assert_eq!(reply.citations.len(), 2);
        assert_eq!(reply.citations[0].uri, "https://weather.example/tokyo");
        assert_eq!(reply.citations[1].title, DEFAULT_CITATION_TITLE);

        let request = &provider.requests()[0];
        assert_eq!(request.contents, "今日の天気は？");
        assert_eq!(request.tools, vec![GroundingTool::GoogleSearch]);
        assert!(request
            .system_instruction
            .as_deref()
            .unwrap()
            .contains("Always answer in Japanese."));
    }

    #[tokio::test]
    async fn test_general_without_grounding_has_empty_citations() {
        let provider = ScriptedProvider::texts(&["こんにちは"]);
        let reply = run(&provider, "hi", "").await.unwrap();
        assert!(reply.citations.is_empty());
    }
}
