//! NEWS: search-grounded market digest with a narrated summary
//!
//! The article is the reply. Narration runs afterwards as a best-effort
//! step: a summary pass, then speech synthesis. Any narration failure is
//! logged and leaves the audio empty without touching the article.

use tracing::{debug, warn};

use crate::audio::{TextToSpeech, encode_base64};
use crate::context::describe_interests;
use crate::error::AgentError;
use crate::providers::{GenerateRequest, GroundingSource, GroundingTool, LlmProvider};
use crate::types::{NewsReply, UserProfile};

use super::reply_text;

pub const DEFAULT_CITATION_TITLE: &str = "ニュースソース";

fn article_prompt(user_message: &str, profile: Option<&UserProfile>, profile_context: &str) -> String {
    format!(
        "今日の株、債券、不動産、経済指標に関する最新の金融ニュースを探してください。\n\
         これに基づき、包括的な記事（500〜800文字程度）を日本語で作成してください。\n\
         明確な見出しを付けて構成してください。\n\n\
         ユーザーの興味関心: {}\n\
         {}\n\
         ユーザーのクエリ: {}",
        describe_interests(profile),
        profile_context,
        user_message
    )
}

fn summary_prompt(article: &str) -> String {
    format!(
        "以下の記事をリスナー向けに1分程度の短い音声スクリプトとして日本語で要約してください:\n\n{}",
        article
    )
}

pub(crate) async fn run(
    provider: &dyn LlmProvider,
    tts: &dyn TextToSpeech,
    user_message: &str,
    profile: Option<&UserProfile>,
    profile_context: &str,
) -> Result<NewsReply, AgentError> {
    let request = GenerateRequest::new(article_prompt(user_message, profile, profile_context))
        .with_tool(GroundingTool::GoogleSearch);

    let response = provider
        .generate(&request)
        .await
        .map_err(AgentError::Generation)?;
    let article = reply_text(&response)?;
    let citations = response.citations(GroundingSource::Web, DEFAULT_CITATION_TITLE);

    let audio_base64 = match narrate(provider, tts, &article).await {
        Ok(audio) => Some(audio),
        Err(e) => {
            warn!("Continuing without audio: {}", e);
            None
        }
    };

    Ok(NewsReply {
        article,
        citations,
        audio_base64,
    })
}

/// Summarize the article for listening and synthesize it, returning base64 audio
async fn narrate(
    provider: &dyn LlmProvider,
    tts: &dyn TextToSpeech,
    article: &str,
) -> Result<String, AgentError> {
    let summary = provider
        .generate(&GenerateRequest::new(summary_prompt(article)))
        .await
        .map_err(AgentError::Speech)?
        .text
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AgentError::Speech(anyhow::anyhow!("Summary reply contained no text")))?;

    debug!("Narrating {} char summary with {}", summary.chars().count(), tts.name());

    let audio = tts.synthesize(&summary).await.map_err(AgentError::Speech)?;
    Ok(encode_base64(&audio))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::fakes::{FakeTts, ScriptedProvider};
    use crate::error::ErrorKind;
    use crate::providers::{GenerateResponse, GroundingChunk};

    fn article_response() -> GenerateResponse {
        GenerateResponse {
            text: Some("## 日経平均は続伸\n本日の市場は...".to_string()),
            audio: None,
            grounding_chunks: vec![GroundingChunk {
                source: GroundingSource::Web,
                title: None,
                uri: Some("https://markets.example/nikkei".to_string()),
            }],
        }
    }

    #[tokio::test]
    async fn test_news_with_audio() {
        let provider = ScriptedProvider::new(vec![
            Ok(article_response()),
            Ok(GenerateResponse::from_text("日経平均は続伸しました。")),
        ]);
        let tts = FakeTts::with_audio(vec![1, 2, 3]);

        let reply = run(&provider, &tts, "最新ニュース", None, "").await.unwrap();
        assert!(reply.article.starts_with("## 日経平均は続伸"));
        assert_eq!(reply.citations[0].title, DEFAULT_CITATION_TITLE);
        assert_eq!(reply.audio_base64.as_deref(), Some("AQID"));
        assert_eq!(tts.scripts(), vec!["日経平均は続伸しました。".to_string()]);

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tools, vec![GroundingTool::GoogleSearch]);
        assert!(requests[0].contents.contains("ユーザーの興味関心: 一般"));
        assert!(requests[0].contents.contains("ユーザーのクエリ: 最新ニュース"));
        assert!(requests[1].contents.contains("## 日経平均は続伸"));
        assert!(requests[1].tools.is_empty());
    }

    #[tokio::test]
    async fn test_news_tts_failure_keeps_article() {
        let provider = ScriptedProvider::new(vec![
            Ok(article_response()),
            Ok(GenerateResponse::from_text("要約")),
        ]);
        let tts = FakeTts::failing();

        let reply = run(&provider, &tts, "ニュース", None, "").await.unwrap();
        assert!(reply.audio_base64.is_none());
        assert!(reply.article.starts_with("## 日経平均は続伸"));
        assert_eq!(reply.citations.len(), 1);
    }

    #[tokio::test]
    async fn test_news_summary_failure_skips_synthesis() {
        let provider = ScriptedProvider::new(vec![Ok(article_response()), Err("429 quota")]);
        let tts = FakeTts::with_audio(vec![0; 4]);

        let reply = run(&provider, &tts, "ニュース", None, "").await.unwrap();
        assert!(reply.audio_base64.is_none());
        assert!(tts.scripts().is_empty());
    }

    #[tokio::test]
    async fn test_news_article_failure_is_generation_error() {
        let provider = ScriptedProvider::new(vec![Err("500")]);
        let tts = FakeTts::with_audio(vec![0; 4]);

        let err = run(&provider, &tts, "ニュース", None, "").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Generation);
    }

    #[test]
    fn test_article_prompt_uses_interests() {
        let profile = UserProfile {
            interests: vec!["不動産".to_string(), "債券".to_string()],
            ..UserProfile::default()
        };
        let prompt = article_prompt("教えて", Some(&profile), "");
        assert!(prompt.contains("ユーザーの興味関心: 不動産, 債券"));
        assert!(prompt.contains("500〜800文字"));
    }
}
