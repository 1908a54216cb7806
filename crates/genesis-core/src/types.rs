//! Request and response shapes shared by the dispatcher and the gateway

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// Returned for any agent tag outside the four known ones
pub const UNKNOWN_AGENT_MESSAGE: &str = "不明なエージェントタイプです。";

/// Returned whenever a dispatch fails
pub const APOLOGY_MESSAGE: &str = "申し訳ありません。エラーが発生しました。";

/// Request-routing tag selecting a prompt template and toolset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AgentType {
    General,
    Support,
    News,
    Analyst,
}

impl AgentType {
    pub const ALL: [AgentType; 4] = [Self::General, Self::Support, Self::News, Self::Analyst];

    /// Parse the wire tag. Matching is exact, as clients send the uppercase tag.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "GENERAL" => Some(Self::General),
            "SUPPORT" => Some(Self::Support),
            "NEWS" => Some(Self::News),
            "ANALYST" => Some(Self::Analyst),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "GENERAL",
            Self::Support => "SUPPORT",
            Self::News => "NEWS",
            Self::Analyst => "ANALYST",
        }
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional personalization sent by the client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age_group: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub prefecture: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

/// A (title, URI) pair attributing model output to a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingCitation {
    pub title: String,
    pub uri: String,
}

/// One bar of the analyst's spending chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDatum {
    pub category: String,
    pub amount: f64,
}

/// A ledger entry. Negative amounts are income, positive amounts are expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub date: String,
    pub description: String,
    pub amount: i64,
    pub category: String,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.amount < 0
    }
}

/// Reply grounded in web search or document retrieval
#[derive(Debug, Clone, PartialEq)]
pub struct GroundedReply {
    pub text: String,
    pub citations: Vec<GroundingCitation>,
}

/// News digest with optional narrated summary
#[derive(Debug, Clone, PartialEq)]
pub struct NewsReply {
    pub article: String,
    pub citations: Vec<GroundingCitation>,
    /// Base64 of the raw audio bytes; `None` when narration failed
    pub audio_base64: Option<String>,
}

/// Outcome of the spending analysis
#[derive(Debug, Clone, PartialEq)]
pub enum AnalystReply {
    Structured {
        analysis: String,
        chart_data: Vec<ChartDatum>,
    },
    /// The model reply could not be parsed; passed through verbatim
    RawText(String),
}

/// Result of one dispatch, one variant per agent type
#[derive(Debug, Clone, PartialEq)]
pub enum AgentResult {
    General(GroundedReply),
    Support(GroundedReply),
    News(NewsReply),
    Analyst(AnalystReply),
    UnknownAgent,
    Failed(ErrorKind),
}

impl AgentResult {
    /// The user-facing text. Present for every variant.
    pub fn text(&self) -> &str {
        match self {
            Self::General(reply) | Self::Support(reply) => &reply.text,
            Self::News(reply) => &reply.article,
            Self::Analyst(AnalystReply::Structured { analysis, .. }) => analysis,
            Self::Analyst(AnalystReply::RawText(text)) => text,
            Self::UnknownAgent => UNKNOWN_AGENT_MESSAGE,
            Self::Failed(_) => APOLOGY_MESSAGE,
        }
    }

    pub fn citations(&self) -> Option<&[GroundingCitation]> {
        match self {
            Self::General(reply) | Self::Support(reply) => Some(&reply.citations),
            Self::News(reply) => Some(&reply.citations),
            _ => None,
        }
    }

    pub fn chart_data(&self) -> Option<&[ChartDatum]> {
        match self {
            Self::Analyst(AnalystReply::Structured { chart_data, .. }) => Some(chart_data),
            _ => None,
        }
    }

    /// Flat wire shape expected by the web client
    pub fn envelope(&self) -> ResponseEnvelope<'_> {
        ResponseEnvelope {
            text: self.text(),
            grounding_urls: self.citations(),
            chart_data: self.chart_data(),
            audio_base64: match self {
                Self::News(reply) => Some(reply.audio_base64.as_deref()),
                _ => None,
            },
        }
    }
}

impl Serialize for AgentResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.envelope().serialize(serializer)
    }
}

/// JSON body returned to the client.
///
/// `audioBase64` is emitted as `null` for news replies without audio and
/// omitted for every other agent.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope<'a> {
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grounding_urls: Option<&'a [GroundingCitation]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_data: Option<&'a [ChartDatum]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_base64: Option<Option<&'a str>>,
}
