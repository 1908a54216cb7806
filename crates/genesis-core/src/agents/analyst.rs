//! ANALYST: spending analysis over recent transactions

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::providers::{GenerateRequest, LlmProvider, ResponseFormat};
use crate::types::{AnalystReply, ChartDatum, Transaction};
use crate::warehouse::{TransactionSource, aggregate_spending, mock_transactions};

/// Analysis text used when the model's JSON omits it
pub const DEFAULT_ANALYSIS: &str = "解析できませんでした";

fn system_prompt(profile_context: &str, transactions_json: &str) -> String {
    format!(
        r#"You are a financial analyst. Analyze the following transaction data.

Output MUST be valid JSON with the following structure:
{{
    "analysis": "Your detailed analysis text in Japanese...",
    "chart_data": [
        {{"category": "Food", "amount": 1000}},
        {{"category": "Transport", "amount": 2000}}
    ]
}}

Chart Guidelines:
- Aggregate amounts by category (e.g., total 'Food' expense).
- Exclude income (negative amounts) from the spending chart.
- Use the 'category' field for grouping.

User Profile: {}
Transactions: {}"#,
        profile_context, transactions_json
    )
}

/// Recent transactions, or the built-in dataset when the warehouse fails
async fn load_transactions(warehouse: &dyn TransactionSource, limit: usize) -> Vec<Transaction> {
    match warehouse.recent_transactions(limit).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!(
                "{} unavailable, using mock transactions: {}",
                warehouse.name(),
                AgentError::Warehouse(e)
            );
            mock_transactions()
        }
    }
}

/// Interpret the model reply.
///
/// Any JSON object is a structured reply; fields of the wrong type are read
/// leniently. Invalid JSON and non-object values pass through as raw text.
fn parse_reply(raw: String, transactions: &[Transaction]) -> AnalystReply {
    let payload = match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(payload)) => payload,
        Ok(other) => {
            warn!("Analyst reply is JSON but not an object ({})", json_kind(&other));
            return AnalystReply::RawText(raw);
        }
        Err(e) => {
            warn!("Analyst reply is not the expected JSON: {}", AgentError::from(e));
            return AnalystReply::RawText(raw);
        }
    };

    AnalystReply::Structured {
        analysis: read_analysis(&payload),
        chart_data: read_chart_data(&payload)
            .unwrap_or_else(|| aggregate_spending(transactions)),
    }
}

fn read_analysis(payload: &Map<String, Value>) -> String {
    match payload.get("analysis") {
        Some(Value::String(text)) => text.clone(),
        None | Some(Value::Null) => DEFAULT_ANALYSIS.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Usable chart rows, or `None` when the reply carries no chart list
fn read_chart_data(payload: &Map<String, Value>) -> Option<Vec<ChartDatum>> {
    let items = payload.get("chart_data")?.as_array()?;
    let chart: Vec<ChartDatum> = items.iter().filter_map(read_chart_datum).collect();
    if chart.len() < items.len() {
        debug!("Skipped {} unusable chart rows", items.len() - chart.len());
    }
    Some(chart)
}

fn read_chart_datum(item: &Value) -> Option<ChartDatum> {
    let category = match item.get("category")? {
        Value::String(s) if !s.trim().is_empty() => s.clone(),
        _ => return None,
    };
    let amount = match item.get("amount")? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok()?,
        _ => return None,
    };
    amount.is_finite().then_some(ChartDatum { category, amount })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) async fn run(
    provider: &dyn LlmProvider,
    warehouse: &dyn TransactionSource,
    limit: usize,
    user_message: &str,
    profile_context: &str,
) -> Result<AnalystReply, AgentError> {
    let transactions = load_transactions(warehouse, limit).await;
    let transactions_json = serde_json::to_string_pretty(&transactions)?;
    debug!("Analyzing {} transactions", transactions.len());

    let request = GenerateRequest::new(user_message)
        .with_system(system_prompt(profile_context, &transactions_json))
        .with_format(ResponseFormat::Json);

    let response = provider
        .generate(&request)
        .await
        .map_err(AgentError::Generation)?;
    let raw = super::reply_text(&response)?;

    Ok(parse_reply(raw, &transactions))
}
