//! BigQuery transaction source over the `jobs.query` REST API

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use super::TransactionSource;
use crate::types::Transaction;

const QUERY_TIMEOUT_MS: u64 = 30_000;

/// BigQuery client bound to one transaction table
#[derive(Clone)]
pub struct BigQueryClient {
    client: Client,
    base_url: String,
    project: String,
    location: String,
    access_token: String,
    table: String,
}

impl std::fmt::Debug for BigQueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BigQueryClient")
            .field("base_url", &self.base_url)
            .field("project", &self.project)
            .field("location", &self.location)
            .field("access_token", &"***")
            .field("table", &self.table)
            .finish()
    }
}

impl BigQueryClient {
    pub fn new(project: String, location: String, access_token: String, table: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: "https://bigquery.googleapis.com".to_string(),
            project,
            location,
            access_token,
            table,
        }
    }

    /// Set a custom base URL (e.g. for an emulator)
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Standard SQL for the newest `limit` transactions
    pub fn query_sql(&self, limit: usize) -> Result<String> {
        if !is_valid_table_ref(&self.table) {
            bail!("Invalid BigQuery table reference '{}'", self.table);
        }
        Ok(format!(
            "SELECT transaction_date AS date, amount, category, description \
             FROM `{}` ORDER BY date DESC LIMIT {}",
            self.table, limit
        ))
    }

    fn rows_to_transactions(response: QueryResponse) -> Result<Vec<Transaction>> {
        if response.job_complete == Some(false) {
            bail!("BigQuery job did not complete within {} ms", QUERY_TIMEOUT_MS);
        }

        let fields: Vec<String> = response
            .schema
            .map(|s| s.fields.into_iter().map(|f| f.name).collect())
            .unwrap_or_default();

        response
            .rows
            .into_iter()
            .map(|row| -> Result<Transaction> {
                let cell = |name: &str| -> Option<String> {
                    let index = fields.iter().position(|f| f == name)?;
                    row.f.get(index).and_then(|c| cell_to_string(&c.v))
                };

                let raw_amount = cell("amount").ok_or_else(|| anyhow!("Row is missing 'amount'"))?;
                let amount = parse_amount(&raw_amount)
                    .ok_or_else(|| anyhow!("Unparseable amount '{}'", raw_amount))?;

                Ok(Transaction {
                    id: None,
                    date: cell("date").map(|d| normalize_date(&d)).unwrap_or_default(),
                    description: cell("description").unwrap_or_default(),
                    amount,
                    category: cell("category").unwrap_or_default(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl TransactionSource for BigQueryClient {
    fn name(&self) -> &str {
        "bigquery"
    }

    async fn recent_transactions(&self, limit: usize) -> Result<Vec<Transaction>> {
        if self.access_token.is_empty() {
            bail!("No BigQuery access token configured");
        }

        let sql = self.query_sql(limit)?;
        let url = format!(
            "{}/bigquery/v2/projects/{}/queries",
            self.base_url, self.project
        );
        let body = serde_json::json!({
            "query": sql,
            "useLegacySql": false,
            "location": self.location,
            "maxResults": limit,
            "timeoutMs": QUERY_TIMEOUT_MS,
        });

        debug!("BigQuery query: project={}, table={}", self.project, self.table);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to BigQuery")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!(
                "BigQuery request failed with status {}: {}",
                status,
                error_text
            ));
        }

        let query_response: QueryResponse = response
            .json()
            .await
            .context("Failed to parse BigQuery response")?;

        let transactions = Self::rows_to_transactions(query_response)?;
        info!("Fetched {} transactions from BigQuery", transactions.len());
        Ok(transactions)
    }
}

/// `project.dataset.table`, each segment alphanumeric, `_` or `-`
fn is_valid_table_ref(table: &str) -> bool {
    let segments: Vec<&str> = table.split('.').collect();
    (2..=3).contains(&segments.len())
        && segments.iter().all(|s| {
            !s.is_empty()
                && s.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        })
}

fn cell_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Integer amounts pass through; fractional amounts round to the nearest unit
fn parse_amount(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().map(|f| f.round() as i64))
}

/// TIMESTAMP values arrive as epoch seconds; anything non-numeric (DATE
/// strings like `YYYY-MM-DD`) passes through unchanged
fn normalize_date(raw: &str) -> String {
    match raw.trim().parse::<f64>() {
        Ok(secs) if secs.is_finite() => chrono::DateTime::from_timestamp(secs.trunc() as i64, 0)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| raw.to_string()),
        _ => raw.to_string(),
    }
}

// ── BigQuery wire types ──

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    job_complete: Option<bool>,
    #[serde(default)]
    schema: Option<TableSchema>,
    #[serde(default)]
    rows: Vec<TableRow>,
}

#[derive(Debug, Deserialize)]
struct TableSchema {
    #[serde(default)]
    fields: Vec<TableField>,
}

#[derive(Debug, Deserialize)]
struct TableField {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    #[serde(default)]
    f: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
struct TableCell {
    #[serde(default)]
    v: Value,
}
