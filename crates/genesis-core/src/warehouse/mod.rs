//! Transaction warehouse access
//!
//! [`TransactionSource`] abstracts the analytical store the analyst agent
//! reads from. [`bigquery::BigQueryClient`] is the production implementation;
//! [`mock::mock_transactions`] is the built-in dataset used whenever the
//! warehouse cannot be reached.

pub mod bigquery;
pub mod mock;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{ChartDatum, Transaction};

pub use bigquery::BigQueryClient;
pub use mock::mock_transactions;

/// A store of recent transactions
#[async_trait]
pub trait TransactionSource: Send + Sync {
    fn name(&self) -> &str;

    /// Up to `limit` transactions, newest first
    async fn recent_transactions(&self, limit: usize) -> Result<Vec<Transaction>>;
}

/// Expense totals per category, in first-seen order. Income is excluded.
pub fn aggregate_spending(transactions: &[Transaction]) -> Vec<ChartDatum> {
    let mut totals: Vec<(String, i64)> = Vec::new();
    for tx in transactions.iter().filter(|tx| !tx.is_income()) {
        match totals.iter_mut().find(|(category, _)| *category == tx.category) {
            Some((_, total)) => *total += tx.amount,
            None => totals.push((tx.category.clone(), tx.amount)),
        }
    }

    totals
        .into_iter()
        .map(|(category, amount)| ChartDatum {
            category,
            amount: amount as f64,
        })
        .collect()
}
