//! Built-in transactions used when the warehouse is unavailable

use crate::types::Transaction;

const MOCK_ROWS: [(&str, &str, &str, i64, &str); 7] = [
    ("tx1", "2024-03-01", "スーパーマーケットLIFE", 5400, "食費"),
    ("tx2", "2024-03-02", "Amazon Prime", 600, "サブスクリプション"),
    ("tx3", "2024-03-03", "スターバックス", 1200, "カフェ"),
    ("tx4", "2024-03-05", "家賃振込", 85000, "住居費"),
    ("tx5", "2024-03-10", "UBER EATS", 2800, "食費"),
    ("tx6", "2024-03-15", "給与振込", -320000, "収入"),
    ("tx7", "2024-03-20", "ユニクロ", 12000, "衣類"),
];

pub fn mock_transactions() -> Vec<Transaction> {
    MOCK_ROWS
        .iter()
        .map(|&(id, date, description, amount, category)| Transaction {
            id: Some(id.to_string()),
            date: date.to_string(),
            description: description.to_string(),
            amount,
            category: category.to_string(),
        })
        .collect()
}
