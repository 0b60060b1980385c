use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::utils::parse_cents;

/// Ordering used by the transaction list: newest first
pub const DEFAULT_ORDERING: &str = "-date,-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxType {
    #[serde(rename = "IN")]
    Income,
    #[serde(rename = "OUT")]
    Expense,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Income => "IN",
            TxType::Expense => "OUT",
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" | "INCOME" => Ok(TxType::Income),
            "OUT" | "EXPENSE" => Ok(TxType::Expense),
            other => Err(format!("unknown transaction type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    #[serde(rename = "type")]
    pub tx_type: TxType,
    /// Decimal string as sent by the API, e.g. "14.99"
    pub amount: String,
    /// YYYY-MM-DD
    pub date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<i64>,
    #[serde(default)]
    pub category_name: Option<String>,
    pub created_at: String,
}

impl Transaction {
    pub fn amount_cents(&self) -> Option<i64> {
        parse_cents(&self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTransaction {
    #[serde(rename = "type")]
    pub tx_type: TxType,
    pub amount: String,
    pub date: String,
    pub description: String,
    pub category: Option<i64>,
}

/// Query for the transaction list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionFilter {
    /// YYYY-MM
    pub month: String,
    pub tx_type: Option<TxType>,
    pub category: Option<i64>,
}

impl TransactionFilter {
    pub fn month(month: impl Into<String>) -> Self {
        Self {
            month: month.into(),
            tx_type: None,
            category: None,
        }
    }

    pub fn with_type(mut self, tx_type: TxType) -> Self {
        self.tx_type = Some(tx_type);
        self
    }

    pub fn with_category(mut self, category: i64) -> Self {
        self.category = Some(category);
        self
    }

    /// Query string pairs in the order the API documents them
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("month", self.month.clone())];
        if let Some(tx_type) = self.tx_type {
            pairs.push(("type", tx_type.as_str().to_string()));
        }
        if let Some(category) = self.category {
            pairs.push(("category", category.to_string()));
        }
        pairs.push(("ordering", DEFAULT_ORDERING.to_string()));
        pairs
    }
}

/// Income, expense and balance of a set of transactions, in cents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub income: i64,
    pub expense: i64,
}

impl Totals {
    /// Amounts that don't parse are skipped
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        transactions.iter().fold(Self::default(), |mut totals, tx| {
            if let Some(cents) = tx.amount_cents() {
                match tx.tx_type {
                    TxType::Income => totals.income += cents,
                    TxType::Expense => totals.expense += cents,
                }
            }
            totals
        })
    }

    pub fn balance(&self) -> i64 {
        self.income - self.expense
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(id: i64, tx_type: TxType, amount: &str) -> Transaction {
        Transaction {
            id,
            tx_type,
            amount: amount.to_string(),
            date: "2024-05-10".into(),
            description: String::new(),
            category: None,
            category_name: None,
            created_at: "2024-05-10T12:00:00Z".into(),
        }
    }

    #[test]
    fn test_parse_transaction() {
        let json = r#"{"id": 3, "type": "OUT", "amount": "14.99", "date": "2024-05-02", "description": "Padaria", "category": 2, "category_name": "Mercado", "created_at": "2024-05-02T10:00:00Z"}"#;
        let t: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(t.tx_type, TxType::Expense);
        assert_eq!(t.amount_cents(), Some(1499));
        assert_eq!(t.category_name.as_deref(), Some("Mercado"));
    }

    #[test]
    fn test_new_transaction_serializes_type_field() {
        let new = NewTransaction {
            tx_type: TxType::Income,
            amount: "1200.00".into(),
            date: "2024-05-05".into(),
            description: "Salário".into(),
            category: None,
        };
        let value = serde_json::to_value(&new).unwrap();
        assert_eq!(value["type"], "IN");
        assert!(value["category"].is_null());
    }

    #[test]
    fn test_tx_type_from_str() {
        assert_eq!("in".parse::<TxType>().unwrap(), TxType::Income);
        assert_eq!("Expense".parse::<TxType>().unwrap(), TxType::Expense);
        assert!("transfer".parse::<TxType>().is_err());
    }

    #[test]
    fn test_filter_query_pairs() {
        let filter = TransactionFilter::month("2024-05").with_type(TxType::Expense).with_category(4);
        assert_eq!(
            filter.query_pairs(),
            vec![
                ("month", "2024-05".to_string()),
                ("type", "OUT".to_string()),
                ("category", "4".to_string()),
                ("ordering", "-date,-id".to_string()),
            ]
        );
        assert_eq!(TransactionFilter::month("2024-01").query_pairs().len(), 2);
    }

    #[test]
    fn test_totals() {
        let txs = vec![
            tx(1, TxType::Income, "1000.00"),
            tx(2, TxType::Expense, "250.50"),
            tx(3, TxType::Expense, "49.50"),
            tx(4, TxType::Expense, "garbage"),
        ];
        let totals = Totals::from_transactions(&txs);
        assert_eq!(totals.income, 100_000);
        assert_eq!(totals.expense, 30_000);
        assert_eq!(totals.balance(), 70_000);
    }
}
