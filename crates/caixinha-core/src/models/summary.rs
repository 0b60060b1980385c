use serde::{Deserialize, Serialize};

use super::TxType;
use crate::utils::parse_cents;

/// Label used for totals without a category
pub const UNCATEGORIZED: &str = "Sem categoria";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// YYYY-MM
    pub month: String,
    pub income: String,
    pub expense: String,
    pub balance_month: String,
    pub balance_total: String,
    #[serde(default)]
    pub by_category: Vec<CategoryTotal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    #[serde(rename = "category__id")]
    pub category_id: Option<i64>,
    #[serde(rename = "category__name")]
    pub category_name: Option<String>,
    #[serde(rename = "type")]
    pub tx_type: TxType,
    pub total: String,
}

impl CategoryTotal {
    pub fn display_name(&self) -> &str {
        self.category_name.as_deref().unwrap_or(UNCATEGORIZED)
    }
}

impl Summary {
    /// Expense categories with the largest totals first
    pub fn top_expenses(&self, limit: usize) -> Vec<(&str, i64)> {
        let mut out: Vec<(&str, i64)> = self
            .by_category
            .iter()
            .filter(|c| c.tx_type == TxType::Expense)
            .map(|c| (c.display_name(), parse_cents(&c.total).unwrap_or(0)))
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1));
        out.truncate(limit);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_summary_and_top_expenses() {
        let json = r#"{
            "month": "2024-05",
            "income": "5000.00",
            "expense": "1830.40",
            "balance_month": "3169.60",
            "balance_total": "10450.00",
            "by_category": [
                {"category__id": 1, "category__name": "Mercado", "type": "OUT", "total": "830.40"},
                {"category__id": null, "category__name": null, "type": "OUT", "total": "1000.00"},
                {"category__id": 2, "category__name": "Salário", "type": "IN", "total": "5000.00"}
            ]
        }"#;
        let summary: Summary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.by_category.len(), 3);

        let top = summary.top_expenses(5);
        assert_eq!(top, vec![(UNCATEGORIZED, 100_000), ("Mercado", 83_040)]);
        assert_eq!(summary.top_expenses(1).len(), 1);
    }
}
