use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::category::TransactionType;

/// Totals for a date range
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "totalIncome": "1000",
    "totalExpenses": "400",
    "netBalance": "600",
    "savingsRate": "60"
}))]
pub struct Summary {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub net_balance: Decimal,
    /// Net balance as a percentage of income; zero when there is no income
    pub savings_rate: Decimal,
}

/// Summed amount for one category over a date range
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub category_id: Uuid,
    pub name: String,
    pub color: String,
    pub value: Decimal,
}

/// Trailing window for the income/expense history chart
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Default)]
pub enum HistoryPeriod {
    #[serde(rename = "7d")]
    SevenDays,
    #[default]
    #[serde(rename = "30d")]
    ThirtyDays,
    #[serde(rename = "1y")]
    OneYear,
}

/// One bucket of the history series; `date` is `YYYY-MM-DD` or `YYYY-MM`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct HistoryBucket {
    pub date: String,
    pub income: Decimal,
    pub expense: Decimal,
}

/// Query string for the category breakdown endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAnalyticsQuery {
    #[serde(rename = "type")]
    pub category_type: Option<TransactionType>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Query string for the history endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub period: Option<HistoryPeriod>,
}
