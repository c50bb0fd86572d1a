//! Reporting over a user's income and expenses.
//!
//! The aggregation itself lives in plain functions that work on already
//! fetched records, so the service methods only gather data and delegate.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::analytics::{CategoryBreakdown, HistoryBucket, HistoryPeriod, Summary};
use crate::models::category::{Category, TransactionType};
use crate::models::filters::{DateRange, InvalidDate, TransactionFilters};
use crate::models::transaction::{Transaction, TransactionDetails};
use crate::repositories::RepositoryError;
use crate::repositories::category_repository::CategoryRepository;
use crate::repositories::transaction_repository::{CategoryTotal, TransactionRepository};
use crate::services::transaction_service::sort_newest_first;

/// Number of records returned by the recent activity feed
pub const RECENT_LIMIT: usize = 5;

const UNKNOWN_CATEGORY_NAME: &str = "Unknown";
const UNKNOWN_CATEGORY_COLOR: &str = "#ccc";

/// Analytics service errors
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("Invalid date format")]
    InvalidDate,

    #[error("startDate and endDate are required")]
    MissingDateRange,

    #[error("type must be income or expense")]
    MissingType,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<InvalidDate> for AnalyticsError {
    fn from(_: InvalidDate) -> Self {
        AnalyticsError::InvalidDate
    }
}

impl From<RepositoryError> for AnalyticsError {
    fn from(e: RepositoryError) -> Self {
        AnalyticsError::DatabaseError(e.to_string())
    }
}

/// Trait defining the reporting operations
#[async_trait]
pub trait AnalyticsService: Send + Sync {
    /// Income, expense and savings totals for an inclusive range
    async fn summary(&self, user_id: Uuid, range: DateRange) -> Result<Summary, AnalyticsError>;

    /// Per-category sums for one kind, largest first
    async fn categories(
        &self,
        user_id: Uuid,
        kind: TransactionType,
        range: DateRange,
    ) -> Result<Vec<CategoryBreakdown>, AnalyticsError>;

    /// Gap-free income/expense series over a trailing window ending now
    async fn history(
        &self,
        user_id: Uuid,
        period: HistoryPeriod,
    ) -> Result<Vec<HistoryBucket>, AnalyticsError>;

    /// Latest records across income and expenses
    async fn recent(&self, user_id: Uuid) -> Result<Vec<TransactionDetails>, AnalyticsError>;
}

/// Implementation of AnalyticsService
pub struct AnalyticsServiceImpl {
    transaction_repository: Arc<dyn TransactionRepository>,
    category_repository: Arc<dyn CategoryRepository>,
}

impl AnalyticsServiceImpl {
    pub fn new(
        transaction_repository: Arc<dyn TransactionRepository>,
        category_repository: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self {
            transaction_repository,
            category_repository,
        }
    }

    async fn history_at(
        &self,
        user_id: Uuid,
        period: HistoryPeriod,
        now: DateTime<Utc>,
    ) -> Result<Vec<HistoryBucket>, AnalyticsError> {
        let filters = TransactionFilters {
            since: Some(window_start(period, now)),
            ..Default::default()
        };

        let income = self
            .transaction_repository
            .find_by_user(TransactionType::Income, user_id, filters.clone())
            .await?;
        let expenses = self
            .transaction_repository
            .find_by_user(TransactionType::Expense, user_id, filters)
            .await?;

        Ok(build_history(period, now, &income, &expenses))
    }
}

/// Totals and savings rate; the rate is zero without income
pub fn summarize(total_income: Decimal, total_expenses: Decimal) -> Summary {
    let net_balance = total_income - total_expenses;
    let savings_rate = if total_income > Decimal::ZERO {
        (net_balance / total_income * Decimal::ONE_HUNDRED).normalize()
    } else {
        Decimal::ZERO
    };

    Summary {
        total_income,
        total_expenses,
        net_balance,
        savings_rate,
    }
}

/// Join per-category totals with display metadata and order by value descending.
///
/// Totals whose category cannot be found are labelled "Unknown".
pub fn rank_categories(
    totals: Vec<CategoryTotal>,
    categories: &[Category],
) -> Vec<CategoryBreakdown> {
    let by_id: HashMap<Uuid, &Category> = categories.iter().map(|c| (c.id, c)).collect();

    let mut breakdown: Vec<CategoryBreakdown> = totals
        .into_iter()
        .map(|total| {
            let category = by_id.get(&total.category_id);
            CategoryBreakdown {
                category_id: total.category_id,
                name: category
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| UNKNOWN_CATEGORY_NAME.to_string()),
                color: category
                    .map(|c| c.color.clone())
                    .unwrap_or_else(|| UNKNOWN_CATEGORY_COLOR.to_string()),
                value: total.total,
            }
        })
        .collect();

    breakdown.sort_by(|a, b| b.value.cmp(&a.value));
    breakdown
}

/// First instant counted by a history window ending at `now`
pub fn window_start(period: HistoryPeriod, now: DateTime<Utc>) -> DateTime<Utc> {
    match period {
        HistoryPeriod::SevenDays => now - Duration::days(7),
        HistoryPeriod::ThirtyDays => now - Duration::days(30),
        HistoryPeriod::OneYear => now
            .checked_sub_months(Months::new(12))
            .unwrap_or(now - Duration::days(365)),
    }
}

fn bucket_key(period: HistoryPeriod, date: DateTime<Utc>) -> String {
    match period {
        HistoryPeriod::OneYear => date.format("%Y-%m").to_string(),
        _ => date.format("%Y-%m-%d").to_string(),
    }
}

/// Every bucket key from the window start through `now`, inclusive
fn bucket_keys(period: HistoryPeriod, now: DateTime<Utc>) -> Vec<String> {
    let start = window_start(period, now).date_naive();
    let end = now.date_naive();

    let mut cursor: NaiveDate = match period {
        HistoryPeriod::OneYear => start.with_day(1).unwrap_or(start),
        _ => start,
    };

    let mut keys = Vec::new();
    while cursor <= end {
        let next = match period {
            HistoryPeriod::OneYear => {
                keys.push(cursor.format("%Y-%m").to_string());
                cursor.checked_add_months(Months::new(1))
            }
            _ => {
                keys.push(cursor.format("%Y-%m-%d").to_string());
                cursor.succ_opt()
            }
        };
        match next {
            Some(next) => cursor = next,
            None => break,
        }
    }
    keys
}

/// Build the zero-filled series for `period`, ascending by bucket.
///
/// Records dated before the window start or outside every bucket are ignored.
pub fn build_history(
    period: HistoryPeriod,
    now: DateTime<Utc>,
    income: &[Transaction],
    expenses: &[Transaction],
) -> Vec<HistoryBucket> {
    let start = window_start(period, now);
    let mut buckets: BTreeMap<String, (Decimal, Decimal)> = bucket_keys(period, now)
        .into_iter()
        .map(|key| (key, (Decimal::ZERO, Decimal::ZERO)))
        .collect();

    for record in income.iter().filter(|t| t.date >= start) {
        if let Some(bucket) = buckets.get_mut(&bucket_key(period, record.date)) {
            bucket.0 += record.amount;
        }
    }
    for record in expenses.iter().filter(|t| t.date >= start) {
        if let Some(bucket) = buckets.get_mut(&bucket_key(period, record.date)) {
            bucket.1 += record.amount;
        }
    }

    buckets
        .into_iter()
        .map(|(date, (income, expense))| HistoryBucket {
            date,
            income,
            expense,
        })
        .collect()
}

/// Merge two newest-first lists and keep the `limit` most recent overall
pub fn merge_recent(
    income: Vec<Transaction>,
    expenses: Vec<Transaction>,
    limit: usize,
) -> Vec<Transaction> {
    let mut merged = income;
    merged.extend(expenses);
    sort_newest_first(&mut merged);
    merged.truncate(limit);
    merged
}

#[async_trait]
impl AnalyticsService for AnalyticsServiceImpl {
    async fn summary(&self, user_id: Uuid, range: DateRange) -> Result<Summary, AnalyticsError> {
        let total_income = self
            .transaction_repository
            .sum_amount(TransactionType::Income, user_id, range)
            .await?;
        let total_expenses = self
            .transaction_repository
            .sum_amount(TransactionType::Expense, user_id, range)
            .await?;

        Ok(summarize(total_income, total_expenses))
    }

    async fn categories(
        &self,
        user_id: Uuid,
        kind: TransactionType,
        range: DateRange,
    ) -> Result<Vec<CategoryBreakdown>, AnalyticsError> {
        let totals = self
            .transaction_repository
            .sum_by_category(kind, user_id, range)
            .await?;

        let ids: Vec<Uuid> = totals.iter().map(|t| t.category_id).collect();
        let categories = self.category_repository.find_by_ids(&ids).await?;

        Ok(rank_categories(totals, &categories))
    }

    async fn history(
        &self,
        user_id: Uuid,
        period: HistoryPeriod,
    ) -> Result<Vec<HistoryBucket>, AnalyticsError> {
        self.history_at(user_id, period, Utc::now()).await
    }

    async fn recent(&self, user_id: Uuid) -> Result<Vec<TransactionDetails>, AnalyticsError> {
        let filters = TransactionFilters {
            limit: Some(RECENT_LIMIT as i64),
            ..Default::default()
        };

        let income = self
            .transaction_repository
            .find_by_user(TransactionType::Income, user_id, filters.clone())
            .await?;
        let expenses = self
            .transaction_repository
            .find_by_user(TransactionType::Expense, user_id, filters)
            .await?;
        let recent = merge_recent(income, expenses, RECENT_LIMIT);

        let ids: Vec<Uuid> = recent.iter().map(|t| t.category_id).collect();
        let categories: HashMap<Uuid, Category> = self
            .category_repository
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        Ok(recent
            .into_iter()
            .map(|transaction| TransactionDetails {
                category: categories.get(&transaction.category_id).cloned(),
                subcategory: None,
                transaction,
            })
            .collect())
    }
}
