use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::category::TransactionType;
use crate::models::filters::{DateRange, TransactionFilters};
use crate::models::transaction::{IncomeFrequency, PaymentMethod, Transaction};
use crate::repositories::RepositoryError;

/// Summed amount of one category's records
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category_id: Uuid,
    pub total: Decimal,
}

/// Trait defining income/expense repository operations.
///
/// Every operation is dispatched on the record kind; income and expenses are
/// stored separately.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Create a new record
    async fn create(&self, transaction: Transaction) -> Result<Transaction, RepositoryError>;

    /// Update an existing record
    async fn update(&self, transaction: Transaction) -> Result<Transaction, RepositoryError>;

    /// Find a record by ID
    async fn find_by_id(
        &self,
        kind: TransactionType,
        id: Uuid,
    ) -> Result<Option<Transaction>, RepositoryError>;

    /// Find a user's records with optional filters, sorted by date descending
    async fn find_by_user(
        &self,
        kind: TransactionType,
        user_id: Uuid,
        filters: TransactionFilters,
    ) -> Result<Vec<Transaction>, RepositoryError>;

    /// Delete a record by ID
    async fn delete(&self, kind: TransactionType, id: Uuid) -> Result<(), RepositoryError>;

    /// Sum of amounts within an inclusive date range
    async fn sum_amount(
        &self,
        kind: TransactionType,
        user_id: Uuid,
        range: DateRange,
    ) -> Result<Decimal, RepositoryError>;

    /// Sum amounts per category within an inclusive date range
    async fn sum_by_category(
        &self,
        kind: TransactionType,
        user_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<CategoryTotal>, RepositoryError>;

    /// Count income and expense records referencing a category
    async fn count_by_category(&self, category_id: Uuid) -> Result<i64, RepositoryError>;

    /// Count income and expense records referencing a subcategory
    async fn count_by_subcategory(&self, subcategory_id: Uuid) -> Result<i64, RepositoryError>;
}

fn table_name(kind: TransactionType) -> &'static str {
    match kind {
        TransactionType::Income => "income",
        TransactionType::Expense => "expenses",
    }
}

fn tag_column(kind: TransactionType) -> &'static str {
    match kind {
        TransactionType::Income => "frequency",
        TransactionType::Expense => "payment_method",
    }
}

fn select_columns(kind: TransactionType) -> String {
    format!(
        "id, user_id, category_id, subcategory_id, name, amount, date, {} AS tag, notes, created_at, updated_at",
        tag_column(kind)
    )
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    user_id: Uuid,
    category_id: Uuid,
    subcategory_id: Option<Uuid>,
    name: String,
    amount: Decimal,
    date: DateTime<Utc>,
    tag: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_transaction(self, kind: TransactionType) -> Transaction {
        let (frequency, payment_method) = match kind {
            TransactionType::Income => (IncomeFrequency::from_db_string(&self.tag), None),
            TransactionType::Expense => (None, PaymentMethod::from_db_string(&self.tag)),
        };

        Transaction {
            id: self.id,
            user_id: self.user_id,
            kind,
            category_id: self.category_id,
            subcategory_id: self.subcategory_id,
            name: self.name,
            amount: self.amount,
            date: self.date,
            frequency,
            payment_method,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn tag_value(transaction: &Transaction) -> &'static str {
    match transaction.kind {
        TransactionType::Income => transaction.frequency.unwrap_or_default().to_db_string(),
        TransactionType::Expense => transaction.payment_method.unwrap_or_default().to_db_string(),
    }
}

/// PostgreSQL implementation of TransactionRepository
pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn create(&self, transaction: Transaction) -> Result<Transaction, RepositoryError> {
        let kind = transaction.kind;
        let query = format!(
            r#"
            INSERT INTO {table} (
                id, user_id, category_id, subcategory_id, name, amount, date,
                {tag}, notes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {columns}
            "#,
            table = table_name(kind),
            tag = tag_column(kind),
            columns = select_columns(kind),
        );

        let row = sqlx::query_as::<_, TransactionRow>(&query)
            .bind(transaction.id)
            .bind(transaction.user_id)
            .bind(transaction.category_id)
            .bind(transaction.subcategory_id)
            .bind(&transaction.name)
            .bind(transaction.amount)
            .bind(transaction.date)
            .bind(tag_value(&transaction))
            .bind(&transaction.notes)
            .bind(transaction.created_at)
            .bind(transaction.updated_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into_transaction(kind))
    }

    async fn update(&self, transaction: Transaction) -> Result<Transaction, RepositoryError> {
        let kind = transaction.kind;
        let query = format!(
            r#"
            UPDATE {table}
            SET category_id = $2,
                subcategory_id = $3,
                name = $4,
                amount = $5,
                date = $6,
                {tag} = $7,
                notes = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {columns}
            "#,
            table = table_name(kind),
            tag = tag_column(kind),
            columns = select_columns(kind),
        );

        let row = sqlx::query_as::<_, TransactionRow>(&query)
            .bind(transaction.id)
            .bind(transaction.category_id)
            .bind(transaction.subcategory_id)
            .bind(&transaction.name)
            .bind(transaction.amount)
            .bind(transaction.date)
            .bind(tag_value(&transaction))
            .bind(&transaction.notes)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(row.into_transaction(kind))
    }

    async fn find_by_id(
        &self,
        kind: TransactionType,
        id: Uuid,
    ) -> Result<Option<Transaction>, RepositoryError> {
        let query = format!(
            "SELECT {} FROM {} WHERE id = $1",
            select_columns(kind),
            table_name(kind)
        );

        let row = sqlx::query_as::<_, TransactionRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.into_transaction(kind)))
    }

    async fn find_by_user(
        &self,
        kind: TransactionType,
        user_id: Uuid,
        filters: TransactionFilters,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        // Build dynamic SQL query based on provided filters
        let mut query = format!(
            "SELECT {} FROM {} WHERE user_id = $1",
            select_columns(kind),
            table_name(kind)
        );

        let mut param_count = 1;
        let mut conditions = Vec::new();

        // Inclusive on both ends
        if filters.date_range.is_some() {
            param_count += 1;
            let start_param = param_count;
            param_count += 1;
            let end_param = param_count;
            conditions.push(format!("date BETWEEN ${} AND ${}", start_param, end_param));
        }

        if filters.since.is_some() {
            param_count += 1;
            conditions.push(format!("date >= ${}", param_count));
        }

        if filters.category_id.is_some() {
            param_count += 1;
            conditions.push(format!("category_id = ${}", param_count));
        }

        // Payment method only exists on expenses
        let payment_method = filters
            .payment_method
            .filter(|_| kind == TransactionType::Expense);
        if payment_method.is_some() {
            param_count += 1;
            conditions.push(format!("payment_method = ${}", param_count));
        }

        if !conditions.is_empty() {
            query.push_str(" AND ");
            query.push_str(&conditions.join(" AND "));
        }

        query.push_str(" ORDER BY date DESC, created_at DESC");

        if filters.limit.is_some() {
            param_count += 1;
            query.push_str(&format!(" LIMIT ${}", param_count));
        }

        // Bind parameters in the same order the placeholders were numbered
        let mut sqlx_query = sqlx::query_as::<_, TransactionRow>(&query).bind(user_id);

        if let Some(range) = filters.date_range {
            sqlx_query = sqlx_query.bind(range.start).bind(range.end);
        }

        if let Some(since) = filters.since {
            sqlx_query = sqlx_query.bind(since);
        }

        if let Some(category_id) = filters.category_id {
            sqlx_query = sqlx_query.bind(category_id);
        }

        if let Some(method) = payment_method {
            sqlx_query = sqlx_query.bind(method.to_db_string());
        }

        if let Some(limit) = filters.limit {
            sqlx_query = sqlx_query.bind(limit);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(|r| r.into_transaction(kind)).collect())
    }

    async fn delete(&self, kind: TransactionType, id: Uuid) -> Result<(), RepositoryError> {
        let query = format!("DELETE FROM {} WHERE id = $1", table_name(kind));

        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }

    async fn sum_amount(
        &self,
        kind: TransactionType,
        user_id: Uuid,
        range: DateRange,
    ) -> Result<Decimal, RepositoryError> {
        let query = format!(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM {}
            WHERE user_id = $1 AND date BETWEEN $2 AND $3
            "#,
            table_name(kind)
        );

        let total = sqlx::query_scalar::<_, Decimal>(&query)
            .bind(user_id)
            .bind(range.start)
            .bind(range.end)
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    async fn sum_by_category(
        &self,
        kind: TransactionType,
        user_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<CategoryTotal>, RepositoryError> {
        let query = format!(
            r#"
            SELECT category_id, SUM(amount) AS total
            FROM {}
            WHERE user_id = $1 AND date BETWEEN $2 AND $3
            GROUP BY category_id
            "#,
            table_name(kind)
        );

        let rows = sqlx::query_as::<_, (Uuid, Decimal)>(&query)
            .bind(user_id)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(category_id, total)| CategoryTotal { category_id, total })
            .collect())
    }

    async fn count_by_category(&self, category_id: Uuid) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT (SELECT COUNT(*) FROM income WHERE category_id = $1)
                 + (SELECT COUNT(*) FROM expenses WHERE category_id = $1)
            "#,
        )
        .bind(category_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_by_subcategory(&self, subcategory_id: Uuid) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT (SELECT COUNT(*) FROM income WHERE subcategory_id = $1)
                 + (SELECT COUNT(*) FROM expenses WHERE subcategory_id = $1)
            "#,
        )
        .bind(subcategory_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
