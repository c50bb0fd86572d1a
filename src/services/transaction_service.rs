use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::category::{Category, TransactionType};
use crate::models::filters::{DateRange, InvalidDate, TransactionFilters, parse_instant};
use crate::models::subcategory::Subcategory;
use crate::models::transaction::{
    NewTransaction, Transaction, TransactionChanges, TransactionDetails,
};
use crate::repositories::RepositoryError;
use crate::repositories::category_repository::CategoryRepository;
use crate::repositories::subcategory_repository::SubcategoryRepository;
use crate::repositories::transaction_repository::TransactionRepository;

/// Transaction service errors
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("{} not found", .0.label())]
    NotFound(TransactionType),

    #[error("Invalid {} category", .0.to_db_string())]
    InvalidCategory(TransactionType),

    #[error("Subcategory does not belong to the selected category")]
    InvalidSubcategory,

    #[error("Invalid date format")]
    InvalidDate,

    #[error("startDate and endDate are required")]
    MissingDateRange,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<InvalidDate> for TransactionError {
    fn from(_: InvalidDate) -> Self {
        TransactionError::InvalidDate
    }
}

impl From<RepositoryError> for TransactionError {
    fn from(e: RepositoryError) -> Self {
        TransactionError::DatabaseError(e.to_string())
    }
}

/// Trait defining income and expense operations
#[async_trait]
pub trait TransactionService: Send + Sync {
    /// Record income or an expense, depending on `new.kind`
    async fn create_transaction(
        &self,
        user_id: Uuid,
        new: NewTransaction,
    ) -> Result<TransactionDetails, TransactionError>;

    async fn get_transaction(
        &self,
        user_id: Uuid,
        kind: TransactionType,
        id: Uuid,
    ) -> Result<TransactionDetails, TransactionError>;

    /// List a user's records of one kind, most recent first
    async fn list_transactions(
        &self,
        user_id: Uuid,
        kind: TransactionType,
        filters: TransactionFilters,
    ) -> Result<Vec<TransactionDetails>, TransactionError>;

    /// Apply the provided fields to an existing record
    async fn update_transaction(
        &self,
        user_id: Uuid,
        kind: TransactionType,
        id: Uuid,
        changes: TransactionChanges,
    ) -> Result<TransactionDetails, TransactionError>;

    /// Delete a record, returning what was removed
    async fn delete_transaction(
        &self,
        user_id: Uuid,
        kind: TransactionType,
        id: Uuid,
    ) -> Result<Transaction, TransactionError>;

    /// Income and expenses in `range`, merged by date descending
    async fn list_merged(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<TransactionDetails>, TransactionError>;
}

/// Implementation of TransactionService
pub struct TransactionServiceImpl {
    transaction_repository: Arc<dyn TransactionRepository>,
    category_repository: Arc<dyn CategoryRepository>,
    subcategory_repository: Arc<dyn SubcategoryRepository>,
}

impl TransactionServiceImpl {
    pub fn new(
        transaction_repository: Arc<dyn TransactionRepository>,
        category_repository: Arc<dyn CategoryRepository>,
        subcategory_repository: Arc<dyn SubcategoryRepository>,
    ) -> Self {
        Self {
            transaction_repository,
            category_repository,
            subcategory_repository,
        }
    }

    /// Category referenced by a request body must be the user's and of `kind`
    async fn checked_category(
        &self,
        user_id: Uuid,
        kind: TransactionType,
        category_id: Uuid,
    ) -> Result<Category, TransactionError> {
        self.category_repository
            .find_by_id(category_id)
            .await?
            .filter(|c| c.user_id == user_id && c.category_type == kind)
            .ok_or(TransactionError::InvalidCategory(kind))
    }

    async fn checked_subcategory(
        &self,
        category_id: Uuid,
        subcategory_id: Uuid,
    ) -> Result<Subcategory, TransactionError> {
        self.subcategory_repository
            .find_by_id(subcategory_id)
            .await?
            .filter(|s| s.category_id == category_id)
            .ok_or(TransactionError::InvalidSubcategory)
    }

    async fn owned_transaction(
        &self,
        user_id: Uuid,
        kind: TransactionType,
        id: Uuid,
    ) -> Result<Transaction, TransactionError> {
        self.transaction_repository
            .find_by_id(kind, id)
            .await?
            .filter(|t| t.user_id == user_id)
            .ok_or(TransactionError::NotFound(kind))
    }

    /// Attach categories and subcategories with one lookup each
    async fn resolve(
        &self,
        transactions: Vec<Transaction>,
    ) -> Result<Vec<TransactionDetails>, TransactionError> {
        let mut category_ids: Vec<Uuid> = transactions.iter().map(|t| t.category_id).collect();
        category_ids.sort();
        category_ids.dedup();

        let mut subcategory_ids: Vec<Uuid> =
            transactions.iter().filter_map(|t| t.subcategory_id).collect();
        subcategory_ids.sort();
        subcategory_ids.dedup();

        let categories: HashMap<Uuid, Category> = self
            .category_repository
            .find_by_ids(&category_ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let subcategories: HashMap<Uuid, Subcategory> = self
            .subcategory_repository
            .find_by_ids(&subcategory_ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        Ok(transactions
            .into_iter()
            .map(|transaction| TransactionDetails {
                category: categories.get(&transaction.category_id).cloned(),
                subcategory: transaction
                    .subcategory_id
                    .and_then(|id| subcategories.get(&id).cloned()),
                transaction,
            })
            .collect())
    }

    async fn resolve_one(
        &self,
        transaction: Transaction,
    ) -> Result<TransactionDetails, TransactionError> {
        let mut details = self.resolve(vec![transaction]).await?;
        details
            .pop()
            .ok_or_else(|| TransactionError::DatabaseError("Failed to resolve record".to_string()))
    }
}

/// Sort by date descending, newest creation first on equal dates
pub fn sort_newest_first(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

#[async_trait]
impl TransactionService for TransactionServiceImpl {
    async fn create_transaction(
        &self,
        user_id: Uuid,
        new: NewTransaction,
    ) -> Result<TransactionDetails, TransactionError> {
        let date = parse_instant(&new.date).ok_or(TransactionError::InvalidDate)?;
        let category = self
            .checked_category(user_id, new.kind, new.category_id)
            .await?;
        let subcategory = match new.subcategory_id {
            Some(id) => Some(self.checked_subcategory(category.id, id).await?),
            None => None,
        };

        let now = Utc::now();
        let transaction = Transaction {
            id: Uuid::new_v4(),
            user_id,
            kind: new.kind,
            category_id: category.id,
            subcategory_id: subcategory.as_ref().map(|s| s.id),
            name: new.name.trim().to_string(),
            amount: new.amount,
            date,
            frequency: new.frequency.filter(|_| new.kind == TransactionType::Income),
            payment_method: new
                .payment_method
                .filter(|_| new.kind == TransactionType::Expense),
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };

        let transaction = self.transaction_repository.create(transaction).await?;
        tracing::debug!(
            %user_id,
            id = %transaction.id,
            kind = ?transaction.kind,
            "recorded transaction"
        );

        Ok(TransactionDetails {
            transaction,
            category: Some(category),
            subcategory,
        })
    }

    async fn get_transaction(
        &self,
        user_id: Uuid,
        kind: TransactionType,
        id: Uuid,
    ) -> Result<TransactionDetails, TransactionError> {
        let transaction = self.owned_transaction(user_id, kind, id).await?;
        self.resolve_one(transaction).await
    }

    async fn list_transactions(
        &self,
        user_id: Uuid,
        kind: TransactionType,
        filters: TransactionFilters,
    ) -> Result<Vec<TransactionDetails>, TransactionError> {
        let transactions = self
            .transaction_repository
            .find_by_user(kind, user_id, filters)
            .await?;
        self.resolve(transactions).await
    }

    async fn update_transaction(
        &self,
        user_id: Uuid,
        kind: TransactionType,
        id: Uuid,
        changes: TransactionChanges,
    ) -> Result<TransactionDetails, TransactionError> {
        let mut transaction = self.owned_transaction(user_id, kind, id).await?;

        if let Some(date) = changes.date {
            transaction.date = parse_instant(&date).ok_or(TransactionError::InvalidDate)?;
        }

        if let Some(category_id) = changes.category_id {
            let category = self.checked_category(user_id, kind, category_id).await?;
            if category.id != transaction.category_id {
                // The old subcategory belongs to the old category
                transaction.subcategory_id = None;
            }
            transaction.category_id = category.id;
        }

        if let Some(subcategory_id) = changes.subcategory_id {
            let subcategory = self
                .checked_subcategory(transaction.category_id, subcategory_id)
                .await?;
            transaction.subcategory_id = Some(subcategory.id);
        }

        if let Some(name) = changes.name {
            transaction.name = name.trim().to_string();
        }
        if let Some(amount) = changes.amount {
            transaction.amount = amount;
        }
        if kind == TransactionType::Income && changes.frequency.is_some() {
            transaction.frequency = changes.frequency;
        }
        if kind == TransactionType::Expense && changes.payment_method.is_some() {
            transaction.payment_method = changes.payment_method;
        }
        if changes.notes.is_some() {
            transaction.notes = changes.notes;
        }
        transaction.updated_at = Utc::now();

        let transaction = self
            .transaction_repository
            .update(transaction)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => TransactionError::NotFound(kind),
                e => e.into(),
            })?;
        self.resolve_one(transaction).await
    }

    async fn delete_transaction(
        &self,
        user_id: Uuid,
        kind: TransactionType,
        id: Uuid,
    ) -> Result<Transaction, TransactionError> {
        let transaction = self.owned_transaction(user_id, kind, id).await?;

        self.transaction_repository
            .delete(kind, id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => TransactionError::NotFound(kind),
                e => e.into(),
            })?;

        Ok(transaction)
    }

    async fn list_merged(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<TransactionDetails>, TransactionError> {
        let filters = TransactionFilters {
            date_range: Some(range),
            ..Default::default()
        };

        let mut merged = self
            .transaction_repository
            .find_by_user(TransactionType::Income, user_id, filters.clone())
            .await?;
        merged.extend(
            self.transaction_repository
                .find_by_user(TransactionType::Expense, user_id, filters)
                .await?,
        );
        sort_newest_first(&mut merged);

        self.resolve(merged).await
    }
}
