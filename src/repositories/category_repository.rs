use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::category::{Category, TransactionType};
use crate::repositories::RepositoryError;

/// Trait defining category repository operations
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a new category
    async fn create(&self, category: Category) -> Result<Category, RepositoryError>;

    /// Insert several categories at once (used to seed defaults)
    async fn create_many(&self, categories: Vec<Category>) -> Result<(), RepositoryError>;

    /// Find a category by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepositoryError>;

    /// Find every category whose ID is in `ids`
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Category>, RepositoryError>;

    /// Find a user's category by name and type
    async fn find_by_name(
        &self,
        user_id: Uuid,
        name: &str,
        category_type: TransactionType,
    ) -> Result<Option<Category>, RepositoryError>;

    /// Find all of a user's categories ordered by name, optionally of one type
    async fn find_by_user(
        &self,
        user_id: Uuid,
        category_type: Option<TransactionType>,
    ) -> Result<Vec<Category>, RepositoryError>;

    /// Persist changes to name, color and icon
    async fn update(&self, category: Category) -> Result<Category, RepositoryError>;

    /// Delete a category by ID
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    category_type: String,
    color: String,
    icon: Option<String>,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CategoryRow> for Category {
    type Error = RepositoryError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        let category_type = TransactionType::from_db_string(&row.category_type).ok_or_else(|| {
            RepositoryError::DatabaseError(format!(
                "Unknown category type '{}'",
                row.category_type
            ))
        })?;

        Ok(Category {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            category_type,
            color: row.color,
            icon: row.icon,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_categories(rows: Vec<CategoryRow>) -> Result<Vec<Category>, RepositoryError> {
    rows.into_iter().map(Category::try_from).collect()
}

const CATEGORY_COLUMNS: &str =
    "id, user_id, name, category_type, color, icon, is_default, created_at, updated_at";

/// PostgreSQL implementation of CategoryRepository
pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn create(&self, category: Category) -> Result<Category, RepositoryError> {
        let query = format!(
            r#"
            INSERT INTO categories
                (id, user_id, name, category_type, color, icon, is_default, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {CATEGORY_COLUMNS}
            "#
        );

        let result = sqlx::query_as::<_, CategoryRow>(&query)
            .bind(category.id)
            .bind(category.user_id)
            .bind(&category.name)
            .bind(category.category_type.to_db_string())
            .bind(&category.color)
            .bind(&category.icon)
            .bind(category.is_default)
            .bind(category.created_at)
            .bind(category.updated_at)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => row.try_into(),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(RepositoryError::ConstraintViolation(
                    "Category with this name already exists for user".to_string(),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create_many(&self, categories: Vec<Category>) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for category in &categories {
            sqlx::query(
                r#"
                INSERT INTO categories
                    (id, user_id, name, category_type, color, icon, is_default, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(category.id)
            .bind(category.user_id)
            .bind(&category.name)
            .bind(category.category_type.to_db_string())
            .bind(&category.color)
            .bind(&category.icon)
            .bind(category.is_default)
            .bind(category.created_at)
            .bind(category.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepositoryError> {
        let query = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");

        sqlx::query_as::<_, CategoryRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Category::try_from)
            .transpose()
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Category>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ANY($1)");

        let rows = sqlx::query_as::<_, CategoryRow>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        into_categories(rows)
    }

    async fn find_by_name(
        &self,
        user_id: Uuid,
        name: &str,
        category_type: TransactionType,
    ) -> Result<Option<Category>, RepositoryError> {
        let query = format!(
            r#"
            SELECT {CATEGORY_COLUMNS}
            FROM categories
            WHERE user_id = $1 AND name = $2 AND category_type = $3
            "#
        );

        sqlx::query_as::<_, CategoryRow>(&query)
            .bind(user_id)
            .bind(name)
            .bind(category_type.to_db_string())
            .fetch_optional(&self.pool)
            .await?
            .map(Category::try_from)
            .transpose()
    }

    async fn find_by_user(
        &self,
        user_id: Uuid,
        category_type: Option<TransactionType>,
    ) -> Result<Vec<Category>, RepositoryError> {
        let query = format!(
            r#"
            SELECT {CATEGORY_COLUMNS}
            FROM categories
            WHERE user_id = $1 AND ($2::varchar IS NULL OR category_type = $2)
            ORDER BY name ASC
            "#
        );

        let rows = sqlx::query_as::<_, CategoryRow>(&query)
            .bind(user_id)
            .bind(category_type.map(|t| t.to_db_string()))
            .fetch_all(&self.pool)
            .await?;

        into_categories(rows)
    }

    async fn update(&self, category: Category) -> Result<Category, RepositoryError> {
        let query = format!(
            r#"
            UPDATE categories
            SET name = $2, color = $3, icon = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {CATEGORY_COLUMNS}
            "#
        );

        let result = sqlx::query_as::<_, CategoryRow>(&query)
            .bind(category.id)
            .bind(&category.name)
            .bind(&category.color)
            .bind(&category.icon)
            .fetch_optional(&self.pool)
            .await;

        match result {
            Ok(Some(row)) => row.try_into(),
            Ok(None) => Err(RepositoryError::NotFound),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(RepositoryError::ConstraintViolation(
                    "Category with this name already exists for user".to_string(),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }
}
