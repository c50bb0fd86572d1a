use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::subcategory::Subcategory;
use crate::repositories::RepositoryError;

/// Trait defining subcategory repository operations
#[async_trait]
pub trait SubcategoryRepository: Send + Sync {
    /// Create a new subcategory
    async fn create(&self, subcategory: Subcategory) -> Result<Subcategory, RepositoryError>;

    /// Find a subcategory by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subcategory>, RepositoryError>;

    /// Find every subcategory whose ID is in `ids`
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Subcategory>, RepositoryError>;

    /// Find a subcategory by name under one parent category
    async fn find_by_name(
        &self,
        category_id: Uuid,
        name: &str,
    ) -> Result<Option<Subcategory>, RepositoryError>;

    /// Find all subcategories of the given categories, ordered by name
    async fn find_by_categories(
        &self,
        category_ids: &[Uuid],
    ) -> Result<Vec<Subcategory>, RepositoryError>;

    /// Count subcategories nested under a category
    async fn count_by_category(&self, category_id: Uuid) -> Result<i64, RepositoryError>;

    /// Persist a new name
    async fn update(&self, subcategory: Subcategory) -> Result<Subcategory, RepositoryError>;

    /// Delete a subcategory by ID
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// PostgreSQL implementation of SubcategoryRepository
pub struct PostgresSubcategoryRepository {
    pool: PgPool,
}

impl PostgresSubcategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SubcategoryRow {
    id: Uuid,
    category_id: Uuid,
    name: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<SubcategoryRow> for Subcategory {
    fn from(row: SubcategoryRow) -> Self {
        Subcategory {
            id: row.id,
            category_id: row.category_id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl SubcategoryRepository for PostgresSubcategoryRepository {
    async fn create(&self, subcategory: Subcategory) -> Result<Subcategory, RepositoryError> {
        let result = sqlx::query_as::<_, SubcategoryRow>(
            r#"
            INSERT INTO subcategories (id, category_id, name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, category_id, name, created_at, updated_at
            "#,
        )
        .bind(subcategory.id)
        .bind(subcategory.category_id)
        .bind(&subcategory.name)
        .bind(subcategory.created_at)
        .bind(subcategory.updated_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row.into()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(RepositoryError::ConstraintViolation(
                    "Subcategory with this name already exists".to_string(),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subcategory>, RepositoryError> {
        let row = sqlx::query_as::<_, SubcategoryRow>(
            r#"
            SELECT id, category_id, name, created_at, updated_at
            FROM subcategories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Subcategory::from))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Subcategory>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, SubcategoryRow>(
            r#"
            SELECT id, category_id, name, created_at, updated_at
            FROM subcategories
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Subcategory::from).collect())
    }

    async fn find_by_name(
        &self,
        category_id: Uuid,
        name: &str,
    ) -> Result<Option<Subcategory>, RepositoryError> {
        let row = sqlx::query_as::<_, SubcategoryRow>(
            r#"
            SELECT id, category_id, name, created_at, updated_at
            FROM subcategories
            WHERE category_id = $1 AND name = $2
            "#,
        )
        .bind(category_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Subcategory::from))
    }

    async fn find_by_categories(
        &self,
        category_ids: &[Uuid],
    ) -> Result<Vec<Subcategory>, RepositoryError> {
        if category_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, SubcategoryRow>(
            r#"
            SELECT id, category_id, name, created_at, updated_at
            FROM subcategories
            WHERE category_id = ANY($1)
            ORDER BY name ASC
            "#,
        )
        .bind(category_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Subcategory::from).collect())
    }

    async fn count_by_category(&self, category_id: Uuid) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM subcategories WHERE category_id = $1",
        )
        .bind(category_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn update(&self, subcategory: Subcategory) -> Result<Subcategory, RepositoryError> {
        let result = sqlx::query_as::<_, SubcategoryRow>(
            r#"
            UPDATE subcategories
            SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, category_id, name, created_at, updated_at
            "#,
        )
        .bind(subcategory.id)
        .bind(&subcategory.name)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(row)) => Ok(row.into()),
            Ok(None) => Err(RepositoryError::NotFound),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(RepositoryError::ConstraintViolation(
                    "Subcategory with this name already exists".to_string(),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM subcategories WHERE id = $1")
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
