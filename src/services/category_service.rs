use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::category::{
    Category, CategoryWithSubcategories, CreateCategoryRequest, TransactionType,
    UpdateCategoryRequest,
};
use crate::models::subcategory::{
    CreateSubcategoryRequest, Subcategory, UpdateSubcategoryRequest,
};
use crate::repositories::RepositoryError;
use crate::repositories::category_repository::CategoryRepository;
use crate::repositories::subcategory_repository::SubcategoryRepository;
use crate::repositories::transaction_repository::TransactionRepository;

/// Category service errors
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    #[error("Category not found")]
    CategoryNotFound,

    #[error("Subcategory not found")]
    SubcategoryNotFound,

    #[error("Category with this name already exists")]
    DuplicateName,

    #[error("Subcategory with this name already exists in this category")]
    DuplicateSubcategoryName,

    #[error("Default categories can only change color and icon")]
    CannotRenameDefault,

    #[error("Cannot delete default categories")]
    DefaultCategory,

    #[error("Cannot delete category with existing transactions")]
    CategoryInUse,

    #[error("Cannot delete category with existing subcategories")]
    HasSubcategories,

    #[error("Cannot delete subcategory with existing transactions")]
    SubcategoryInUse,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

fn database_error(e: RepositoryError) -> CategoryError {
    CategoryError::DatabaseError(e.to_string())
}

/// Trait defining category and subcategory operations.
///
/// Every call carries the acting user's id; entities owned by someone else are
/// reported as not found.
#[async_trait]
pub trait CategoryService: Send + Sync {
    /// List a user's categories, each with its subcategories
    async fn list_categories(
        &self,
        user_id: Uuid,
        category_type: Option<TransactionType>,
    ) -> Result<Vec<CategoryWithSubcategories>, CategoryError>;

    async fn create_category(
        &self,
        user_id: Uuid,
        request: CreateCategoryRequest,
    ) -> Result<Category, CategoryError>;

    async fn update_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        request: UpdateCategoryRequest,
    ) -> Result<Category, CategoryError>;

    /// Delete a category that is not default and has no dependents
    async fn delete_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<Category, CategoryError>;

    async fn create_subcategory(
        &self,
        user_id: Uuid,
        request: CreateSubcategoryRequest,
    ) -> Result<Subcategory, CategoryError>;

    async fn update_subcategory(
        &self,
        user_id: Uuid,
        subcategory_id: Uuid,
        request: UpdateSubcategoryRequest,
    ) -> Result<Subcategory, CategoryError>;

    /// Delete a subcategory no record references
    async fn delete_subcategory(
        &self,
        user_id: Uuid,
        subcategory_id: Uuid,
    ) -> Result<Subcategory, CategoryError>;
}

/// Implementation of CategoryService
pub struct CategoryServiceImpl {
    category_repository: Arc<dyn CategoryRepository>,
    subcategory_repository: Arc<dyn SubcategoryRepository>,
    transaction_repository: Arc<dyn TransactionRepository>,
}

impl CategoryServiceImpl {
    pub fn new(
        category_repository: Arc<dyn CategoryRepository>,
        subcategory_repository: Arc<dyn SubcategoryRepository>,
        transaction_repository: Arc<dyn TransactionRepository>,
    ) -> Self {
        Self {
            category_repository,
            subcategory_repository,
            transaction_repository,
        }
    }

    /// Load a category and check that `user_id` owns it
    async fn owned_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<Category, CategoryError> {
        self.category_repository
            .find_by_id(category_id)
            .await
            .map_err(database_error)?
            .filter(|c| c.user_id == user_id)
            .ok_or(CategoryError::CategoryNotFound)
    }

    /// Load a subcategory whose parent category `user_id` owns
    async fn owned_subcategory(
        &self,
        user_id: Uuid,
        subcategory_id: Uuid,
    ) -> Result<Subcategory, CategoryError> {
        let subcategory = self
            .subcategory_repository
            .find_by_id(subcategory_id)
            .await
            .map_err(database_error)?
            .ok_or(CategoryError::SubcategoryNotFound)?;

        match self.owned_category(user_id, subcategory.category_id).await {
            Ok(_) => Ok(subcategory),
            Err(CategoryError::CategoryNotFound) => Err(CategoryError::SubcategoryNotFound),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl CategoryService for CategoryServiceImpl {
    async fn list_categories(
        &self,
        user_id: Uuid,
        category_type: Option<TransactionType>,
    ) -> Result<Vec<CategoryWithSubcategories>, CategoryError> {
        let categories = self
            .category_repository
            .find_by_user(user_id, category_type)
            .await
            .map_err(database_error)?;

        let ids: Vec<Uuid> = categories.iter().map(|c| c.id).collect();
        let mut by_category: HashMap<Uuid, Vec<Subcategory>> = HashMap::new();
        for subcategory in self
            .subcategory_repository
            .find_by_categories(&ids)
            .await
            .map_err(database_error)?
        {
            by_category
                .entry(subcategory.category_id)
                .or_default()
                .push(subcategory);
        }

        Ok(categories
            .into_iter()
            .map(|category| CategoryWithSubcategories {
                subcategories: by_category.remove(&category.id).unwrap_or_default(),
                category,
            })
            .collect())
    }

    async fn create_category(
        &self,
        user_id: Uuid,
        request: CreateCategoryRequest,
    ) -> Result<Category, CategoryError> {
        let name = request.name.trim().to_string();

        if self
            .category_repository
            .find_by_name(user_id, &name, request.category_type)
            .await
            .map_err(database_error)?
            .is_some()
        {
            return Err(CategoryError::DuplicateName);
        }

        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            user_id,
            name,
            category_type: request.category_type,
            color: request
                .color
                .unwrap_or_else(|| request.category_type.default_color().to_string()),
            icon: request.icon,
            is_default: false,
            created_at: now,
            updated_at: now,
        };

        self.category_repository
            .create(category)
            .await
            .map_err(|e| match e {
                RepositoryError::ConstraintViolation(_) => CategoryError::DuplicateName,
                e => database_error(e),
            })
    }

    async fn update_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        request: UpdateCategoryRequest,
    ) -> Result<Category, CategoryError> {
        let mut category = self.owned_category(user_id, category_id).await?;

        if let Some(name) = request.name.map(|n| n.trim().to_string()) {
            if name != category.name {
                if category.is_default {
                    return Err(CategoryError::CannotRenameDefault);
                }

                let taken = self
                    .category_repository
                    .find_by_name(user_id, &name, category.category_type)
                    .await
                    .map_err(database_error)?
                    .is_some_and(|existing| existing.id != category.id);
                if taken {
                    return Err(CategoryError::DuplicateName);
                }

                category.name = name;
            }
        }

        if let Some(color) = request.color {
            category.color = color;
        }
        if request.icon.is_some() {
            category.icon = request.icon;
        }

        self.category_repository
            .update(category)
            .await
            .map_err(|e| match e {
                RepositoryError::ConstraintViolation(_) => CategoryError::DuplicateName,
                RepositoryError::NotFound => CategoryError::CategoryNotFound,
                e => database_error(e),
            })
    }

    async fn delete_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<Category, CategoryError> {
        let category = self.owned_category(user_id, category_id).await?;

        if category.is_default {
            return Err(CategoryError::DefaultCategory);
        }

        let transactions = self
            .transaction_repository
            .count_by_category(category_id)
            .await
            .map_err(database_error)?;
        if transactions > 0 {
            return Err(CategoryError::CategoryInUse);
        }

        let subcategories = self
            .subcategory_repository
            .count_by_category(category_id)
            .await
            .map_err(database_error)?;
        if subcategories > 0 {
            return Err(CategoryError::HasSubcategories);
        }

        // A record inserted after the checks surfaces as a foreign key violation
        self.category_repository
            .delete(category_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CategoryError::CategoryNotFound,
                RepositoryError::ConstraintViolation(_) => CategoryError::CategoryInUse,
                e => database_error(e),
            })?;

        tracing::info!(%user_id, %category_id, "deleted category");
        Ok(category)
    }

    async fn create_subcategory(
        &self,
        user_id: Uuid,
        request: CreateSubcategoryRequest,
    ) -> Result<Subcategory, CategoryError> {
        let category = self.owned_category(user_id, request.category_id).await?;
        let name = request.name.trim().to_string();

        if self
            .subcategory_repository
            .find_by_name(category.id, &name)
            .await
            .map_err(database_error)?
            .is_some()
        {
            return Err(CategoryError::DuplicateSubcategoryName);
        }

        let now = Utc::now();
        let subcategory = Subcategory {
            id: Uuid::new_v4(),
            category_id: category.id,
            name,
            created_at: now,
            updated_at: now,
        };

        self.subcategory_repository
            .create(subcategory)
            .await
            .map_err(|e| match e {
                RepositoryError::ConstraintViolation(_) => CategoryError::DuplicateSubcategoryName,
                e => database_error(e),
            })
    }

    async fn update_subcategory(
        &self,
        user_id: Uuid,
        subcategory_id: Uuid,
        request: UpdateSubcategoryRequest,
    ) -> Result<Subcategory, CategoryError> {
        let mut subcategory = self.owned_subcategory(user_id, subcategory_id).await?;
        let name = request.name.trim().to_string();

        if name == subcategory.name {
            return Ok(subcategory);
        }

        let taken = self
            .subcategory_repository
            .find_by_name(subcategory.category_id, &name)
            .await
            .map_err(database_error)?
            .is_some();
        if taken {
            return Err(CategoryError::DuplicateSubcategoryName);
        }

        subcategory.name = name;
        self.subcategory_repository
            .update(subcategory)
            .await
            .map_err(|e| match e {
                RepositoryError::ConstraintViolation(_) => CategoryError::DuplicateSubcategoryName,
                RepositoryError::NotFound => CategoryError::SubcategoryNotFound,
                e => database_error(e),
            })
    }

    async fn delete_subcategory(
        &self,
        user_id: Uuid,
        subcategory_id: Uuid,
    ) -> Result<Subcategory, CategoryError> {
        let subcategory = self.owned_subcategory(user_id, subcategory_id).await?;

        let references = self
            .transaction_repository
            .count_by_subcategory(subcategory_id)
            .await
            .map_err(database_error)?;
        if references > 0 {
            return Err(CategoryError::SubcategoryInUse);
        }

        self.subcategory_repository
            .delete(subcategory_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CategoryError::SubcategoryNotFound,
                RepositoryError::ConstraintViolation(_) => CategoryError::SubcategoryInUse,
                e => database_error(e),
            })?;

        Ok(subcategory)
    }
}
