//! In-memory repository mocks shared by the unit tests.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::models::category::{Category, TransactionType};
use crate::models::filters::{DateRange, TransactionFilters};
use crate::models::subcategory::Subcategory;
use crate::models::transaction::Transaction;
use crate::models::user::{CreateUserRequest, User};
use crate::repositories::RepositoryError;
use crate::repositories::category_repository::CategoryRepository;
use crate::repositories::subcategory_repository::SubcategoryRepository;
use crate::repositories::transaction_repository::{CategoryTotal, TransactionRepository};
use crate::repositories::user_repository::UserRepository;
use crate::services::analytics_service::AnalyticsServiceImpl;
use crate::services::auth_service::AuthServiceImpl;
use crate::services::category_service::CategoryServiceImpl;
use crate::services::transaction_service::TransactionServiceImpl;

fn failure() -> RepositoryError {
    RepositoryError::DatabaseError("Database connection failed".to_string())
}

pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

pub fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

// Mock UserRepository for testing
pub struct MockUserRepository {
    users: Mutex<HashMap<String, User>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn create(
        &self,
        user: CreateUserRequest,
        password_hash: String,
    ) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().unwrap();

        if users.contains_key(&user.email) {
            return Err(RepositoryError::ConstraintViolation(
                "Email already exists".to_string(),
            ));
        }

        let new_user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email.clone(),
            password_hash,
            created_at: Utc::now(),
        };

        users.insert(new_user.email.clone(), new_user.clone());
        Ok(new_user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let users = self.users.lock().unwrap();
        Ok(users.get(email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.id == id).cloned())
    }
}

// Mock CategoryRepository for testing
pub struct MockCategoryRepository {
    categories: Mutex<HashMap<Uuid, Category>>,
    should_fail: bool,
}

impl MockCategoryRepository {
    pub fn new() -> Self {
        Self {
            categories: Mutex::new(HashMap::new()),
            should_fail: false,
        }
    }

    pub fn with_failure() -> Self {
        Self {
            categories: Mutex::new(HashMap::new()),
            should_fail: true,
        }
    }

    /// Insert a category directly, bypassing uniqueness checks
    pub fn insert(&self, category: Category) {
        self.categories.lock().unwrap().insert(category.id, category);
    }
}

#[async_trait]
impl CategoryRepository for MockCategoryRepository {
    async fn create(&self, category: Category) -> Result<Category, RepositoryError> {
        if self.should_fail {
            return Err(failure());
        }

        let mut categories = self.categories.lock().unwrap();
        let duplicate = categories.values().any(|c| {
            c.user_id == category.user_id
                && c.name == category.name
                && c.category_type == category.category_type
        });
        if duplicate {
            return Err(RepositoryError::ConstraintViolation(
                "Category already exists".to_string(),
            ));
        }

        categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn create_many(&self, categories: Vec<Category>) -> Result<(), RepositoryError> {
        if self.should_fail {
            return Err(failure());
        }

        let mut stored = self.categories.lock().unwrap();
        for category in categories {
            stored.insert(category.id, category);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepositoryError> {
        if self.should_fail {
            return Err(failure());
        }
        Ok(self.categories.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Category>, RepositoryError> {
        if self.should_fail {
            return Err(failure());
        }
        let categories = self.categories.lock().unwrap();
        Ok(ids.iter().filter_map(|id| categories.get(id).cloned()).collect())
    }

    async fn find_by_name(
        &self,
        user_id: Uuid,
        name: &str,
        category_type: TransactionType,
    ) -> Result<Option<Category>, RepositoryError> {
        if self.should_fail {
            return Err(failure());
        }
        let categories = self.categories.lock().unwrap();
        Ok(categories
            .values()
            .find(|c| c.user_id == user_id && c.name == name && c.category_type == category_type)
            .cloned())
    }

    async fn find_by_user(
        &self,
        user_id: Uuid,
        category_type: Option<TransactionType>,
    ) -> Result<Vec<Category>, RepositoryError> {
        if self.should_fail {
            return Err(failure());
        }
        let categories = self.categories.lock().unwrap();
        let mut result: Vec<Category> = categories
            .values()
            .filter(|c| c.user_id == user_id)
            .filter(|c| category_type.is_none_or(|t| c.category_type == t))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    async fn update(&self, category: Category) -> Result<Category, RepositoryError> {
        if self.should_fail {
            return Err(failure());
        }
        let mut categories = self.categories.lock().unwrap();
        let duplicate = categories.values().any(|c| {
            c.id != category.id
                && c.user_id == category.user_id
                && c.name == category.name
                && c.category_type == category.category_type
        });
        if duplicate {
            return Err(RepositoryError::ConstraintViolation(
                "Category already exists".to_string(),
            ));
        }
        match categories.get_mut(&category.id) {
            Some(existing) => {
                *existing = category.clone();
                Ok(category)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        if self.should_fail {
            return Err(failure());
        }
        match self.categories.lock().unwrap().remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound),
        }
    }
}

// Mock SubcategoryRepository for testing
pub struct MockSubcategoryRepository {
    subcategories: Mutex<HashMap<Uuid, Subcategory>>,
}

impl MockSubcategoryRepository {
    pub fn new() -> Self {
        Self {
            subcategories: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SubcategoryRepository for MockSubcategoryRepository {
    async fn create(&self, subcategory: Subcategory) -> Result<Subcategory, RepositoryError> {
        let mut subcategories = self.subcategories.lock().unwrap();
        let duplicate = subcategories
            .values()
            .any(|s| s.category_id == subcategory.category_id && s.name == subcategory.name);
        if duplicate {
            return Err(RepositoryError::ConstraintViolation(
                "Subcategory already exists".to_string(),
            ));
        }
        subcategories.insert(subcategory.id, subcategory.clone());
        Ok(subcategory)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subcategory>, RepositoryError> {
        Ok(self.subcategories.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Subcategory>, RepositoryError> {
        let subcategories = self.subcategories.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| subcategories.get(id).cloned())
            .collect())
    }

    async fn find_by_name(
        &self,
        category_id: Uuid,
        name: &str,
    ) -> Result<Option<Subcategory>, RepositoryError> {
        let subcategories = self.subcategories.lock().unwrap();
        Ok(subcategories
            .values()
            .find(|s| s.category_id == category_id && s.name == name)
            .cloned())
    }

    async fn find_by_categories(
        &self,
        category_ids: &[Uuid],
    ) -> Result<Vec<Subcategory>, RepositoryError> {
        let subcategories = self.subcategories.lock().unwrap();
        let mut result: Vec<Subcategory> = subcategories
            .values()
            .filter(|s| category_ids.contains(&s.category_id))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    async fn count_by_category(&self, category_id: Uuid) -> Result<i64, RepositoryError> {
        let subcategories = self.subcategories.lock().unwrap();
        Ok(subcategories
            .values()
            .filter(|s| s.category_id == category_id)
            .count() as i64)
    }

    async fn update(&self, subcategory: Subcategory) -> Result<Subcategory, RepositoryError> {
        let mut subcategories = self.subcategories.lock().unwrap();
        match subcategories.get_mut(&subcategory.id) {
            Some(existing) => {
                *existing = subcategory.clone();
                Ok(subcategory)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        match self.subcategories.lock().unwrap().remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound),
        }
    }
}

// Mock TransactionRepository for testing
pub struct MockTransactionRepository {
    transactions: Mutex<HashMap<Uuid, Transaction>>,
    should_fail: bool,
}

impl MockTransactionRepository {
    pub fn new() -> Self {
        Self {
            transactions: Mutex::new(HashMap::new()),
            should_fail: false,
        }
    }

    pub fn with_failure() -> Self {
        Self {
            transactions: Mutex::new(HashMap::new()),
            should_fail: true,
        }
    }

    /// Insert a record directly, bypassing service validation
    pub fn insert(&self, transaction: Transaction) {
        self.transactions
            .lock()
            .unwrap()
            .insert(transaction.id, transaction);
    }

    fn matching(&self, kind: TransactionType, user_id: Uuid, range: DateRange) -> Vec<Transaction> {
        self.transactions
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.kind == kind && t.user_id == user_id && range.contains(t.date))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TransactionRepository for MockTransactionRepository {
    async fn create(&self, transaction: Transaction) -> Result<Transaction, RepositoryError> {
        if self.should_fail {
            return Err(failure());
        }
        self.insert(transaction.clone());
        Ok(transaction)
    }

    async fn update(&self, transaction: Transaction) -> Result<Transaction, RepositoryError> {
        if self.should_fail {
            return Err(failure());
        }
        let mut transactions = self.transactions.lock().unwrap();
        match transactions.get_mut(&transaction.id) {
            Some(existing) if existing.kind == transaction.kind => {
                *existing = transaction.clone();
                Ok(transaction)
            }
            _ => Err(RepositoryError::NotFound),
        }
    }

    async fn find_by_id(
        &self,
        kind: TransactionType,
        id: Uuid,
    ) -> Result<Option<Transaction>, RepositoryError> {
        if self.should_fail {
            return Err(failure());
        }
        let transactions = self.transactions.lock().unwrap();
        Ok(transactions.get(&id).filter(|t| t.kind == kind).cloned())
    }

    async fn find_by_user(
        &self,
        kind: TransactionType,
        user_id: Uuid,
        filters: TransactionFilters,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        if self.should_fail {
            return Err(failure());
        }
        let transactions = self.transactions.lock().unwrap();
        let mut result: Vec<Transaction> = transactions
            .values()
            .filter(|t| t.kind == kind && t.user_id == user_id)
            .filter(|t| filters.date_range.is_none_or(|r| r.contains(t.date)))
            .filter(|t| filters.since.is_none_or(|since| t.date >= since))
            .filter(|t| filters.category_id.is_none_or(|id| t.category_id == id))
            .filter(|t| {
                kind != TransactionType::Expense
                    || filters
                        .payment_method
                        .is_none_or(|m| t.payment_method == Some(m))
            })
            .cloned()
            .collect();

        // Sort by date descending (most recent first)
        result.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        if let Some(limit) = filters.limit {
            result.truncate(limit as usize);
        }
        Ok(result)
    }

    async fn delete(&self, kind: TransactionType, id: Uuid) -> Result<(), RepositoryError> {
        if self.should_fail {
            return Err(failure());
        }
        let mut transactions = self.transactions.lock().unwrap();
        match transactions.get(&id) {
            Some(t) if t.kind == kind => {
                transactions.remove(&id);
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }

    async fn sum_amount(
        &self,
        kind: TransactionType,
        user_id: Uuid,
        range: DateRange,
    ) -> Result<Decimal, RepositoryError> {
        if self.should_fail {
            return Err(failure());
        }
        Ok(self
            .matching(kind, user_id, range)
            .iter()
            .map(|t| t.amount)
            .sum())
    }

    async fn sum_by_category(
        &self,
        kind: TransactionType,
        user_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<CategoryTotal>, RepositoryError> {
        if self.should_fail {
            return Err(failure());
        }
        let mut totals: HashMap<Uuid, Decimal> = HashMap::new();
        for t in self.matching(kind, user_id, range) {
            *totals.entry(t.category_id).or_insert(Decimal::ZERO) += t.amount;
        }
        Ok(totals
            .into_iter()
            .map(|(category_id, total)| CategoryTotal { category_id, total })
            .collect())
    }

    async fn count_by_category(&self, category_id: Uuid) -> Result<i64, RepositoryError> {
        let transactions = self.transactions.lock().unwrap();
        Ok(transactions
            .values()
            .filter(|t| t.category_id == category_id)
            .count() as i64)
    }

    async fn count_by_subcategory(&self, subcategory_id: Uuid) -> Result<i64, RepositoryError> {
        let transactions = self.transactions.lock().unwrap();
        Ok(transactions
            .values()
            .filter(|t| t.subcategory_id == Some(subcategory_id))
            .count() as i64)
    }
}

/// Every mock repository wired into the real service implementations
pub struct TestServices {
    pub categories: Arc<MockCategoryRepository>,
    pub auth_service: Arc<AuthServiceImpl>,
    pub category_service: Arc<CategoryServiceImpl>,
    pub transaction_service: Arc<TransactionServiceImpl>,
    pub analytics_service: Arc<AnalyticsServiceImpl>,
}

impl TestServices {
    pub fn new() -> Self {
        let users = Arc::new(MockUserRepository::new());
        let categories = Arc::new(MockCategoryRepository::new());
        let subcategories = Arc::new(MockSubcategoryRepository::new());
        let transactions = Arc::new(MockTransactionRepository::new());

        let auth_service = Arc::new(AuthServiceImpl::new(
            users,
            categories.clone(),
            "test_secret".to_string(),
        ));
        let category_service = Arc::new(CategoryServiceImpl::new(
            categories.clone(),
            subcategories.clone(),
            transactions.clone(),
        ));
        let transaction_service = Arc::new(TransactionServiceImpl::new(
            transactions.clone(),
            categories.clone(),
            subcategories.clone(),
        ));
        let analytics_service = Arc::new(AnalyticsServiceImpl::new(
            transactions,
            categories.clone(),
        ));

        Self {
            categories,
            auth_service,
            category_service,
            transaction_service,
            analytics_service,
        }
    }
}

/// Build a category owned by `user_id`
pub fn category(user_id: Uuid, name: &str, category_type: TransactionType) -> Category {
    let now = Utc::now();
    Category {
        id: Uuid::new_v4(),
        user_id,
        name: name.to_string(),
        category_type,
        color: category_type.default_color().to_string(),
        icon: None,
        is_default: false,
        created_at: now,
        updated_at: now,
    }
}

/// Build a record in `category` dated `date`
pub fn transaction(
    category: &Category,
    amount: &str,
    date: DateTime<Utc>,
) -> Transaction {
    Transaction {
        id: Uuid::new_v4(),
        user_id: category.user_id,
        kind: category.category_type,
        category_id: category.id,
        subcategory_id: None,
        name: format!("{} entry", category.name),
        amount: dec(amount),
        date,
        frequency: None,
        payment_method: None,
        notes: None,
        created_at: date,
        updated_at: date,
    }
}
