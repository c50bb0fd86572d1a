pub mod analytics;
pub mod auth;
pub mod category;
pub mod filters;
pub mod subcategory;
pub mod transaction;
pub mod user;

pub use analytics::{CategoryBreakdown, HistoryBucket, HistoryPeriod, Summary};
pub use auth::{AuthToken, LoginRequest};
pub use category::{
    Category, CategoryWithSubcategories, CreateCategoryRequest, TransactionType,
    UpdateCategoryRequest,
};
pub use filters::{DateRange, TransactionFilters};
pub use subcategory::{CreateSubcategoryRequest, Subcategory, UpdateSubcategoryRequest};
pub use transaction::{
    CreateExpenseRequest, CreateIncomeRequest, IncomeFrequency, PaymentMethod, Transaction,
    TransactionDetails, UpdateExpenseRequest, UpdateIncomeRequest,
};
pub use user::{CreateUserRequest, User};
