use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::category::{Category, TransactionType};
use crate::models::subcategory::Subcategory;
use crate::validation::{validate_not_blank, validate_positive_amount};

/// How often an income record recurs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Default)]
pub enum IncomeFrequency {
    #[default]
    #[serde(rename = "one-time")]
    OneTime,
    #[serde(rename = "weekly")]
    Weekly,
    #[serde(rename = "bi-weekly")]
    BiWeekly,
    #[serde(rename = "monthly")]
    Monthly,
    #[serde(rename = "yearly")]
    Yearly,
}

impl IncomeFrequency {
    /// Convert to database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            IncomeFrequency::OneTime => "one-time",
            IncomeFrequency::Weekly => "weekly",
            IncomeFrequency::BiWeekly => "bi-weekly",
            IncomeFrequency::Monthly => "monthly",
            IncomeFrequency::Yearly => "yearly",
        }
    }

    /// Parse from database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "one-time" => Some(IncomeFrequency::OneTime),
            "weekly" => Some(IncomeFrequency::Weekly),
            "bi-weekly" => Some(IncomeFrequency::BiWeekly),
            "monthly" => Some(IncomeFrequency::Monthly),
            "yearly" => Some(IncomeFrequency::Yearly),
            _ => None,
        }
    }
}

/// How an expense was paid
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    CreditCard,
    DebitCard,
    Online,
    Other,
}

impl PaymentMethod {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Online => "online",
            PaymentMethod::Other => "other",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "credit_card" => Some(PaymentMethod::CreditCard),
            "debit_card" => Some(PaymentMethod::DebitCard),
            "online" => Some(PaymentMethod::Online),
            "other" => Some(PaymentMethod::Other),
            _ => None,
        }
    }
}

/// A single income or expense record.
///
/// Income and expenses live in separate tables but share every field except
/// their tag: income carries a `frequency`, expenses a `payment_method`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category_id: Uuid,
    pub subcategory_id: Option<Uuid>,
    pub name: String,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<IncomeFrequency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Transaction with its category and subcategory resolved
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionDetails {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub category: Option<Category>,
    pub subcategory: Option<Subcategory>,
}

/// Request payload for recording income
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "name": "October salary",
    "amount": 3200.00,
    "date": "2024-10-01",
    "frequency": "monthly",
    "categoryId": "550e8400-e29b-41d4-a716-446655440000"
}))]
pub struct CreateIncomeRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(custom(function = "validate_positive_amount"))]
    #[schema(minimum = 0.01, example = 3200.00)]
    pub amount: Decimal,

    /// RFC 3339 instant or `YYYY-MM-DD`
    #[schema(example = "2024-10-01")]
    pub date: String,

    pub frequency: Option<IncomeFrequency>,

    pub category_id: Uuid,

    pub subcategory_id: Option<Uuid>,

    pub notes: Option<String>,
}

/// Request payload for recording an expense
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "name": "Groceries",
    "amount": 42.50,
    "date": "2024-10-03T18:30:00Z",
    "paymentMethod": "debit_card",
    "categoryId": "550e8400-e29b-41d4-a716-446655440000"
}))]
pub struct CreateExpenseRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(custom(function = "validate_positive_amount"))]
    #[schema(minimum = 0.01, example = 42.50)]
    pub amount: Decimal,

    #[schema(example = "2024-10-03T18:30:00Z")]
    pub date: String,

    pub payment_method: Option<PaymentMethod>,

    pub category_id: Uuid,

    pub subcategory_id: Option<Uuid>,

    pub notes: Option<String>,
}

/// Request payload for updating income; only provided fields change
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIncomeRequest {
    #[validate(length(min = 1, max = 255, message = "Name cannot be empty"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: Option<String>,

    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Option<Decimal>,

    pub date: Option<String>,

    pub frequency: Option<IncomeFrequency>,

    pub category_id: Option<Uuid>,

    pub subcategory_id: Option<Uuid>,

    pub notes: Option<String>,
}

/// Request payload for updating an expense; only provided fields change
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseRequest {
    #[validate(length(min = 1, max = 255, message = "Name cannot be empty"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: Option<String>,

    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Option<Decimal>,

    pub date: Option<String>,

    pub payment_method: Option<PaymentMethod>,

    pub category_id: Option<Uuid>,

    pub subcategory_id: Option<Uuid>,

    pub notes: Option<String>,
}

/// Kind-independent form of a create request, consumed by the transaction service
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionType,
    pub name: String,
    pub amount: Decimal,
    pub date: String,
    pub category_id: Uuid,
    pub subcategory_id: Option<Uuid>,
    pub frequency: Option<IncomeFrequency>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

impl From<CreateIncomeRequest> for NewTransaction {
    fn from(request: CreateIncomeRequest) -> Self {
        Self {
            kind: TransactionType::Income,
            name: request.name,
            amount: request.amount,
            date: request.date,
            category_id: request.category_id,
            subcategory_id: request.subcategory_id,
            frequency: Some(request.frequency.unwrap_or_default()),
            payment_method: None,
            notes: request.notes,
        }
    }
}

impl From<CreateExpenseRequest> for NewTransaction {
    fn from(request: CreateExpenseRequest) -> Self {
        Self {
            kind: TransactionType::Expense,
            name: request.name,
            amount: request.amount,
            date: request.date,
            category_id: request.category_id,
            subcategory_id: request.subcategory_id,
            frequency: None,
            payment_method: Some(request.payment_method.unwrap_or_default()),
            notes: request.notes,
        }
    }
}

/// Kind-independent form of an update request
#[derive(Debug, Clone, Default)]
pub struct TransactionChanges {
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<String>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub frequency: Option<IncomeFrequency>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

impl From<UpdateIncomeRequest> for TransactionChanges {
    fn from(request: UpdateIncomeRequest) -> Self {
        Self {
            name: request.name,
            amount: request.amount,
            date: request.date,
            category_id: request.category_id,
            subcategory_id: request.subcategory_id,
            frequency: request.frequency,
            payment_method: None,
            notes: request.notes,
        }
    }
}

impl From<UpdateExpenseRequest> for TransactionChanges {
    fn from(request: UpdateExpenseRequest) -> Self {
        Self {
            name: request.name,
            amount: request.amount,
            date: request.date,
            category_id: request.category_id,
            subcategory_id: request.subcategory_id,
            frequency: None,
            payment_method: request.payment_method,
            notes: request.notes,
        }
    }
}
