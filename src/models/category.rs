use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::subcategory::Subcategory;
use crate::validation::{validate_hex_color, validate_not_blank};

/// Kind of money movement. Categories carry one and transactions must match it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "income" => Some(TransactionType::Income),
            "expense" => Some(TransactionType::Expense),
            _ => None,
        }
    }

    /// Capitalized name used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
        }
    }

    /// Color assigned to a new category when the client does not pick one
    pub fn default_color(&self) -> &'static str {
        match self {
            TransactionType::Income => "#52c41a",
            TransactionType::Expense => "#f5222d",
        }
    }
}

/// Template for a category seeded at registration
#[derive(Debug, Clone, Copy)]
pub struct DefaultCategory {
    pub name: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

pub const DEFAULT_INCOME_CATEGORIES: &[DefaultCategory] = &[
    DefaultCategory {
        name: "Employment",
        icon: "💼",
        color: "#1890ff",
    },
    DefaultCategory {
        name: "Business",
        icon: "💰",
        color: "#52c41a",
    },
    DefaultCategory {
        name: "Investments",
        icon: "📈",
        color: "#722ed1",
    },
    DefaultCategory {
        name: "Other",
        icon: "💵",
        color: "#faad14",
    },
];

pub const DEFAULT_EXPENSE_CATEGORIES: &[DefaultCategory] = &[
    DefaultCategory {
        name: "Housing",
        icon: "🏠",
        color: "#f5222d",
    },
    DefaultCategory {
        name: "Transportation",
        icon: "🚗",
        color: "#fa8c16",
    },
    DefaultCategory {
        name: "Food",
        icon: "🍔",
        color: "#faad14",
    },
    DefaultCategory {
        name: "Utilities",
        icon: "💡",
        color: "#13c2c2",
    },
    DefaultCategory {
        name: "Entertainment",
        icon: "🎬",
        color: "#722ed1",
    },
    DefaultCategory {
        name: "Healthcare",
        icon: "🏥",
        color: "#eb2f96",
    },
    DefaultCategory {
        name: "Education",
        icon: "📚",
        color: "#1890ff",
    },
    DefaultCategory {
        name: "Shopping",
        icon: "🛍️",
        color: "#fa541c",
    },
    DefaultCategory {
        name: "Other",
        icon: "📋",
        color: "#8c8c8c",
    },
];

/// Category entity grouping a user's income or expense records
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: TransactionType,
    pub color: String,
    pub icon: Option<String>,
    /// Seeded at registration; cannot be deleted or renamed
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Build the default categories for a freshly registered user
    pub fn defaults_for(user_id: Uuid) -> Vec<Category> {
        let now = Utc::now();
        let income = DEFAULT_INCOME_CATEGORIES
            .iter()
            .map(|d| (TransactionType::Income, d));
        let expense = DEFAULT_EXPENSE_CATEGORIES
            .iter()
            .map(|d| (TransactionType::Expense, d));

        income
            .chain(expense)
            .map(|(category_type, d)| Category {
                id: Uuid::new_v4(),
                user_id,
                name: d.name.to_string(),
                category_type,
                color: d.color.to_string(),
                icon: Some(d.icon.to_string()),
                is_default: true,
                created_at: now,
                updated_at: now,
            })
            .collect()
    }
}

/// Category together with its subcategories, as listed to the client
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryWithSubcategories {
    #[serde(flatten)]
    pub category: Category,
    pub subcategories: Vec<Subcategory>,
}

/// Request payload for creating a category
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "Freelance",
    "type": "income",
    "color": "#13c2c2",
    "icon": "🧑‍💻"
}))]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,

    #[serde(rename = "type")]
    pub category_type: TransactionType,

    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,

    #[validate(length(max = 32, message = "Icon must be at most 32 characters"))]
    pub icon: Option<String>,
}

/// Request payload for updating a category. The type can never change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: Option<String>,

    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,

    #[validate(length(max = 32, message = "Icon must be at most 32 characters"))]
    pub icon: Option<String>,
}

/// Query string for listing categories
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryListQuery {
    #[serde(rename = "type")]
    pub category_type: Option<TransactionType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_seeds_both_types() {
        let user_id = Uuid::new_v4();
        let defaults = Category::defaults_for(user_id);

        assert_eq!(
            defaults.len(),
            DEFAULT_INCOME_CATEGORIES.len() + DEFAULT_EXPENSE_CATEGORIES.len()
        );
        assert!(defaults.iter().all(|c| c.is_default && c.user_id == user_id));
        assert_eq!(
            defaults
                .iter()
                .filter(|c| c.category_type == TransactionType::Income)
                .count(),
            4
        );
        assert!(defaults.iter().any(|c| c.name == "Other"
            && c.category_type == TransactionType::Expense
            && c.color == "#8c8c8c"));
    }

    #[test]
    fn test_transaction_type_db_round_trip() {
        assert_eq!(TransactionType::from_db_string("income"), Some(TransactionType::Income));
        assert_eq!(TransactionType::from_db_string("expense"), Some(TransactionType::Expense));
        assert_eq!(TransactionType::from_db_string("transfer"), None);
    }

    #[test]
    fn test_category_serializes_type_field() {
        let category = Category::defaults_for(Uuid::new_v4()).remove(0);
        let json = serde_json::to_value(&category).unwrap();

        assert_eq!(json["type"], "income");
        assert_eq!(json["isDefault"], true);
        assert!(json.get("category_type").is_none());
    }
}
