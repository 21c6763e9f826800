use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{CardVendor, MealType};
use super::errors::{ValidationError, ValidationResult};

/// A logged spending record. Checkout-created records carry a `store_id`;
/// manually entered ones do not. Deletion is a soft flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expenditure {
    pub expenditure_id: String,
    pub member_id: String,
    pub store_id: Option<String>,
    pub store_name: String,
    pub amount: i64,
    pub discount_amount: i64,
    pub meal_type: Option<MealType>,
    pub category: Option<String>,
    pub memo: Option<String>,
    pub spent_at: DateTime<Utc>,
    pub items: Vec<ExpenditureItem>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// Itemized line of an expenditure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenditureItem {
    pub food_id: Option<String>,
    pub name: String,
    pub price: i64,
    pub quantity: u32,
}

impl ExpenditureItem {
    pub fn line_total(&self) -> i64 {
        self.price * i64::from(self.quantity)
    }
}

impl Expenditure {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        member_id: String,
        store_id: Option<String>,
        store_name: String,
        amount: i64,
        discount_amount: i64,
        meal_type: Option<MealType>,
        category: Option<String>,
        memo: Option<String>,
        spent_at: DateTime<Utc>,
        items: Vec<ExpenditureItem>,
    ) -> Self {
        Self {
            expenditure_id: Uuid::new_v4().to_string(),
            member_id,
            store_id,
            store_name,
            amount,
            discount_amount,
            meal_type,
            category,
            memo,
            spent_at,
            items,
            deleted: false,
            created_at: Utc::now(),
        }
    }

    /// Itemized records must reconcile: item lines minus the discount equal
    /// the recorded amount.
    pub fn validate_item_total(&self) -> ValidationResult<()> {
        if self.items.is_empty() {
            return Ok(());
        }
        let items_total: i64 = self.items.iter().map(ExpenditureItem::line_total).sum();
        if items_total - self.discount_amount != self.amount {
            return Err(ValidationError::InvalidValue {
                field: "amount".to_string(),
                value: self.amount.to_string(),
                reason: format!(
                    "items total {} minus discount {} does not equal amount",
                    items_total, self.discount_amount
                ),
            });
        }
        Ok(())
    }

    pub fn is_owned_by(&self, member_id: &str) -> bool {
        self.member_id == member_id
    }

    pub fn mark_deleted(&mut self) {
        self.deleted = true;
    }

    pub fn to_response(&self) -> ExpenditureResponse {
        ExpenditureResponse {
            expenditure_id: self.expenditure_id.clone(),
            store_id: self.store_id.clone(),
            store_name: self.store_name.clone(),
            amount: self.amount,
            discount_amount: self.discount_amount,
            meal_type: self.meal_type,
            category: self.category.clone(),
            memo: self.memo.clone(),
            spent_at: self.spent_at,
            items: self.items.clone(),
            created_at: self.created_at,
        }
    }
}

// REQUEST / RESPONSE MODELS

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExpenditureRequest {
    pub store_name: String,
    pub amount: i64,
    #[serde(default)]
    pub discount_amount: i64,
    pub meal_type: Option<MealType>,
    pub category: Option<String>,
    pub memo: Option<String>,
    pub spent_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<ExpenditureItemRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenditureItemRequest {
    pub food_id: Option<String>,
    pub name: String,
    pub price: i64,
    pub quantity: u32,
}

impl ExpenditureItemRequest {
    pub fn into_item(self) -> ExpenditureItem {
        ExpenditureItem {
            food_id: self.food_id,
            name: self.name,
            price: self.price,
            quantity: self.quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateExpenditureRequest {
    pub meal_type: Option<MealType>,
    pub category: Option<String>,
    pub memo: Option<String>,
}

/// List filters; all optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenditureFilters {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub meal_type: Option<MealType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenditureResponse {
    pub expenditure_id: String,
    pub store_id: Option<String>,
    pub store_name: String,
    pub amount: i64,
    pub discount_amount: i64,
    pub meal_type: Option<MealType>,
    pub category: Option<String>,
    pub memo: Option<String>,
    pub spent_at: DateTime<Utc>,
    pub items: Vec<ExpenditureItem>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenditureListResponse {
    pub expenditures: Vec<ExpenditureResponse>,
    pub total_count: usize,
}

// SMS PARSING MODELS

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseSmsRequest {
    pub message: String,
}

/// Result of parsing a card-authorization SMS; nothing is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSms {
    pub vendor: CardVendor,
    pub spent_at: DateTime<Utc>,
    pub amount: i64,
    pub store_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, price: i64, quantity: u32) -> ExpenditureItem {
        ExpenditureItem {
            food_id: None,
            name: name.to_string(),
            price,
            quantity,
        }
    }

    fn expenditure(amount: i64, discount: i64, items: Vec<ExpenditureItem>) -> Expenditure {
        Expenditure::new(
            "M001".to_string(),
            None,
            "김밥천국".to_string(),
            amount,
            discount,
            Some(MealType::Lunch),
            None,
            None,
            Utc::now(),
            items,
        )
    }

    #[test]
    fn test_item_total_invariant_holds() {
        let exp = expenditure(17_000, 1_000, vec![item("김밥", 3_000, 2), item("라면", 4_000, 3)]);
        assert!(exp.validate_item_total().is_ok());
    }

    #[test]
    fn test_item_total_invariant_violated() {
        let exp = expenditure(10_000, 0, vec![item("김밥", 3_000, 2)]);
        assert!(exp.validate_item_total().is_err());
    }

    #[test]
    fn test_item_total_skipped_without_items() {
        let exp = expenditure(10_000, 0, vec![]);
        assert!(exp.validate_item_total().is_ok());
    }

    #[test]
    fn test_ownership_check() {
        let exp = expenditure(5_000, 0, vec![]);
        assert!(exp.is_owned_by("M001"));
        assert!(!exp.is_owned_by("M002"));
    }

    #[test]
    fn test_soft_delete_flag() {
        let mut exp = expenditure(5_000, 0, vec![]);
        assert!(!exp.deleted);
        exp.mark_deleted();
        assert!(exp.deleted);
    }
}
