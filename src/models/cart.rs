use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::MealType;

/// A member's pre-checkout selection at one store.
/// A member holds at most one cart per store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub member_id: String,
    pub store_id: String,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Individual item in a cart; the price is snapshotted at add time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub food_id: String,
    pub food_name: String,
    pub price: i64,
    pub quantity: u32,
}

impl Cart {
    pub fn new(member_id: String, store_id: String) -> Self {
        let now = Utc::now();
        Self {
            member_id,
            store_id,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add an item or bump its quantity when already present
    pub fn add_item(&mut self, food_id: String, food_name: String, price: i64, quantity: u32) {
        if let Some(existing) = self.items.iter_mut().find(|item| item.food_id == food_id) {
            existing.quantity += quantity;
        } else {
            self.items.push(CartItem {
                food_id,
                food_name,
                price,
                quantity,
            });
        }
        self.updated_at = Utc::now();
    }

    /// Set the quantity of an item; zero removes it. Returns false when the
    /// item is not in the cart.
    pub fn update_item_quantity(&mut self, food_id: &str, new_quantity: u32) -> bool {
        if let Some(item) = self.items.iter_mut().find(|item| item.food_id == food_id) {
            if new_quantity == 0 {
                self.remove_item(food_id)
            } else {
                item.quantity = new_quantity;
                self.updated_at = Utc::now();
                true
            }
        } else {
            false
        }
    }

    pub fn remove_item(&mut self, food_id: &str) -> bool {
        let original_len = self.items.len();
        self.items.retain(|item| item.food_id != food_id);
        let removed = self.items.len() != original_len;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.updated_at = Utc::now();
    }

    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Subtotal before any discount
    pub fn subtotal(&self) -> i64 {
        self.items
            .iter()
            .map(|item| item.price * i64::from(item.quantity))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains_item(&self, food_id: &str) -> bool {
        self.items.iter().any(|item| item.food_id == food_id)
    }

    pub fn to_response(&self) -> CartResponse {
        CartResponse {
            store_id: self.store_id.clone(),
            items: self.items.clone(),
            total_items: self.total_items(),
            subtotal: self.subtotal(),
            updated_at: self.updated_at,
        }
    }
}

// REQUEST / RESPONSE MODELS

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCartItemRequest {
    pub store_id: String,
    pub food_id: String,
    pub quantity: u32,
    /// When the member already has a cart at another store, true replaces it
    /// and false rejects the add.
    #[serde(default)]
    pub replace_cart: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCartItemRequest {
    pub store_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartResponse {
    pub store_id: String,
    pub items: Vec<CartItem>,
    pub total_items: u32,
    pub subtotal: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCartItemResponse {
    pub cart: CartResponse,
    pub replaced_cart: bool,
}

// CHECKOUT MODELS

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub store_id: String,
    #[serde(default)]
    pub discount_amount: i64,
    pub meal_type: Option<MealType>,
    pub memo: Option<String>,
}

/// Remaining budget amounts captured around a checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub meal_budget_before: Option<i64>,
    pub meal_budget_after: Option<i64>,
    pub daily_budget_before: i64,
    pub daily_budget_after: i64,
    pub monthly_budget_before: i64,
    pub monthly_budget_after: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub expenditure_id: String,
    pub store_id: String,
    pub store_name: String,
    pub items: Vec<CartItem>,
    pub subtotal: i64,
    pub discount_amount: i64,
    pub final_amount: i64,
    pub budget_summary: BudgetSummary,
    pub created_at: DateTime<Utc>,
}
