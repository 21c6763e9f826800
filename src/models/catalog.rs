use serde::{Deserialize, Serialize};

/// A menu item in the catalog. `price` is the store's listed price when
/// known; `average_price` is the category-level fallback used at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub food_id: String,
    pub name: String,
    pub category: String,
    pub price: Option<i64>,
    pub average_price: i64,
    pub store_id: Option<String>,
}

impl Food {
    /// Price used when adding to a cart: listed price, else the average.
    pub fn effective_price(&self) -> i64 {
        self.price.unwrap_or(self.average_price)
    }
}

/// A store in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub store_id: String,
    pub name: String,
    pub road_address: String,
    pub categories: Vec<String>,
    pub phone_number: Option<String>,
}

impl Store {
    /// Category attributed to checkout expenditures at this store
    pub fn primary_category(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }
}

/// Search filters for catalog listings; name matching is substring,
/// case-insensitive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFilters {
    pub name: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodListResponse {
    pub foods: Vec<Food>,
    pub total_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreListResponse {
    pub stores: Vec<Store>,
    pub total_count: usize,
}
