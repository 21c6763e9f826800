use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn, Instrument};

use super::{attr_datetime, attr_n, attr_s, dynamodb_span, map_dynamodb_error};
use crate::models::{Cart, CartItem, RepositoryResult};

/// Trait defining the interface for cart data access operations.
/// Carts are keyed by (member_id, store_id).
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Find a member's cart at a specific store
    async fn find_cart(&self, member_id: &str, store_id: &str) -> RepositoryResult<Option<Cart>>;

    /// Find all carts a member currently holds
    async fn find_carts(&self, member_id: &str) -> RepositoryResult<Vec<Cart>>;

    /// Save a cart (create or update)
    async fn save_cart(&self, cart: Cart) -> RepositoryResult<Cart>;

    /// Delete a cart
    async fn delete_cart(&self, member_id: &str, store_id: &str) -> RepositoryResult<()>;
}

/// DynamoDB implementation of the CartRepository trait
pub struct DynamoDbCartRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl DynamoDbCartRepository {
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            region,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Convert a Cart struct to DynamoDB attribute values
    pub fn cart_to_item(&self, cart: &Cart) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();

        item.insert(
            "member_id".to_string(),
            AttributeValue::S(cart.member_id.clone()),
        );
        item.insert(
            "store_id".to_string(),
            AttributeValue::S(cart.store_id.clone()),
        );

        let items: Vec<AttributeValue> = cart
            .items
            .iter()
            .map(|cart_item| {
                let mut item_map = HashMap::new();
                item_map.insert(
                    "food_id".to_string(),
                    AttributeValue::S(cart_item.food_id.clone()),
                );
                item_map.insert(
                    "food_name".to_string(),
                    AttributeValue::S(cart_item.food_name.clone()),
                );
                item_map.insert(
                    "price".to_string(),
                    AttributeValue::N(cart_item.price.to_string()),
                );
                item_map.insert(
                    "quantity".to_string(),
                    AttributeValue::N(cart_item.quantity.to_string()),
                );
                AttributeValue::M(item_map)
            })
            .collect();

        item.insert("items".to_string(), AttributeValue::L(items));
        item.insert(
            "created_at".to_string(),
            AttributeValue::S(cart.created_at.to_rfc3339()),
        );
        item.insert(
            "updated_at".to_string(),
            AttributeValue::S(cart.updated_at.to_rfc3339()),
        );

        item
    }

    /// Convert DynamoDB item to Cart struct
    pub fn item_to_cart(&self, item: HashMap<String, AttributeValue>) -> RepositoryResult<Cart> {
        let member_id = attr_s(&item, "member_id")?;
        let store_id = attr_s(&item, "store_id")?;

        let items = item
            .get("items")
            .and_then(|v| v.as_l().ok())
            .map(|list| {
                list.iter()
                    .filter_map(|item_attr| {
                        item_attr
                            .as_m()
                            .ok()
                            .and_then(|m| self.map_to_cart_item(m).ok())
                    })
                    .collect()
            })
            .unwrap_or_default();

        let created_at = attr_datetime(&item, "created_at")?;
        // missing updated_at falls back to created_at
        let updated_at = attr_datetime(&item, "updated_at").unwrap_or(created_at);

        Ok(Cart {
            member_id,
            store_id,
            items,
            created_at,
            updated_at,
        })
    }

    pub fn map_to_cart_item(
        &self,
        item_map: &HashMap<String, AttributeValue>,
    ) -> RepositoryResult<CartItem> {
        Ok(CartItem {
            food_id: attr_s(item_map, "food_id")?,
            food_name: attr_s(item_map, "food_name")?,
            price: attr_n(item_map, "price")?,
            quantity: attr_n(item_map, "quantity")?,
        })
    }
}

#[async_trait]
impl CartRepository for DynamoDbCartRepository {
    #[instrument(skip(self), fields(table = %self.table_name, member_id = %member_id, store_id = %store_id))]
    async fn find_cart(&self, member_id: &str, store_id: &str) -> RepositoryResult<Option<Cart>> {
        info!("Finding cart");

        let get_span = dynamodb_span("GetItem", &self.table_name, &self.region);

        let response = async {
            self.client
                .get_item()
                .table_name(&self.table_name)
                .key("member_id", AttributeValue::S(member_id.to_string()))
                .key("store_id", AttributeValue::S(store_id.to_string()))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))
        }
        .instrument(get_span)
        .await?;

        match response.item {
            Some(item) => {
                let cart = self.item_to_cart(item)?;
                info!("Cart found with {} items", cart.items.len());
                Ok(Some(cart))
            }
            None => {
                info!("Cart not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self), fields(table = %self.table_name, member_id = %member_id))]
    async fn find_carts(&self, member_id: &str) -> RepositoryResult<Vec<Cart>> {
        info!("Finding all carts for member");

        let query_span = dynamodb_span("Query", &self.table_name, &self.region);

        let response = async {
            self.client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("member_id = :member_id")
                .expression_attribute_values(
                    ":member_id",
                    AttributeValue::S(member_id.to_string()),
                )
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))
        }
        .instrument(query_span)
        .await?;

        let mut carts = Vec::new();
        if let Some(items) = response.items {
            for item in items {
                match self.item_to_cart(item) {
                    Ok(cart) => carts.push(cart),
                    Err(e) => {
                        warn!("Failed to parse cart item: {}", e);
                        continue;
                    }
                }
            }
        }

        info!("Found {} carts", carts.len());
        Ok(carts)
    }

    #[instrument(skip(self, cart), fields(table = %self.table_name, member_id = %cart.member_id, store_id = %cart.store_id, item_count = cart.items.len()))]
    async fn save_cart(&self, cart: Cart) -> RepositoryResult<Cart> {
        info!("Saving cart");

        let item = self.cart_to_item(&cart);
        let put_span = dynamodb_span("PutItem", &self.table_name, &self.region);

        async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(item))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))
        }
        .instrument(put_span)
        .await?;

        info!("Cart saved successfully");
        Ok(cart)
    }

    #[instrument(skip(self), fields(table = %self.table_name, member_id = %member_id, store_id = %store_id))]
    async fn delete_cart(&self, member_id: &str, store_id: &str) -> RepositoryResult<()> {
        info!("Deleting cart");

        let delete_span = dynamodb_span("DeleteItem", &self.table_name, &self.region);

        async {
            self.client
                .delete_item()
                .table_name(&self.table_name)
                .key("member_id", AttributeValue::S(member_id.to_string()))
                .key("store_id", AttributeValue::S(store_id.to_string()))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))?;

            info!("Cart deleted successfully");
            Ok(())
        }
        .instrument(delete_span)
        .await
    }
}
