use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn, Instrument};

use super::{attr_n, attr_opt_s, attr_s, dynamodb_span, map_dynamodb_error};
use crate::models::{CatalogFilters, Food, RepositoryResult, Store};

/// Trait defining the interface for catalog (foods and stores) data access
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn find_food(&self, food_id: &str) -> RepositoryResult<Option<Food>>;

    async fn find_foods(&self, filters: &CatalogFilters) -> RepositoryResult<Vec<Food>>;

    async fn save_food(&self, food: Food) -> RepositoryResult<Food>;

    async fn find_store(&self, store_id: &str) -> RepositoryResult<Option<Store>>;

    async fn find_stores(&self, filters: &CatalogFilters) -> RepositoryResult<Vec<Store>>;

    async fn save_store(&self, store: Store) -> RepositoryResult<Store>;
}

/// DynamoDB implementation of the CatalogRepository trait
pub struct DynamoDbCatalogRepository {
    client: Arc<DynamoDbClient>,
    foods_table: String,
    stores_table: String,
    region: String,
}

impl DynamoDbCatalogRepository {
    pub fn new(
        client: Arc<DynamoDbClient>,
        foods_table: String,
        stores_table: String,
        region: String,
    ) -> Self {
        Self {
            client,
            foods_table,
            stores_table,
            region,
        }
    }

    pub fn food_to_item(&self, food: &Food) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert(
            "food_id".to_string(),
            AttributeValue::S(food.food_id.clone()),
        );
        item.insert("name".to_string(), AttributeValue::S(food.name.clone()));
        item.insert(
            "category".to_string(),
            AttributeValue::S(food.category.clone()),
        );
        if let Some(price) = food.price {
            item.insert("price".to_string(), AttributeValue::N(price.to_string()));
        }
        item.insert(
            "average_price".to_string(),
            AttributeValue::N(food.average_price.to_string()),
        );
        if let Some(store_id) = &food.store_id {
            item.insert("store_id".to_string(), AttributeValue::S(store_id.clone()));
        }
        item
    }

    pub fn item_to_food(&self, item: HashMap<String, AttributeValue>) -> RepositoryResult<Food> {
        let price = item
            .get("price")
            .and_then(|v| v.as_n().ok())
            .and_then(|s| s.parse().ok());

        Ok(Food {
            food_id: attr_s(&item, "food_id")?,
            name: attr_s(&item, "name")?,
            category: attr_s(&item, "category")?,
            price,
            average_price: attr_n(&item, "average_price")?,
            store_id: attr_opt_s(&item, "store_id"),
        })
    }

    pub fn store_to_item(&self, store: &Store) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert(
            "store_id".to_string(),
            AttributeValue::S(store.store_id.clone()),
        );
        item.insert("name".to_string(), AttributeValue::S(store.name.clone()));
        item.insert(
            "road_address".to_string(),
            AttributeValue::S(store.road_address.clone()),
        );
        item.insert(
            "categories".to_string(),
            AttributeValue::L(
                store
                    .categories
                    .iter()
                    .map(|c| AttributeValue::S(c.clone()))
                    .collect(),
            ),
        );
        if let Some(phone_number) = &store.phone_number {
            item.insert(
                "phone_number".to_string(),
                AttributeValue::S(phone_number.clone()),
            );
        }
        item
    }

    pub fn item_to_store(&self, item: HashMap<String, AttributeValue>) -> RepositoryResult<Store> {
        let categories = item
            .get("categories")
            .and_then(|v| v.as_l().ok())
            .map(|list| {
                list.iter()
                    .filter_map(|c| c.as_s().ok().cloned())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Store {
            store_id: attr_s(&item, "store_id")?,
            name: attr_s(&item, "name")?,
            road_address: attr_s(&item, "road_address")?,
            categories,
            phone_number: attr_opt_s(&item, "phone_number"),
        })
    }

    fn name_matches(name: &str, filter: &Option<String>) -> bool {
        match filter {
            Some(needle) => name.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

#[async_trait]
impl CatalogRepository for DynamoDbCatalogRepository {
    #[instrument(skip(self), fields(table = %self.foods_table, food_id = %food_id))]
    async fn find_food(&self, food_id: &str) -> RepositoryResult<Option<Food>> {
        info!("Finding food");

        let get_span = dynamodb_span("GetItem", &self.foods_table, &self.region);

        let response = async {
            self.client
                .get_item()
                .table_name(&self.foods_table)
                .key("food_id", AttributeValue::S(food_id.to_string()))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))
        }
        .instrument(get_span)
        .await?;

        match response.item {
            Some(item) => Ok(Some(self.item_to_food(item)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, filters), fields(table = %self.foods_table))]
    async fn find_foods(&self, filters: &CatalogFilters) -> RepositoryResult<Vec<Food>> {
        info!("Finding foods");

        let scan_span = dynamodb_span("Scan", &self.foods_table, &self.region);

        let mut scan = self.client.scan().table_name(&self.foods_table);
        if let Some(category) = &filters.category {
            scan = scan
                .filter_expression("category = :category")
                .expression_attribute_values(":category", AttributeValue::S(category.clone()));
        }

        let response = async { scan.send().await.map_err(|e| map_dynamodb_error(e.into())) }
            .instrument(scan_span)
            .await?;

        let mut foods = Vec::new();
        if let Some(items) = response.items {
            for item in items {
                match self.item_to_food(item) {
                    Ok(food) => {
                        if Self::name_matches(&food.name, &filters.name) {
                            foods.push(food);
                        }
                    }
                    Err(e) => {
                        warn!("Failed to parse food item: {}", e);
                        continue;
                    }
                }
            }
        }

        foods.sort_by(|a, b| a.name.cmp(&b.name));

        info!("Found {} foods", foods.len());
        Ok(foods)
    }

    #[instrument(skip(self, food), fields(table = %self.foods_table, food_id = %food.food_id))]
    async fn save_food(&self, food: Food) -> RepositoryResult<Food> {
        info!("Saving food");

        let item = self.food_to_item(&food);
        let put_span = dynamodb_span("PutItem", &self.foods_table, &self.region);

        async {
            self.client
                .put_item()
                .table_name(&self.foods_table)
                .set_item(Some(item))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))
        }
        .instrument(put_span)
        .await?;

        Ok(food)
    }

    #[instrument(skip(self), fields(table = %self.stores_table, store_id = %store_id))]
    async fn find_store(&self, store_id: &str) -> RepositoryResult<Option<Store>> {
        info!("Finding store");

        let get_span = dynamodb_span("GetItem", &self.stores_table, &self.region);

        let response = async {
            self.client
                .get_item()
                .table_name(&self.stores_table)
                .key("store_id", AttributeValue::S(store_id.to_string()))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))
        }
        .instrument(get_span)
        .await?;

        match response.item {
            Some(item) => Ok(Some(self.item_to_store(item)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, filters), fields(table = %self.stores_table))]
    async fn find_stores(&self, filters: &CatalogFilters) -> RepositoryResult<Vec<Store>> {
        info!("Finding stores");

        let scan_span = dynamodb_span("Scan", &self.stores_table, &self.region);

        let response = async {
            self.client
                .scan()
                .table_name(&self.stores_table)
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))
        }
        .instrument(scan_span)
        .await?;

        let mut stores = Vec::new();
        if let Some(items) = response.items {
            for item in items {
                match self.item_to_store(item) {
                    Ok(store) => {
                        let category_ok = match &filters.category {
                            Some(category) => store.categories.iter().any(|c| c == category),
                            None => true,
                        };
                        if category_ok && Self::name_matches(&store.name, &filters.name) {
                            stores.push(store);
                        }
                    }
                    Err(e) => {
                        warn!("Failed to parse store item: {}", e);
                        continue;
                    }
                }
            }
        }

        stores.sort_by(|a, b| a.name.cmp(&b.name));

        info!("Found {} stores", stores.len());
        Ok(stores)
    }

    #[instrument(skip(self, store), fields(table = %self.stores_table, store_id = %store.store_id))]
    async fn save_store(&self, store: Store) -> RepositoryResult<Store> {
        info!("Saving store");

        let item = self.store_to_item(&store);
        let put_span = dynamodb_span("PutItem", &self.stores_table, &self.region);

        async {
            self.client
                .put_item()
                .table_name(&self.stores_table)
                .set_item(Some(item))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))
        }
        .instrument(put_span)
        .await?;

        Ok(store)
    }
}
