use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, GlobalSecondaryIndex, KeySchemaElement, KeyType, Projection,
    ProjectionType, ScalarAttributeType, TableStatus,
};
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use super::expenditure_repository::EXPENDITURE_ID_INDEX;
use crate::config::DatabaseConfig;
use crate::models::{Food, Policy, RepositoryError, RepositoryResult, Store};

/// Manages DynamoDB table creation and seed data
pub struct TableManager {
    client: Arc<DynamoDbClient>,
}

impl TableManager {
    pub fn new(client: Arc<DynamoDbClient>) -> Self {
        Self { client }
    }

    /// Create every table the service uses, in parallel
    #[instrument(skip(self, config))]
    pub async fn create_all_tables(&self, config: &DatabaseConfig) -> RepositoryResult<()> {
        info!("Creating all tables");

        let results = tokio::join!(
            self.create_table(&config.members_table, "member_id", None),
            self.create_table(&config.credentials_table, "email", None),
            self.create_table(&config.addresses_table, "member_id", Some("address_id")),
            self.create_table(&config.policies_table, "policy_id", None),
            self.create_table(&config.agreements_table, "member_id", Some("policy_id")),
            self.create_table(&config.budgets_table, "member_id", Some("budget_key")),
            self.create_table(&config.carts_table, "member_id", Some("store_id")),
            self.create_expenditures_table(&config.expenditures_table),
            self.create_table(&config.foods_table, "food_id", None),
            self.create_table(&config.stores_table, "store_id", None),
        );

        results.0?;
        results.1?;
        results.2?;
        results.3?;
        results.4?;
        results.5?;
        results.6?;
        results.7?;
        results.8?;
        results.9?;

        info!("All tables created successfully");
        Ok(())
    }

    /// Create a pay-per-request table with a string hash key and an
    /// optional string range key. No-op when the table already exists.
    #[instrument(skip(self), fields(table_name = %table_name))]
    pub async fn create_table(
        &self,
        table_name: &str,
        hash_key: &str,
        range_key: Option<&str>,
    ) -> RepositoryResult<()> {
        if self.table_exists(table_name).await? {
            info!("Table {} already exists", table_name);
            return Ok(());
        }

        let mut attribute_definitions = vec![string_attribute(hash_key)?];
        let mut key_schema = vec![key_element(hash_key, KeyType::Hash)?];

        if let Some(range_key) = range_key {
            attribute_definitions.push(string_attribute(range_key)?);
            key_schema.push(key_element(range_key, KeyType::Range)?);
        }

        self.client
            .create_table()
            .table_name(table_name)
            .set_attribute_definitions(Some(attribute_definitions))
            .set_key_schema(Some(key_schema))
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        info!("Table creation initiated, waiting for table to become active");
        self.wait_for_table_active(table_name).await?;
        info!("Table {} created successfully", table_name);

        Ok(())
    }

    /// Create the expenditures table: keyed (member_id, expenditure_id)
    /// with a global index on expenditure_id so a record can be resolved
    /// by id alone for ownership checks.
    #[instrument(skip(self), fields(table_name = %table_name))]
    pub async fn create_expenditures_table(&self, table_name: &str) -> RepositoryResult<()> {
        if self.table_exists(table_name).await? {
            info!("Table {} already exists", table_name);
            return Ok(());
        }

        let index = GlobalSecondaryIndex::builder()
            .index_name(EXPENDITURE_ID_INDEX)
            .key_schema(key_element("expenditure_id", KeyType::Hash)?)
            .projection(
                Projection::builder()
                    .projection_type(ProjectionType::All)
                    .build(),
            )
            .build()
            .map_err(|e| RepositoryError::AwsSdk {
                message: format!("Failed to build index definition: {}", e),
            })?;

        self.client
            .create_table()
            .table_name(table_name)
            .set_attribute_definitions(Some(vec![
                string_attribute("member_id")?,
                string_attribute("expenditure_id")?,
            ]))
            .set_key_schema(Some(vec![
                key_element("member_id", KeyType::Hash)?,
                key_element("expenditure_id", KeyType::Range)?,
            ]))
            .global_secondary_indexes(index)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        info!("Table creation initiated, waiting for table to become active");
        self.wait_for_table_active(table_name).await?;
        info!("Table {} created successfully", table_name);

        Ok(())
    }

    /// Check if a table exists
    #[instrument(skip(self), fields(table_name = %table_name))]
    pub async fn table_exists(&self, table_name: &str) -> RepositoryResult<bool> {
        match self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let error_string = e.to_string();
                let error_debug = format!("{:?}", e);

                if error_string.contains("ResourceNotFoundException")
                    || error_string.contains("Requested resource not found")
                    || error_debug.contains("ResourceNotFoundException")
                {
                    info!("Table {} does not exist", table_name);
                    Ok(false)
                } else {
                    error!("Error checking table existence: {}", e);
                    Err(RepositoryError::ConnectionFailed)
                }
            }
        }
    }

    /// Wait for a table to become active
    #[instrument(skip(self), fields(table_name = %table_name))]
    async fn wait_for_table_active(&self, table_name: &str) -> RepositoryResult<()> {
        let mut attempts = 0;
        let max_attempts = 30; // 5 minutes with 10-second intervals
        let wait_duration = Duration::from_secs(10);

        loop {
            match self
                .client
                .describe_table()
                .table_name(table_name)
                .send()
                .await
            {
                Ok(response) => {
                    if let Some(table) = response.table {
                        match table.table_status {
                            Some(TableStatus::Active) => {
                                info!("Table {} is now active", table_name);
                                return Ok(());
                            }
                            Some(status) => {
                                info!("Table {} status: {:?}, waiting...", table_name, status);
                            }
                            None => {
                                warn!("Table {} status unknown, waiting...", table_name);
                            }
                        }
                    }
                }
                Err(e) => {
                    error!("Error checking table status: {}", e);
                    return Err(self.map_dynamodb_error(e.into()));
                }
            }

            attempts += 1;
            if attempts >= max_attempts {
                error!("Timeout waiting for table {} to become active", table_name);
                return Err(RepositoryError::Timeout);
            }

            tokio::time::sleep(wait_duration).await;
        }
    }

    /// Delete a table (for testing/cleanup)
    #[instrument(skip(self), fields(table_name = %table_name))]
    pub async fn delete_table(&self, table_name: &str) -> RepositoryResult<()> {
        if !self.table_exists(table_name).await? {
            info!("Table {} does not exist, nothing to delete", table_name);
            return Ok(());
        }

        self.client
            .delete_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        info!("Table {} deletion initiated", table_name);
        Ok(())
    }

    fn map_dynamodb_error(&self, error: DynamoDbError) -> RepositoryError {
        error!("DynamoDB error: {:?}", error);
        RepositoryError::AwsSdk {
            message: error.to_string(),
        }
    }
}

fn string_attribute(name: &str) -> RepositoryResult<AttributeDefinition> {
    AttributeDefinition::builder()
        .attribute_name(name)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(|e| RepositoryError::AwsSdk {
            message: format!("Failed to build attribute definition: {}", e),
        })
}

fn key_element(name: &str, key_type: KeyType) -> RepositoryResult<KeySchemaElement> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(key_type)
        .build()
        .map_err(|e| RepositoryError::AwsSdk {
            message: format!("Failed to build key schema: {}", e),
        })
}

/// Baseline policies every deployment seeds
pub fn seed_policies() -> Vec<Policy> {
    vec![
        Policy {
            policy_id: "terms-of-service".to_string(),
            title: "서비스 이용약관".to_string(),
            content: "서비스 이용약관 동의".to_string(),
            required: true,
        },
        Policy {
            policy_id: "privacy".to_string(),
            title: "개인정보 처리방침".to_string(),
            content: "개인정보 수집 및 이용 동의".to_string(),
            required: true,
        },
        Policy {
            policy_id: "marketing".to_string(),
            title: "마케팅 정보 수신".to_string(),
            content: "마케팅 정보 수신 동의 (선택)".to_string(),
            required: false,
        },
    ]
}

/// Sample catalog data for local development
pub fn seed_catalog() -> (Vec<Store>, Vec<Food>) {
    let stores = vec![
        Store {
            store_id: "S001".to_string(),
            name: "김밥천국 봉천점".to_string(),
            road_address: "서울시 관악구 봉천로 123".to_string(),
            categories: vec!["한식".to_string(), "분식".to_string()],
            phone_number: Some("02-1234-5678".to_string()),
        },
        Store {
            store_id: "S002".to_string(),
            name: "한솥도시락 신림점".to_string(),
            road_address: "서울시 관악구 신림로 45".to_string(),
            categories: vec!["도시락".to_string()],
            phone_number: None,
        },
    ];

    let foods = vec![
        Food {
            food_id: "F001".to_string(),
            name: "김치찌개".to_string(),
            category: "한식".to_string(),
            price: Some(9_000),
            average_price: 8_500,
            store_id: Some("S001".to_string()),
        },
        Food {
            food_id: "F002".to_string(),
            name: "참치김밥".to_string(),
            category: "분식".to_string(),
            price: Some(4_500),
            average_price: 4_000,
            store_id: Some("S001".to_string()),
        },
        Food {
            food_id: "F003".to_string(),
            name: "치킨마요 도시락".to_string(),
            category: "도시락".to_string(),
            price: None,
            average_price: 6_000,
            store_id: Some("S002".to_string()),
        },
    ];

    (stores, foods)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_client;

    #[test]
    fn test_table_manager_creation() {
        let _manager = TableManager::new(test_client());
    }

    #[test]
    fn test_seed_policies_mark_required() {
        let policies = seed_policies();
        assert!(policies.iter().filter(|p| p.required).count() >= 2);
        assert!(policies.iter().any(|p| !p.required));
    }

    #[test]
    fn test_seed_catalog_references_stores() {
        let (stores, foods) = seed_catalog();
        for food in &foods {
            if let Some(store_id) = &food.store_id {
                assert!(stores.iter().any(|s| &s.store_id == store_id));
            }
        }
    }
}
