use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn, Instrument};

use super::{attr_bool, attr_datetime, attr_opt_s, attr_s, dynamodb_span, map_dynamodb_error};
use crate::models::{AddressHistory, AddressKind, RepositoryResult};

/// Trait defining the interface for address data access operations.
/// Addresses are keyed by (member_id, address_id).
#[async_trait]
pub trait AddressRepository: Send + Sync {
    async fn find_addresses(&self, member_id: &str) -> RepositoryResult<Vec<AddressHistory>>;

    async fn find_primary_address(
        &self,
        member_id: &str,
    ) -> RepositoryResult<Option<AddressHistory>>;

    async fn save_address(&self, address: AddressHistory) -> RepositoryResult<AddressHistory>;
}

/// DynamoDB implementation of the AddressRepository trait
pub struct DynamoDbAddressRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl DynamoDbAddressRepository {
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            region,
        }
    }

    pub fn address_to_item(&self, address: &AddressHistory) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert(
            "member_id".to_string(),
            AttributeValue::S(address.member_id.clone()),
        );
        item.insert(
            "address_id".to_string(),
            AttributeValue::S(address.address_id.clone()),
        );
        item.insert("alias".to_string(), AttributeValue::S(address.alias.clone()));
        item.insert(
            "road_address".to_string(),
            AttributeValue::S(address.road_address.clone()),
        );
        if let Some(detail) = &address.detail {
            item.insert("detail".to_string(), AttributeValue::S(detail.clone()));
        }
        item.insert("kind".to_string(), AttributeValue::S(address.kind.to_string()));
        item.insert(
            "is_primary".to_string(),
            AttributeValue::Bool(address.is_primary),
        );
        item.insert(
            "created_at".to_string(),
            AttributeValue::S(address.created_at.to_rfc3339()),
        );
        item
    }

    pub fn item_to_address(
        &self,
        item: HashMap<String, AttributeValue>,
    ) -> RepositoryResult<AddressHistory> {
        let kind = attr_s(&item, "kind")?
            .parse::<AddressKind>()
            .unwrap_or(AddressKind::Etc);

        Ok(AddressHistory {
            address_id: attr_s(&item, "address_id")?,
            member_id: attr_s(&item, "member_id")?,
            alias: attr_s(&item, "alias")?,
            road_address: attr_s(&item, "road_address")?,
            detail: attr_opt_s(&item, "detail"),
            kind,
            is_primary: attr_bool(&item, "is_primary")?,
            created_at: attr_datetime(&item, "created_at")?,
        })
    }
}

#[async_trait]
impl AddressRepository for DynamoDbAddressRepository {
    #[instrument(skip(self), fields(table = %self.table_name, member_id = %member_id))]
    async fn find_addresses(&self, member_id: &str) -> RepositoryResult<Vec<AddressHistory>> {
        info!("Finding addresses");

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

        let mut addresses = Vec::new();
        if let Some(items) = response.items {
            for item in items {
                match self.item_to_address(item) {
                    Ok(address) => addresses.push(address),
                    Err(e) => {
                        warn!("Failed to parse address item: {}", e);
                        continue;
                    }
                }
            }
        }

        addresses.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        info!("Found {} addresses", addresses.len());
        Ok(addresses)
    }

    #[instrument(skip(self), fields(table = %self.table_name, member_id = %member_id))]
    async fn find_primary_address(
        &self,
        member_id: &str,
    ) -> RepositoryResult<Option<AddressHistory>> {
        let addresses = self.find_addresses(member_id).await?;
        Ok(addresses.into_iter().find(|a| a.is_primary))
    }

    #[instrument(skip(self, address), fields(table = %self.table_name, member_id = %address.member_id, address_id = %address.address_id))]
    async fn save_address(&self, address: AddressHistory) -> RepositoryResult<AddressHistory> {
        info!("Saving address");

        let item = self.address_to_item(&address);
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

        Ok(address)
    }
}
