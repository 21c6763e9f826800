// Repositories module - data access layer

pub mod address_repository;
pub mod budget_repository;
pub mod cart_repository;
pub mod catalog_repository;
pub mod expenditure_repository;
pub mod member_repository;
pub mod policy_repository;
pub mod table_manager;

pub use address_repository::{AddressRepository, DynamoDbAddressRepository};
pub use budget_repository::{BudgetRepository, DynamoDbBudgetRepository};
pub use cart_repository::{CartRepository, DynamoDbCartRepository};
pub use catalog_repository::{CatalogRepository, DynamoDbCatalogRepository};
pub use expenditure_repository::{DynamoDbExpenditureRepository, ExpenditureRepository};
pub use member_repository::{DynamoDbMemberRepository, MemberRepository};
pub use policy_repository::{DynamoDbPolicyRepository, PolicyRepository};
pub use table_manager::{seed_catalog, seed_policies, TableManager};

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Error as DynamoDbError;
use std::collections::HashMap;
use tracing::error;

use crate::models::{RepositoryError, RepositoryResult};

/// Create a DynamoDB subsegment span with X-Ray and OTel attributes
pub(crate) fn dynamodb_span(operation: &str, table_name: &str, region: &str) -> tracing::Span {
    tracing::info_span!(
        "DynamoDB",
        "aws.service" = "DynamoDB",
        "aws.operation" = operation,
        "aws.region" = %region,
        "aws.dynamodb.table_name" = %table_name,
        "aws.agent" = "rust-aws-sdk",
        "aws.remote.service" = "AWS::DynamoDB",
        "aws.remote.operation" = operation,
        "aws.remote.resource.type" = "AWS::DynamoDB::Table",
        "aws.remote.resource.identifier" = %table_name,
        "otel.kind" = "client",
        "otel.name" = format!("DynamoDB.{}", operation),
        "rpc.system" = "aws-api",
        "rpc.service" = "AmazonDynamoDBv2",
        "rpc.method" = operation,
        "db.system" = "dynamodb",
        "db.name" = %table_name,
        "db.operation" = operation,
        "component" = "aws-sdk-dynamodb",
    )
}

pub(crate) fn map_dynamodb_error(error: DynamoDbError) -> RepositoryError {
    error!("DynamoDB error: {:?}", error);
    RepositoryError::AwsSdk {
        message: error.to_string(),
    }
}

// Attribute extraction helpers shared by the item converters

pub(crate) fn attr_s(
    item: &HashMap<String, AttributeValue>,
    name: &str,
) -> RepositoryResult<String> {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| RepositoryError::InvalidQuery {
            message: format!("Missing {}", name),
        })
}

pub(crate) fn attr_opt_s(item: &HashMap<String, AttributeValue>, name: &str) -> Option<String> {
    item.get(name).and_then(|v| v.as_s().ok()).cloned()
}

pub(crate) fn attr_n<T: std::str::FromStr>(
    item: &HashMap<String, AttributeValue>,
    name: &str,
) -> RepositoryResult<T> {
    item.get(name)
        .and_then(|v| v.as_n().ok())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| RepositoryError::InvalidQuery {
            message: format!("Invalid {}", name),
        })
}

pub(crate) fn attr_bool(
    item: &HashMap<String, AttributeValue>,
    name: &str,
) -> RepositoryResult<bool> {
    item.get(name)
        .and_then(|v| v.as_bool().ok())
        .copied()
        .ok_or_else(|| RepositoryError::InvalidQuery {
            message: format!("Invalid {}", name),
        })
}

pub(crate) fn attr_datetime(
    item: &HashMap<String, AttributeValue>,
    name: &str,
) -> RepositoryResult<chrono::DateTime<chrono::Utc>> {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .ok_or_else(|| RepositoryError::InvalidQuery {
            message: format!("Invalid {}", name),
        })
}

#[cfg(test)]
pub(crate) fn test_client() -> std::sync::Arc<aws_sdk_dynamodb::Client> {
    let config = aws_sdk_dynamodb::Config::builder()
        .region(aws_sdk_dynamodb::config::Region::new("us-east-1"))
        .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
        .build();
    std::sync::Arc::new(aws_sdk_dynamodb::Client::from_conf(config))
}
