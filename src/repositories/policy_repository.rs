use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn, Instrument};

use super::{attr_bool, attr_datetime, attr_s, dynamodb_span, map_dynamodb_error};
use crate::models::{Policy, PolicyAgreement, RepositoryResult};

/// Trait defining the interface for policy and agreement data access.
/// Policies are keyed by policy_id; agreements by (member_id, policy_id).
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    async fn find_policies(&self) -> RepositoryResult<Vec<Policy>>;

    async fn save_policy(&self, policy: Policy) -> RepositoryResult<Policy>;

    async fn find_agreements(&self, member_id: &str) -> RepositoryResult<Vec<PolicyAgreement>>;

    async fn save_agreement(&self, agreement: PolicyAgreement)
        -> RepositoryResult<PolicyAgreement>;
}

/// DynamoDB implementation of the PolicyRepository trait
pub struct DynamoDbPolicyRepository {
    client: Arc<DynamoDbClient>,
    policies_table: String,
    agreements_table: String,
    region: String,
}

impl DynamoDbPolicyRepository {
    pub fn new(
        client: Arc<DynamoDbClient>,
        policies_table: String,
        agreements_table: String,
        region: String,
    ) -> Self {
        Self {
            client,
            policies_table,
            agreements_table,
            region,
        }
    }

    pub fn policy_to_item(&self, policy: &Policy) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert(
            "policy_id".to_string(),
            AttributeValue::S(policy.policy_id.clone()),
        );
        item.insert("title".to_string(), AttributeValue::S(policy.title.clone()));
        item.insert(
            "content".to_string(),
            AttributeValue::S(policy.content.clone()),
        );
        item.insert(
            "required".to_string(),
            AttributeValue::Bool(policy.required),
        );
        item
    }

    pub fn item_to_policy(
        &self,
        item: HashMap<String, AttributeValue>,
    ) -> RepositoryResult<Policy> {
        Ok(Policy {
            policy_id: attr_s(&item, "policy_id")?,
            title: attr_s(&item, "title")?,
            content: attr_s(&item, "content")?,
            required: attr_bool(&item, "required")?,
        })
    }

    pub fn agreement_to_item(
        &self,
        agreement: &PolicyAgreement,
    ) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert(
            "member_id".to_string(),
            AttributeValue::S(agreement.member_id.clone()),
        );
        item.insert(
            "policy_id".to_string(),
            AttributeValue::S(agreement.policy_id.clone()),
        );
        item.insert("agreed".to_string(), AttributeValue::Bool(agreement.agreed));
        item.insert(
            "agreed_at".to_string(),
            AttributeValue::S(agreement.agreed_at.to_rfc3339()),
        );
        item
    }

    pub fn item_to_agreement(
        &self,
        item: HashMap<String, AttributeValue>,
    ) -> RepositoryResult<PolicyAgreement> {
        Ok(PolicyAgreement {
            member_id: attr_s(&item, "member_id")?,
            policy_id: attr_s(&item, "policy_id")?,
            agreed: attr_bool(&item, "agreed")?,
            agreed_at: attr_datetime(&item, "agreed_at")?,
        })
    }
}

#[async_trait]
impl PolicyRepository for DynamoDbPolicyRepository {
    #[instrument(skip(self), fields(table = %self.policies_table))]
    async fn find_policies(&self) -> RepositoryResult<Vec<Policy>> {
        info!("Finding all policies");

        let scan_span = dynamodb_span("Scan", &self.policies_table, &self.region);

        let response = async {
            self.client
                .scan()
                .table_name(&self.policies_table)
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))
        }
        .instrument(scan_span)
        .await?;

        let mut policies = Vec::new();
        if let Some(items) = response.items {
            for item in items {
                match self.item_to_policy(item) {
                    Ok(policy) => policies.push(policy),
                    Err(e) => {
                        warn!("Failed to parse policy item: {}", e);
                        continue;
                    }
                }
            }
        }

        info!("Found {} policies", policies.len());
        Ok(policies)
    }

    #[instrument(skip(self, policy), fields(table = %self.policies_table, policy_id = %policy.policy_id))]
    async fn save_policy(&self, policy: Policy) -> RepositoryResult<Policy> {
        info!("Saving policy");

        let item = self.policy_to_item(&policy);
        let put_span = dynamodb_span("PutItem", &self.policies_table, &self.region);

        async {
            self.client
                .put_item()
                .table_name(&self.policies_table)
                .set_item(Some(item))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))
        }
        .instrument(put_span)
        .await?;

        Ok(policy)
    }

    #[instrument(skip(self), fields(table = %self.agreements_table, member_id = %member_id))]
    async fn find_agreements(&self, member_id: &str) -> RepositoryResult<Vec<PolicyAgreement>> {
        info!("Finding policy agreements");

        let query_span = dynamodb_span("Query", &self.agreements_table, &self.region);

        let response = async {
            self.client
                .query()
                .table_name(&self.agreements_table)
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

        let mut agreements = Vec::new();
        if let Some(items) = response.items {
            for item in items {
                match self.item_to_agreement(item) {
                    Ok(agreement) => agreements.push(agreement),
                    Err(e) => {
                        warn!("Failed to parse agreement item: {}", e);
                        continue;
                    }
                }
            }
        }

        Ok(agreements)
    }

    #[instrument(skip(self, agreement), fields(table = %self.agreements_table, member_id = %agreement.member_id, policy_id = %agreement.policy_id))]
    async fn save_agreement(
        &self,
        agreement: PolicyAgreement,
    ) -> RepositoryResult<PolicyAgreement> {
        info!("Saving policy agreement");

        let item = self.agreement_to_item(&agreement);
        let put_span = dynamodb_span("PutItem", &self.agreements_table, &self.region);

        async {
            self.client
                .put_item()
                .table_name(&self.agreements_table)
                .set_item(Some(item))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))
        }
        .instrument(put_span)
        .await?;

        Ok(agreement)
    }
}
