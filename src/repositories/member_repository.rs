use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, Instrument};

use super::{attr_bool, attr_datetime, attr_n, attr_s, dynamodb_span, map_dynamodb_error};
use crate::models::{Member, MemberCredentials, RecommendationType, RepositoryResult};

/// Trait defining the interface for member and credential data access.
/// Members are keyed by member_id; credentials are keyed by email.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn find_member(&self, member_id: &str) -> RepositoryResult<Option<Member>>;

    async fn find_member_by_email(&self, email: &str) -> RepositoryResult<Option<Member>>;

    async fn nickname_exists(&self, nickname: &str) -> RepositoryResult<bool>;

    async fn save_member(&self, member: Member) -> RepositoryResult<Member>;

    async fn find_credentials(&self, email: &str) -> RepositoryResult<Option<MemberCredentials>>;

    async fn save_credentials(
        &self,
        credentials: MemberCredentials,
    ) -> RepositoryResult<MemberCredentials>;
}

/// DynamoDB implementation of the MemberRepository trait.
/// Uses a members table plus a credentials table.
pub struct DynamoDbMemberRepository {
    client: Arc<DynamoDbClient>,
    members_table: String,
    credentials_table: String,
    region: String,
}

impl DynamoDbMemberRepository {
    pub fn new(
        client: Arc<DynamoDbClient>,
        members_table: String,
        credentials_table: String,
        region: String,
    ) -> Self {
        Self {
            client,
            members_table,
            credentials_table,
            region,
        }
    }

    pub fn member_to_item(&self, member: &Member) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert(
            "member_id".to_string(),
            AttributeValue::S(member.member_id.clone()),
        );
        item.insert("email".to_string(), AttributeValue::S(member.email.clone()));
        item.insert("name".to_string(), AttributeValue::S(member.name.clone()));
        item.insert(
            "nickname".to_string(),
            AttributeValue::S(member.nickname.clone()),
        );
        item.insert(
            "recommendation_type".to_string(),
            AttributeValue::S(member.recommendation_type.to_string()),
        );
        item.insert(
            "created_at".to_string(),
            AttributeValue::S(member.created_at.to_rfc3339()),
        );
        item
    }

    pub fn item_to_member(
        &self,
        item: HashMap<String, AttributeValue>,
    ) -> RepositoryResult<Member> {
        let recommendation_type = attr_s(&item, "recommendation_type")?
            .parse::<RecommendationType>()
            .unwrap_or(RecommendationType::Balanced);

        Ok(Member {
            member_id: attr_s(&item, "member_id")?,
            email: attr_s(&item, "email")?,
            name: attr_s(&item, "name")?,
            nickname: attr_s(&item, "nickname")?,
            recommendation_type,
            created_at: attr_datetime(&item, "created_at")?,
        })
    }

    pub fn credentials_to_item(
        &self,
        credentials: &MemberCredentials,
    ) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert(
            "email".to_string(),
            AttributeValue::S(credentials.email.clone()),
        );
        item.insert(
            "member_id".to_string(),
            AttributeValue::S(credentials.member_id.clone()),
        );
        item.insert(
            "password_hash".to_string(),
            AttributeValue::S(credentials.password_hash.clone()),
        );
        item.insert(
            "failed_attempts".to_string(),
            AttributeValue::N(credentials.failed_attempts.to_string()),
        );
        item.insert(
            "locked".to_string(),
            AttributeValue::Bool(credentials.locked),
        );
        item
    }

    pub fn item_to_credentials(
        &self,
        item: HashMap<String, AttributeValue>,
    ) -> RepositoryResult<MemberCredentials> {
        Ok(MemberCredentials {
            email: attr_s(&item, "email")?,
            member_id: attr_s(&item, "member_id")?,
            password_hash: attr_s(&item, "password_hash")?,
            failed_attempts: attr_n(&item, "failed_attempts")?,
            locked: attr_bool(&item, "locked")?,
        })
    }
}

#[async_trait]
impl MemberRepository for DynamoDbMemberRepository {
    #[instrument(skip(self), fields(table = %self.members_table, member_id = %member_id))]
    async fn find_member(&self, member_id: &str) -> RepositoryResult<Option<Member>> {
        info!("Finding member");

        let get_span = dynamodb_span("GetItem", &self.members_table, &self.region);

        let response = async {
            self.client
                .get_item()
                .table_name(&self.members_table)
                .key("member_id", AttributeValue::S(member_id.to_string()))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))
        }
        .instrument(get_span)
        .await?;

        match response.item {
            Some(item) => Ok(Some(self.item_to_member(item)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(table = %self.members_table))]
    async fn find_member_by_email(&self, email: &str) -> RepositoryResult<Option<Member>> {
        info!("Finding member by email");

        let scan_span = dynamodb_span("Scan", &self.members_table, &self.region);

        let response = async {
            self.client
                .scan()
                .table_name(&self.members_table)
                .filter_expression("email = :email")
                .expression_attribute_values(":email", AttributeValue::S(email.to_string()))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))
        }
        .instrument(scan_span)
        .await?;

        match response.items.and_then(|mut items| items.pop()) {
            Some(item) => Ok(Some(self.item_to_member(item)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(table = %self.members_table, nickname = %nickname))]
    async fn nickname_exists(&self, nickname: &str) -> RepositoryResult<bool> {
        info!("Checking nickname uniqueness");

        let scan_span = dynamodb_span("Scan", &self.members_table, &self.region);

        let response = async {
            self.client
                .scan()
                .table_name(&self.members_table)
                .filter_expression("nickname = :nickname")
                .expression_attribute_values(":nickname", AttributeValue::S(nickname.to_string()))
                .select(aws_sdk_dynamodb::types::Select::Count)
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))
        }
        .instrument(scan_span)
        .await?;

        Ok(response.count() > 0)
    }

    #[instrument(skip(self, member), fields(table = %self.members_table, member_id = %member.member_id))]
    async fn save_member(&self, member: Member) -> RepositoryResult<Member> {
        info!("Saving member");

        let item = self.member_to_item(&member);
        let put_span = dynamodb_span("PutItem", &self.members_table, &self.region);

        async {
            self.client
                .put_item()
                .table_name(&self.members_table)
                .set_item(Some(item))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))
        }
        .instrument(put_span)
        .await?;

        Ok(member)
    }

    #[instrument(skip(self), fields(table = %self.credentials_table))]
    async fn find_credentials(&self, email: &str) -> RepositoryResult<Option<MemberCredentials>> {
        info!("Finding credentials");

        let get_span = dynamodb_span("GetItem", &self.credentials_table, &self.region);

        let response = async {
            self.client
                .get_item()
                .table_name(&self.credentials_table)
                .key("email", AttributeValue::S(email.to_string()))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))
        }
        .instrument(get_span)
        .await?;

        match response.item {
            Some(item) => Ok(Some(self.item_to_credentials(item)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, credentials), fields(table = %self.credentials_table))]
    async fn save_credentials(
        &self,
        credentials: MemberCredentials,
    ) -> RepositoryResult<MemberCredentials> {
        info!("Saving credentials");

        let item = self.credentials_to_item(&credentials);
        let put_span = dynamodb_span("PutItem", &self.credentials_table, &self.region);

        async {
            self.client
                .put_item()
                .table_name(&self.credentials_table)
                .set_item(Some(item))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))
        }
        .instrument(put_span)
        .await?;

        Ok(credentials)
    }
}
